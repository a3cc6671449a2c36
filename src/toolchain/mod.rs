//! The native toolchain seam.
//!
//! The specializer treats compilation as `compile(SourceUnit) -> CompiledCode
//! | ToolchainError`. [`PortableToolchain`] is the in-process backend: it
//! verifies the structured routine carried by the unit and lowers it into a
//! table-driven form, reporting the same class of failures an external C
//! toolchain would raise on the rendered text.
use ahash::AHashMap;
use thiserror::Error;
use tracing::debug;

use crate::codegen::{Kernel, Routine, SourceUnit};
use crate::specialize::{Signature, ValueType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolchainError {
    #[error("generated code rejected: {message}")]
    Verify { message: String },

    #[error("toolchain invocation failed: {message}")]
    Invocation { message: String },
}

/// Executable form of a compiled routine.
#[derive(Debug, Clone)]
pub struct CompiledCode {
    symbol: String,
    plan: ExecPlan,
}

impl CompiledCode {
    pub fn new(symbol: impl Into<String>, plan: ExecPlan) -> Self {
        Self {
            symbol: symbol.into(),
            plan,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn plan(&self) -> &ExecPlan {
        &self.plan
    }
}

/// Lowered dispatch structure executed by the runtime adapter.
#[derive(Debug, Clone)]
pub enum ExecPlan {
    Dispatch { table: AHashMap<i64, Kernel> },
    Straight { kernel: Kernel },
}

/// Turns generated source into a compiled artifact's code.
///
/// Compilation may block on an external process; callers treat it as a
/// long-latency operation and are free to invoke it from worker threads.
pub trait Toolchain: Send + Sync {
    fn compile(&self, unit: &SourceUnit) -> Result<CompiledCode, ToolchainError>;
}

/// In-process backend assembling the structured routine of a source unit.
#[derive(Debug, Default)]
pub struct PortableToolchain;

impl PortableToolchain {
    pub fn new() -> Self {
        Self
    }
}

impl Toolchain for PortableToolchain {
    fn compile(&self, unit: &SourceUnit) -> Result<CompiledCode, ToolchainError> {
        let plan = match &unit.routine {
            Routine::Dispatch { cases } => {
                if cases.is_empty() {
                    return Err(verify("dispatch switch with no cases"));
                }
                let mut table = AHashMap::with_capacity(cases.len());
                let mut seen: AHashMap<i64, &str> = AHashMap::with_capacity(cases.len());
                for case in cases {
                    if let Some(previous) = seen.insert(case.value, case.name.as_str()) {
                        return Err(verify(format!(
                            "duplicate case value {} (`{previous}` and `{}`)",
                            case.value, case.name
                        )));
                    }
                    verify_kernel(&case.kernel, &unit.signature)?;
                    table.insert(case.value, case.kernel.clone());
                }
                ExecPlan::Dispatch { table }
            }
            Routine::Straight { kernel } => {
                verify_kernel(kernel, &unit.signature)?;
                ExecPlan::Straight {
                    kernel: kernel.clone(),
                }
            }
        };

        debug!(symbol = %unit.symbol, "assembled routine");
        Ok(CompiledCode::new(unit.symbol.clone(), plan))
    }
}

fn verify(message: impl Into<String>) -> ToolchainError {
    ToolchainError::Verify {
        message: message.into(),
    }
}

fn verify_kernel(kernel: &Kernel, signature: &Signature) -> Result<(), ToolchainError> {
    if signature.outputs.len() != 1 {
        return Err(verify(format!(
            "kernels write exactly one output, signature declares {}",
            signature.outputs.len()
        )));
    }

    let input = |index: usize| {
        signature.inputs.get(index).copied().ok_or_else(|| {
            verify(format!(
                "kernel references input {index} but signature declares {} inputs",
                signature.inputs.len()
            ))
        })
    };

    match kernel {
        Kernel::Binary { lhs, rhs, .. } => {
            let lhs_ty = input(*lhs)?;
            let rhs_ty = input(*rhs)?;
            if lhs_ty != rhs_ty || !matches!(lhs_ty, ValueType::I64 | ValueType::F64) {
                return Err(verify(format!(
                    "binary kernel requires matching numeric operands, found {lhs_ty} and {rhs_ty}"
                )));
            }
            if signature.outputs[0] != lhs_ty {
                return Err(verify(format!(
                    "binary kernel produces {lhs_ty} but signature declares {} output",
                    signature.outputs[0]
                )));
            }
        }
        Kernel::WrapHandle { input: index } => {
            input(*index)?;
            if signature.outputs[0] != ValueType::Handle {
                return Err(verify(format!(
                    "wrap kernel produces a handle but signature declares {} output",
                    signature.outputs[0]
                )));
            }
        }
        Kernel::UnwrapHandle { input: index } => {
            let ty = input(*index)?;
            if ty != ValueType::Handle {
                return Err(verify(format!(
                    "unwrap kernel reads a handle but signature declares {ty} input"
                )));
            }
        }
    }
    Ok(())
}
