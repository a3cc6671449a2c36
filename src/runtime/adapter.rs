use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::{ExecError, OpaqueHandle, ReleaseHook, Slot, Value};
use crate::cache::CompiledArtifact;
use crate::codegen::{BinaryOp, Kernel};
use crate::params::HandleDescriptor;
use crate::toolchain::ExecPlan;

/// Invokes compiled artifacts against concrete buffers.
pub struct ExecutionAdapter {
    hooks: RwLock<HashMap<String, ReleaseHook>>,
}

impl ExecutionAdapter {
    pub fn new() -> Self {
        Self {
            hooks: RwLock::new(HashMap::new()),
        }
    }

    /// Register the routine named by handle descriptors as their release
    /// hook, the runtime counterpart of a support-code definition.
    pub fn register_release_hook(&self, name: impl Into<String>, hook: ReleaseHook) {
        self.hooks.write().insert(name.into(), hook);
    }

    /// Run `artifact` against `args`, writing results into `outs`.
    ///
    /// Arity and types are checked against the artifact's declared signature
    /// before any kernel executes. Dispatch artifacts take the runtime
    /// parameter value as `selector`; a selector outside the enumerated
    /// domain reports [`ExecError::UnknownParamValue`] without touching
    /// cache state.
    pub fn invoke(
        &self,
        artifact: &CompiledArtifact,
        selector: Option<i64>,
        args: &[Value],
        outs: &mut [Slot],
    ) -> Result<(), ExecError> {
        let op = artifact.key().op_kind.as_str();
        check_signature(artifact, args, outs)?;

        let kernel = match artifact.code().plan() {
            ExecPlan::Dispatch { table } => {
                let value = selector.ok_or_else(|| ExecError::MissingSelector {
                    op: op.to_string(),
                })?;
                table.get(&value).ok_or(ExecError::UnknownParamValue {
                    op: op.to_string(),
                    value,
                })?
            }
            ExecPlan::Straight { kernel } => {
                if selector.is_some() {
                    return Err(mismatch(op, "op does not take a dispatch selector"));
                }
                kernel
            }
        };

        debug!(op, symbol = artifact.code().symbol(), "invoking routine");
        self.run_kernel(op, artifact, kernel, args, outs)
    }

    fn run_kernel(
        &self,
        op: &str,
        artifact: &CompiledArtifact,
        kernel: &Kernel,
        args: &[Value],
        outs: &mut [Slot],
    ) -> Result<(), ExecError> {
        let result = match kernel {
            Kernel::Binary {
                op: binary,
                lhs,
                rhs,
            } => {
                let lhs = arg(op, args, *lhs)?;
                let rhs = arg(op, args, *rhs)?;
                binary_value(op, *binary, lhs, rhs)?
            }
            Kernel::WrapHandle { input } => {
                let payload = arg(op, args, *input)?.clone();
                let descriptor = handle_descriptor(op, artifact)?;
                let hook = self.resolve_hook(descriptor)?;
                Value::Handle(OpaqueHandle::acquire(descriptor.type_tag(), payload, hook))
            }
            Kernel::UnwrapHandle { input } => {
                let Value::Handle(handle) = arg(op, args, *input)? else {
                    return Err(mismatch(op, "unwrap kernel expects a handle input"));
                };
                let descriptor = handle_descriptor(op, artifact)?;
                if handle.tag() != descriptor.type_tag() {
                    return Err(mismatch(
                        op,
                        format!(
                            "handle tagged `{}` where `{}` was declared",
                            handle.tag(),
                            descriptor.type_tag()
                        ),
                    ));
                }
                handle.payload().clone()
            }
        };

        let slot = outs
            .first_mut()
            .ok_or_else(|| mismatch(op, "artifact declares no output slot"))?;
        slot.store(result);
        Ok(())
    }

    fn resolve_hook(
        &self,
        descriptor: &HandleDescriptor,
    ) -> Result<Option<ReleaseHook>, ExecError> {
        match descriptor.release_hook() {
            Some(name) => {
                let hooks = self.hooks.read();
                let hook = hooks
                    .get(name)
                    .ok_or_else(|| ExecError::UnknownReleaseHook {
                        name: name.to_string(),
                    })?;
                Ok(Some(Arc::clone(hook)))
            }
            None => Ok(None),
        }
    }
}

impl Default for ExecutionAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn check_signature(
    artifact: &CompiledArtifact,
    args: &[Value],
    outs: &[Slot],
) -> Result<(), ExecError> {
    let op = artifact.key().op_kind.as_str();
    let signature = artifact.signature();

    if args.len() != signature.inputs.len() {
        return Err(mismatch(
            op,
            format!(
                "expected {} inputs, found {}",
                signature.inputs.len(),
                args.len()
            ),
        ));
    }
    if outs.len() != signature.outputs.len() {
        return Err(mismatch(
            op,
            format!(
                "expected {} output slots, found {}",
                signature.outputs.len(),
                outs.len()
            ),
        ));
    }
    for (index, (value, expected)) in args.iter().zip(&signature.inputs).enumerate() {
        let found = value.value_type();
        if found != *expected {
            return Err(mismatch(
                op,
                format!("input {index} expected {expected}, found {found}"),
            ));
        }
    }
    Ok(())
}

fn mismatch(op: &str, detail: impl Into<String>) -> ExecError {
    ExecError::SignatureMismatch {
        op: op.to_string(),
        detail: detail.into(),
    }
}

fn arg<'a>(op: &str, args: &'a [Value], index: usize) -> Result<&'a Value, ExecError> {
    args.get(index)
        .ok_or_else(|| mismatch(op, format!("kernel references missing input {index}")))
}

fn handle_descriptor<'a>(
    op: &str,
    artifact: &'a CompiledArtifact,
) -> Result<&'a HandleDescriptor, ExecError> {
    artifact
        .params()
        .as_handle()
        .ok_or_else(|| mismatch(op, "handle kernel on a non-handle param descriptor"))
}

fn binary_value(op: &str, binary: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, ExecError> {
    match (lhs, rhs) {
        (Value::I64(a), Value::I64(b)) => {
            let value = match binary {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => {
                    if *b == 0 {
                        return Err(ExecError::DivisionByZero { op: op.to_string() });
                    }
                    a.wrapping_div(*b)
                }
            };
            Ok(Value::I64(value))
        }
        (Value::F64(a), Value::F64(b)) => {
            let value = match binary {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
            };
            Ok(Value::F64(value))
        }
        _ => Err(mismatch(op, "binary kernel expects matching numeric inputs")),
    }
}
