// Op specialization over compile-time parameters
pub mod key;
pub mod specializer;

pub use key::SpecializationKey;
pub use specializer::OpSpecializer;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codegen::{CodegenError, Kernel};
use crate::params::ParamDescriptor;
use crate::toolchain::ToolchainError;

/// Coarse runtime type of an argument or result buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    I64,
    F64,
    F32Buffer,
    Handle,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::I64 => "i64",
            Self::F64 => "f64",
            Self::F32Buffer => "f32 buffer",
            Self::Handle => "handle",
        };
        f.write_str(name)
    }
}

/// Declared input/output arity and types of a compiled routine, checked
/// before any native invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub inputs: Vec<ValueType>,
    pub outputs: Vec<ValueType>,
}

impl Signature {
    pub fn new(inputs: Vec<ValueType>, outputs: Vec<ValueType>) -> Self {
        Self { inputs, outputs }
    }
}

/// Explicit integer tag distinguishing incompatible generated-code revisions.
///
/// Part of every cache key, so stale artifacts are never reused across a
/// semantic change to an op's generated code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeVersion(Vec<u32>);

impl CodeVersion {
    pub fn new(parts: impl Into<Vec<u32>>) -> Self {
        Self(parts.into())
    }

    pub fn parts(&self) -> &[u32] {
        &self.0
    }
}

impl From<u32> for CodeVersion {
    fn from(part: u32) -> Self {
        Self(vec![part])
    }
}

impl fmt::Display for CodeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("0");
        }
        let dotted = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".");
        f.write_str(&dotted)
    }
}

/// The surface a symbolic operation exposes to the specializer.
///
/// Supplied by the graph layer per op instance: identity, buffer signature,
/// the parameter set to specialize over, a code version, optional support
/// text (helper definitions pasted above the generated routine) and one
/// kernel per enumerated case, or a single unparametrized kernel for
/// handle-typed params.
pub trait OpDefinition: Send + Sync {
    fn kind(&self) -> &str;

    fn signature(&self) -> Signature;

    fn params(&self) -> ParamDescriptor;

    fn code_version(&self) -> CodeVersion;

    fn support_code(&self) -> String {
        String::new()
    }

    /// Body for the named case, or the unconditional body when `case` is
    /// `None`.
    fn kernel(&self, case: Option<&str>) -> Result<Kernel, CodegenError>;
}

#[derive(Debug, Error)]
pub enum SpecializeError {
    #[error("code generation failed for `{op}`: {source}")]
    Codegen {
        op: String,
        #[source]
        source: CodegenError,
    },

    #[error("compilation failed for `{op}` with params {params}: {source}")]
    Compilation {
        op: String,
        params: String,
        #[source]
        source: ToolchainError,
    },
}
