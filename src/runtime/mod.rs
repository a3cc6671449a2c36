//! Invocation of compiled artifacts against runtime buffers.
//!
//! The adapter validates buffers against the artifact's declared signature
//! before any native code runs, dispatches enum-parametrized routines over a
//! runtime selector, and applies the ownership transfer rules for opaque
//! handles: the incoming handle is retained before the previous occupant of
//! a result slot is released.
pub mod adapter;
pub mod value;

pub use adapter::ExecutionAdapter;
pub use value::{OpaqueHandle, ReleaseHook, Slot, Value};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("signature mismatch for `{op}`: {detail}")]
    SignatureMismatch { op: String, detail: String },

    #[error("dispatch artifact for `{op}` invoked without a selector")]
    MissingSelector { op: String },

    #[error("unknown parameter value {value} for `{op}`")]
    UnknownParamValue { op: String, value: i64 },

    #[error("no release hook registered under name `{name}`")]
    UnknownReleaseHook { name: String },

    #[error("division by zero in `{op}`")]
    DivisionByZero { op: String },
}
