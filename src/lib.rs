//! Specforge: a parametrized native-code specialization cache for symbolic
//! operations.
//!
//! A symbolic op declares the compile-time parameters it is specialized
//! over: an enumeration of named integer constants, or an opaque external
//! handle type. The specializer emits native dispatch code per parameter
//! instance, compiles it through a toolchain and memoizes the artifact so
//! each distinct (op kind, params, code version) key compiles at most once.
//! The execution adapter then invokes artifacts against runtime buffers,
//! transferring opaque-handle ownership with an acquire-before-release
//! discipline.

pub mod cache;
pub mod codegen;
pub mod params;
pub mod runtime;
pub mod specialize;
pub mod toolchain;

pub use cache::{ArtifactMetadata, CacheStats, CodeCache, CompiledArtifact};
pub use codegen::{BinaryOp, CodegenError, EmitOptions, Kernel, Routine, SourceUnit};
pub use params::{EnumDescriptor, HandleDescriptor, ParamDescriptor, ParamError, RawValue};
pub use runtime::{ExecError, ExecutionAdapter, OpaqueHandle, ReleaseHook, Slot, Value};
pub use specialize::{
    CodeVersion, OpDefinition, OpSpecializer, Signature, SpecializationKey, SpecializeError,
    ValueType,
};
pub use toolchain::{CompiledCode, PortableToolchain, Toolchain, ToolchainError};
