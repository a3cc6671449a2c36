// Compile-time parameter descriptors
pub mod enumeration;
pub mod handle;

pub use enumeration::{EnumDescriptor, ParamError, RawValue};
pub use handle::HandleDescriptor;

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Describes the compile-time parameter set an op is specialized over.
///
/// Either an enumeration of named integer constants baked into the generated
/// dispatch code, or an opaque external handle type whose lifetime the
/// runtime manages through a named release hook.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamDescriptor {
    Enum(EnumDescriptor),
    OpaqueHandle(HandleDescriptor),
}

impl ParamDescriptor {
    /// Deterministic serialization used inside cache keys.
    ///
    /// Enum descriptors serialize their canonical mapping only, so two
    /// descriptors built from differently-typed but numerically-equal values
    /// produce the same key material.
    pub fn canonical_serialization(&self) -> String {
        match self {
            Self::Enum(e) => json!({ "enum": e.canonical() }).to_string(),
            Self::OpaqueHandle(h) => json!({
                "handle": { "tag": h.type_tag(), "release": h.release_hook() }
            })
            .to_string(),
        }
    }

    /// Short human-readable form for error messages and logs.
    pub fn summary(&self) -> String {
        match self {
            Self::Enum(e) => e
                .entries()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join(", "),
            Self::OpaqueHandle(h) => format!("handle `{}`", h.type_tag()),
        }
    }

    pub fn as_enum(&self) -> Option<&EnumDescriptor> {
        match self {
            Self::Enum(e) => Some(e),
            Self::OpaqueHandle(_) => None,
        }
    }

    pub fn as_handle(&self) -> Option<&HandleDescriptor> {
        match self {
            Self::OpaqueHandle(h) => Some(h),
            Self::Enum(_) => None,
        }
    }
}
