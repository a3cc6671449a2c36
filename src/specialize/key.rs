use ahash::AHasher;
use sha1::{Digest, Sha1};
use std::fmt::Write as _;
use std::hash::{Hash, Hasher};

use super::CodeVersion;
use crate::params::ParamDescriptor;

/// Unique key identifying a specialized routine version.
///
/// Built from the op kind, the canonical serialization of its parameter
/// instance and the declared code version; immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpecializationKey {
    pub op_kind: String,
    pub params: String,
    pub version: CodeVersion,
    params_hash: u64,
}

impl SpecializationKey {
    pub fn new(
        op_kind: impl Into<String>,
        params: &ParamDescriptor,
        version: CodeVersion,
    ) -> Self {
        let serialized = params.canonical_serialization();
        let mut hasher = AHasher::default();
        serialized.hash(&mut hasher);
        let params_hash = hasher.finish();

        Self {
            op_kind: op_kind.into(),
            params: serialized,
            version,
            params_hash,
        }
    }

    pub fn to_string_key(&self) -> String {
        format!("{}_<v{}>_{:x}", self.op_kind, self.version, self.params_hash)
    }

    /// Generated-symbol name for this key: the sanitized op kind plus a
    /// content fingerprint, stable across processes and valid as a C
    /// identifier.
    pub fn symbol(&self) -> String {
        let mut sha = Sha1::new();
        sha.update(self.op_kind.as_bytes());
        sha.update(self.params.as_bytes());
        sha.update(self.version.to_string().as_bytes());
        let digest = sha.finalize();

        let mut fingerprint = String::with_capacity(12);
        for byte in digest.iter().take(6) {
            let _ = write!(fingerprint, "{byte:02x}");
        }

        let sanitized: String = self
            .op_kind
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("{sanitized}_{fingerprint}")
    }
}
