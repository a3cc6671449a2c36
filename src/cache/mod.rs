// Compiled artifact caching
pub mod code_cache;
pub mod metadata;

pub use code_cache::{CacheStats, CodeCache};
pub use metadata::ArtifactMetadata;

use crate::params::ParamDescriptor;
use crate::specialize::{Signature, SpecializationKey};
use crate::toolchain::CompiledCode;

/// An immutable compiled routine plus everything needed to invoke it.
///
/// Owned by the [`CodeCache`] and shared read-only by every invocation using
/// its key; never mutated after insertion.
#[derive(Debug, Clone)]
pub struct CompiledArtifact {
    key: SpecializationKey,
    signature: Signature,
    params: ParamDescriptor,
    code: CompiledCode,
    source: String,
    metadata: ArtifactMetadata,
}

impl CompiledArtifact {
    pub fn new(
        key: SpecializationKey,
        signature: Signature,
        params: ParamDescriptor,
        code: CompiledCode,
        source: String,
        metadata: ArtifactMetadata,
    ) -> Self {
        Self {
            key,
            signature,
            params,
            code,
            source,
            metadata,
        }
    }

    pub fn key(&self) -> &SpecializationKey {
        &self.key
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn params(&self) -> &ParamDescriptor {
        &self.params
    }

    pub fn code(&self) -> &CompiledCode {
        &self.code
    }

    /// Rendered source text the artifact was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }
}
