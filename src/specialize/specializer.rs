use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use super::{OpDefinition, SpecializationKey, SpecializeError};
use crate::cache::{ArtifactMetadata, CodeCache, CompiledArtifact};
use crate::codegen::{self, DispatchCase, EmitInput, EmitOptions, Routine};
use crate::params::ParamDescriptor;
use crate::toolchain::Toolchain;

/// Produces compiled artifacts specialized to an op's parameter instance.
///
/// Builds a cache key from (op kind, param instance, code version); on a hit
/// returns the stored artifact, on a miss generates dispatch source, runs it
/// through the toolchain and inserts the result. Compilation failures
/// propagate to the caller and are never cached.
pub struct OpSpecializer {
    cache: Arc<CodeCache>,
    toolchain: Arc<dyn Toolchain>,
    emit_options: EmitOptions,
}

impl OpSpecializer {
    pub fn new(cache: Arc<CodeCache>, toolchain: Arc<dyn Toolchain>) -> Self {
        Self {
            cache,
            toolchain,
            emit_options: EmitOptions::default(),
        }
    }

    pub fn with_emit_options(
        cache: Arc<CodeCache>,
        toolchain: Arc<dyn Toolchain>,
        emit_options: EmitOptions,
    ) -> Self {
        Self {
            cache,
            toolchain,
            emit_options,
        }
    }

    pub fn cache(&self) -> &CodeCache {
        &self.cache
    }

    pub fn specialize(
        &self,
        op: &dyn OpDefinition,
    ) -> Result<Arc<CompiledArtifact>, SpecializeError> {
        let params = op.params();
        let key = SpecializationKey::new(op.kind(), &params, op.code_version());
        self.cache
            .get_or_create(&key, || self.compile(op, &params, &key))
    }

    fn compile(
        &self,
        op: &dyn OpDefinition,
        params: &ParamDescriptor,
        key: &SpecializationKey,
    ) -> Result<CompiledArtifact, SpecializeError> {
        let started = Instant::now();
        let routine = self.lower(op, params)?;
        let symbol = key.symbol();
        let support = op.support_code();
        let signature = op.signature();

        let unit = codegen::emit(
            EmitInput {
                symbol: &symbol,
                signature: &signature,
                params,
                support: &support,
                routine,
            },
            &self.emit_options,
        );

        debug!(op = op.kind(), symbol = %symbol, "compiling specialization");
        let code = self
            .toolchain
            .compile(&unit)
            .map_err(|source| SpecializeError::Compilation {
                op: op.kind().to_string(),
                params: params.summary(),
                source,
            })?;

        Ok(CompiledArtifact::new(
            key.clone(),
            signature,
            params.clone(),
            code,
            unit.text,
            ArtifactMetadata::new(started.elapsed()),
        ))
    }

    /// Lower the op into a routine: one case per enumerated name in declared
    /// order for enum params, a single body otherwise.
    fn lower(
        &self,
        op: &dyn OpDefinition,
        params: &ParamDescriptor,
    ) -> Result<Routine, SpecializeError> {
        let wrap = |source| SpecializeError::Codegen {
            op: op.kind().to_string(),
            source,
        };

        match params {
            ParamDescriptor::Enum(e) => {
                let mut cases = Vec::with_capacity(e.len());
                for (name, value) in e.entries() {
                    let kernel = op.kernel(Some(name)).map_err(&wrap)?;
                    cases.push(DispatchCase {
                        name: name.to_string(),
                        value,
                        kernel,
                    });
                }
                Ok(Routine::Dispatch { cases })
            }
            ParamDescriptor::OpaqueHandle(_) => {
                let kernel = op.kernel(None).map_err(&wrap)?;
                Ok(Routine::Straight { kernel })
            }
        }
    }
}
