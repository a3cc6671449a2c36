use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::CompiledArtifact;
use crate::specialize::{SpecializationKey, SpecializeError};

type ArtifactSlot = Arc<OnceCell<Arc<CompiledArtifact>>>;

/// Cache for compiled routines.
///
/// Guarantees at most one successful factory run per distinct key, including
/// under concurrent requests: callers for the same key serialize on a
/// per-key cell rather than a global lock, and all of them observe the
/// identical artifact. Factory failures leave the cell empty, so the next
/// request for that key retries compilation. Differing code versions produce
/// distinct keys and coexist; no eviction is performed.
pub struct CodeCache {
    slots: Mutex<HashMap<SpecializationKey, ArtifactSlot>>,
    hits: AtomicU64,
    misses: AtomicU64,
    failures: AtomicU64,
}

impl CodeCache {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Return the artifact for `key`, running `factory` to compile it if no
    /// artifact is cached yet.
    pub fn get_or_create<F>(
        &self,
        key: &SpecializationKey,
        factory: F,
    ) -> Result<Arc<CompiledArtifact>, SpecializeError>
    where
        F: FnOnce() -> Result<CompiledArtifact, SpecializeError>,
    {
        let slot = {
            let mut slots = self.slots.lock();
            slots.entry(key.clone()).or_default().clone()
        };

        let mut ran_factory = false;
        let result = slot.get_or_try_init(|| {
            ran_factory = true;
            debug!(key = %key.to_string_key(), "code cache miss, compiling");
            self.misses.fetch_add(1, Ordering::Relaxed);
            factory().map(Arc::new)
        });

        match result {
            Ok(artifact) => {
                if !ran_factory {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(key = %key.to_string_key(), "code cache hit");
                }
                Ok(Arc::clone(artifact))
            }
            Err(err) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key.to_string_key(), error = %err, "compilation failed, not cached");
                Err(err)
            }
        }
    }

    /// Check if an artifact is cached for `key`.
    pub fn contains(&self, key: &SpecializationKey) -> bool {
        self.slots
            .lock()
            .get(key)
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Number of compiled artifacts currently held.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            total_artifacts: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            failed_compilations: self.failures.load(Ordering::Relaxed),
        }
    }

    /// Drop every cached artifact.
    pub fn clear(&self) {
        self.slots.lock().clear();
    }
}

impl Default for CodeCache {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct CacheStats {
    pub total_artifacts: usize,
    pub hits: u64,
    pub misses: u64,
    pub failed_compilations: u64,
}
