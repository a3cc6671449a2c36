use std::time::{Duration, Instant};

/// Metadata for cached artifacts
#[derive(Debug, Clone, Copy)]
pub struct ArtifactMetadata {
    pub created_at: Instant,
    pub compile_time: Duration,
}

impl ArtifactMetadata {
    pub fn new(compile_time: Duration) -> Self {
        Self {
            created_at: Instant::now(),
            compile_time,
        }
    }
}

impl Default for ArtifactMetadata {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}
