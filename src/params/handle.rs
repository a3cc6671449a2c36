use serde::{Deserialize, Serialize};

/// Describes an opaque external handle type managed by generated code.
///
/// Owns no data itself: the tag names the native pointer type and the
/// optional release hook names the routine that frees a handle when the last
/// reference to it is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandleDescriptor {
    type_tag: String,
    release_hook: Option<String>,
}

impl HandleDescriptor {
    pub fn new(type_tag: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            release_hook: None,
        }
    }

    pub fn with_release_hook(type_tag: impl Into<String>, hook: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            release_hook: Some(hook.into()),
        }
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn release_hook(&self) -> Option<&str> {
        self.release_hook.as_deref()
    }
}
