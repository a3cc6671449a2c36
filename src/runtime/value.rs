use std::fmt;
use std::sync::Arc;

use crate::specialize::ValueType;

/// Runs when the last reference to an opaque handle is dropped.
pub type ReleaseHook = Arc<dyn Fn(&Value) + Send + Sync>;

struct HandleCore {
    tag: String,
    payload: Value,
    hook: Option<ReleaseHook>,
}

impl Drop for HandleCore {
    fn drop(&mut self) {
        if let Some(hook) = &self.hook {
            hook(&self.payload);
        }
    }
}

/// A runtime value wrapping an external resource, passed through by
/// reference with explicit lifetime management.
///
/// Cloning retains the underlying resource; the release hook bound at
/// acquisition runs once the last clone is dropped.
#[derive(Clone)]
pub struct OpaqueHandle {
    core: Arc<HandleCore>,
}

impl OpaqueHandle {
    pub fn acquire(tag: impl Into<String>, payload: Value, hook: Option<ReleaseHook>) -> Self {
        Self {
            core: Arc::new(HandleCore {
                tag: tag.into(),
                payload,
                hook,
            }),
        }
    }

    pub fn tag(&self) -> &str {
        &self.core.tag
    }

    pub fn payload(&self) -> &Value {
        &self.core.payload
    }
}

impl fmt::Debug for OpaqueHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpaqueHandle")
            .field("tag", &self.core.tag)
            .finish_non_exhaustive()
    }
}

impl PartialEq for OpaqueHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }
}

/// A runtime argument or result buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    I64(i64),
    F64(f64),
    F32Buffer(Arc<Vec<f32>>),
    Handle(OpaqueHandle),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::I64(_) => ValueType::I64,
            Self::F64(_) => ValueType::F64,
            Self::F32Buffer(_) => ValueType::F32Buffer,
            Self::Handle(_) => ValueType::Handle,
        }
    }
}

/// A result slot owned by the graph execution engine and reused across
/// invocations.
#[derive(Debug, Default)]
pub struct Slot {
    value: Option<Value>,
}

impl Slot {
    pub fn new() -> Self {
        Self { value: None }
    }

    /// Overwrite the slot with `incoming`.
    ///
    /// The incoming value is in place before the previous occupant drops, so
    /// storing a handle over itself never releases it.
    pub fn store(&mut self, incoming: Value) {
        let previous = self.value.replace(incoming);
        drop(previous);
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn take(&mut self) -> Option<Value> {
        self.value.take()
    }

    pub fn clear(&mut self) {
        self.value = None;
    }
}
