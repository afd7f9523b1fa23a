use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Opaque object created by a surface, such as a gradient.
///
/// Handles compare by identity. Only the surface that produced one knows the
/// concrete type behind it and can recover it with [`Handle::downcast_ref`].
#[derive(Clone)]
pub struct Handle {
    kind: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl Handle {
    pub fn new<T: Any + Send + Sync>(kind: &'static str, value: T) -> Self {
        Self {
            kind,
            inner: Arc::new(value),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &Handle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.kind)
    }
}

/// Anything a reference table can hold or a resolved parameter can carry.
#[derive(Debug, Clone, PartialEq)]
pub enum RefValue {
    Json(Value),
    Handle(Handle),
}

impl RefValue {
    pub fn null() -> Self {
        RefValue::Json(Value::Null)
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            RefValue::Json(value) => Some(value),
            RefValue::Handle(_) => None,
        }
    }

    pub fn as_handle(&self) -> Option<&Handle> {
        match self {
            RefValue::Handle(handle) => Some(handle),
            RefValue::Json(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_json().and_then(Value::as_f64)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_json().and_then(Value::as_str)
    }
}

impl From<Value> for RefValue {
    fn from(value: Value) -> Self {
        RefValue::Json(value)
    }
}

impl From<Handle> for RefValue {
    fn from(handle: Handle) -> Self {
        RefValue::Handle(handle)
    }
}
