use std::collections::HashMap;

use crate::value::RefValue;

/// Per-surface map from caller-chosen ids to stored values.
///
/// Lives as long as the surface it belongs to, across any number of queues.
#[derive(Debug, Default, Clone)]
pub struct ReferenceTable {
    entries: HashMap<String, RefValue>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `id`, replacing whatever was there.
    pub fn add_ref(&mut self, id: impl Into<String>, value: impl Into<RefValue>) {
        let id = id.into();
        tracing::trace!(%id, "reference stored");
        self.entries.insert(id, value.into());
    }

    /// Removes `id`; returns whether anything was stored under it.
    pub fn drop_ref(&mut self, id: &str) -> bool {
        let removed = self.entries.remove(id).is_some();
        if removed {
            tracing::trace!(%id, "reference dropped");
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<&RefValue> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Handle;
    use serde_json::json;

    #[test]
    fn add_then_get_returns_value() {
        let mut table = ReferenceTable::new();
        table.add_ref("x", json!(7));
        assert_eq!(table.get("x"), Some(&RefValue::Json(json!(7))));
    }

    #[test]
    fn readding_overwrites() {
        let mut table = ReferenceTable::new();
        table.add_ref("x", json!(1));
        table.add_ref("x", json!([1, 2]));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("x"), Some(&RefValue::Json(json!([1, 2]))));
    }

    #[test]
    fn drop_then_get_is_missing() {
        let mut table = ReferenceTable::new();
        table.add_ref("x", json!(7));
        assert!(table.drop_ref("x"));
        assert!(table.get("x").is_none());
        assert!(!table.drop_ref("x"), "dropping twice is a no-op");
        assert!(table.is_empty());
    }

    #[test]
    fn stores_opaque_handles() {
        let mut table = ReferenceTable::new();
        let handle = Handle::new("gradient", ());
        table.add_ref("g", handle.clone());
        let stored = table.get("g").and_then(RefValue::as_handle).unwrap();
        assert!(stored.ptr_eq(&handle));
    }
}
