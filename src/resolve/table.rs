//! Per-run lookup tables.
//!
//! Both tables belong to a single export or deploy run and are dropped with
//! it. Keys are compared case-insensitively.

use crate::entity::EntityKind;
use serde_json::Value;
use std::collections::HashMap;

fn fold(key: &str) -> String {
    key.to_lowercase()
}

/// ID → name, filled during export.
#[derive(Debug, Default, Clone)]
pub struct IdNameTable {
    names: HashMap<String, String>,
}

impl IdNameTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `id → name`, keeping the name's case. Returns the name
    /// previously stored for `id`, if any.
    pub fn register(&mut self, id: &str, name: &str) -> Option<String> {
        self.names.insert(fold(id), name.to_string())
    }

    #[must_use]
    pub fn name_for(&self, id: &str) -> Option<&str> {
        self.names.get(&fold(id)).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Clone)]
struct NameEntry {
    /// `None` for entries registered without a type
    kind: Option<EntityKind>,
    /// Kept as JSON so numeric IDs stay numbers
    id: Value,
}

/// Name → ID, grown during deploy as entities are created or updated.
///
/// Each name remembers which kinds registered it, so a reference inside a
/// `processorId` field can be resolved against ingestion processors even when
/// a discovery processor shares the name. Later registrations win.
#[derive(Debug, Default, Clone)]
pub struct NameIdTable {
    entries: HashMap<String, Vec<NameEntry>>,
}

impl NameIdTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `name` of type `kind` now has `id`.
    pub fn register(&mut self, kind: EntityKind, name: &str, id: impl Into<Value>) {
        self.insert(Some(kind), name, id.into());
    }

    /// Records `name → id` without a type; it matches any scope.
    pub fn register_unscoped(&mut self, name: &str, id: impl Into<Value>) {
        self.insert(None, name, id.into());
    }

    fn insert(&mut self, kind: Option<EntityKind>, name: &str, id: Value) {
        let list = self.entries.entry(fold(name)).or_default();
        list.retain(|e| e.kind != kind);
        list.push(NameEntry { kind, id });
    }

    /// Resolves `name` to an ID. With a non-empty `scope` only entries of
    /// those kinds (or untyped entries) qualify.
    #[must_use]
    pub fn resolve(&self, name: &str, scope: &[EntityKind]) -> Option<&Value> {
        self.entries
            .get(&fold(name))?
            .iter()
            .rev()
            .find(|e| scope.is_empty() || e.kind.is_none_or(|k| scope.contains(&k)))
            .map(|e| &e.id)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&fold(name))
    }

    /// All known names, lowercased.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
