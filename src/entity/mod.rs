//! Entities as they travel between the remote APIs and a project directory.

pub mod registry;

pub use registry::{EntityKind, EntityType, Product};

use crate::constants::{FIELD_ID, FIELD_NAME};
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// A semi-structured record. Key order is preserved so files round-trip
/// without reshuffling.
pub type Entity = Map<String, Value>;

/// Entities grouped by type, in the order the groups were inserted.
pub type EntitiesByType = IndexMap<EntityKind, Vec<Entity>>;

/// Returns the textual form of a scalar, or `None` for null and containers.
#[must_use]
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// The entity's remote ID, if it has a non-null one.
#[must_use]
pub fn entity_id(entity: &Entity) -> Option<String> {
    entity.get(FIELD_ID).and_then(scalar_text)
}

/// The entity's remote ID as stored, keeping numbers as numbers.
#[must_use]
pub fn id_value(entity: &Entity) -> Option<&Value> {
    entity
        .get(FIELD_ID)
        .filter(|v| !matches!(v, Value::Null | Value::Array(_) | Value::Object(_)))
}

/// The entity's name, if it has a non-empty string one. An empty name
/// cannot be written as a reference, so it counts as no name at all.
#[must_use]
pub fn entity_name(entity: &Entity) -> Option<&str> {
    entity
        .get(FIELD_NAME)
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
}

/// Human-readable label used in diagnostics, e.g. `pipeline 'Ingest'` or
/// `scheduler #2` for unnamed entities (1-based).
#[must_use]
pub fn describe(entity_type: &EntityType, entity: &Entity, index: usize) -> String {
    match (entity_name(entity), entity_id(entity)) {
        (Some(name), _) => format!("{} '{name}'", entity_type.kind),
        (None, Some(id)) => format!("{} {id}", entity_type.kind),
        (None, None) => format!("{} #{}", entity_type.kind, index + 1),
    }
}
