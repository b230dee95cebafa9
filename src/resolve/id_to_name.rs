//! Export side: replaces foreign-key IDs with name reference tokens.

use super::table::IdNameTable;
use super::token;
use super::walker;
use crate::entity::{self, registry, Entity, EntityType};
use crate::error::Error;
use serde::Serialize;
use serde_json::Value;
use std::convert::Infallible;
use tracing::{debug, warn};

/// A foreign-key value for which no name was known. The raw ID stays in
/// place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingMapping {
    pub entity: String,
    pub field: String,
    pub path: String,
    pub value: String,
}

impl MissingMapping {
    #[must_use]
    pub fn to_error(&self) -> Error {
        Error::missing_id_mapping(&self.entity, &self.field, &self.value)
    }
}

/// Registers every entity's own `id → name` in `table`, then rewrites every
/// reference field whose value has a known name into a reference token.
///
/// Unknown IDs are reported, not fatal. Entities without a name (schedulers)
/// register nothing but still have their own references rewritten.
pub fn resolve(
    entity_type: &EntityType,
    entities: &mut [Entity],
    table: &mut IdNameTable,
) -> Vec<MissingMapping> {
    for entity in entities.iter() {
        if let (Some(id), Some(name)) = (entity::entity_id(entity), entity::entity_name(entity)) {
            if let Some(previous) = table.register(&id, name) {
                if !previous.eq_ignore_ascii_case(name) {
                    debug!(id = %id, previous = %previous, name = %name, "id re-registered under a new name");
                }
            }
        }
    }

    let mut missing = Vec::new();
    for (index, entity) in entities.iter_mut().enumerate() {
        let label = entity::describe(entity_type, entity, index);
        let mut replaced = 0usize;

        let _ = walker::walk_entity(entity, |visit| {
            let Some(field) = visit.field else {
                return Ok::<_, Infallible>(None);
            };
            if !registry::is_reference_field(field) {
                return Ok(None);
            }
            let Some(raw) = entity::scalar_text(visit.value) else {
                return Ok(None);
            };
            if token::may_contain_reference(&raw) {
                return Ok(None);
            }

            if let Some(name) = table.name_for(&raw) {
                replaced += 1;
                return Ok(Some(Value::String(token::format_reference(name))));
            }

            let mapping = MissingMapping {
                entity: label.clone(),
                field: field.to_string(),
                path: visit.path_string(),
                value: raw,
            };
            warn!(
                entity = %mapping.entity,
                path = %mapping.path,
                value = %mapping.value,
                "no name known for referenced id; leaving it in place"
            );
            missing.push(mapping);
            Ok(None)
        });

        debug!(entity = %label, replaced, "references rewritten");
    }

    missing
}
