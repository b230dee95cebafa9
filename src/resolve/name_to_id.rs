//! Deploy side: replaces name reference tokens with the IDs of the target
//! environment.

use super::table::NameIdTable;
use super::token::{self, Segment};
use super::walker;
use crate::entity::{self, registry, Entity, EntityKind, EntityType};
use crate::error::Error;
use crate::suggestions;
use serde_json::Value;
use tracing::debug;

/// Result of resolving one entity of a batch.
#[derive(Debug)]
pub struct EntityResolution {
    /// Position in the source file
    pub index: usize,
    pub label: String,
    /// Resolved copy of the entity, or why it cannot be deployed
    pub result: Result<Entity, Error>,
}

/// Checks every `fromName` token in the batch before anything is resolved.
///
/// # Errors
///
/// Returns `TemplateSyntax` for the first malformed token, naming `source`
/// and the entity path.
pub fn check_syntax(entities: &[Entity], source: &str) -> Result<(), Error> {
    for (index, entity) in entities.iter().enumerate() {
        walker::scan_entity(entity, |visit| {
            let Value::String(text) = visit.value else {
                return Ok(());
            };
            if !text.contains(crate::constants::TOKEN_OPEN) {
                return Ok(());
            }
            token::parse(text).map(|_| ()).map_err(|e| {
                Error::template_syntax(
                    source,
                    &format!("[{index}].{}", visit.path_string()),
                    &e.to_string(),
                )
            })
        })?;
    }
    Ok(())
}

/// Resolves every token in `entity` in place.
///
/// A token inside a known reference field only resolves against the kinds
/// that field points at; anywhere else it takes the latest entity registered
/// under that name.
///
/// # Errors
///
/// Returns `UnresolvedNameReference` naming the first unknown name. The
/// entity is left partially resolved in that case and must not be deployed.
pub fn resolve_entity(
    entity: &mut Entity,
    table: &NameIdTable,
    source: &str,
    label: &str,
) -> Result<(), Error> {
    let mut unresolved: Vec<String> = Vec::new();

    walker::walk_entity(entity, |visit| {
        let Value::String(text) = visit.value else {
            return Ok::<_, Error>(None);
        };
        if !token::may_contain_reference(text) {
            return Ok(None);
        }
        let segments = token::parse(text).map_err(|e| {
            Error::template_syntax(source, &visit.path_string(), &e.to_string())
        })?;
        let scope: Vec<EntityKind> = visit
            .field
            .map(registry::kinds_for_reference_field)
            .unwrap_or_default();

        // A lone token takes the ID as stored, so numeric IDs stay numbers
        if let [Segment::Reference(name)] = segments.as_slice() {
            if let Some(id) = table.resolve(name, &scope) {
                return Ok(Some(id.clone()));
            }
        }

        let mut rendered = String::with_capacity(text.len());
        let mut complete = true;
        for segment in &segments {
            match segment {
                Segment::Literal(literal) => rendered.push_str(literal),
                Segment::Reference(name) => {
                    if let Some(id) = table.resolve(name, &scope).and_then(entity::scalar_text) {
                        rendered.push_str(&id);
                    } else {
                        complete = false;
                        if !unresolved.iter().any(|n| n.eq_ignore_ascii_case(name)) {
                            unresolved.push(name.clone());
                        }
                    }
                }
            }
        }

        Ok(complete.then_some(Value::String(rendered)))
    })?;

    let Some(first) = unresolved.first() else {
        return Ok(());
    };
    let similar = suggestions::suggest_similar_names(first, table.names());
    Err(Error::unresolved_name_reference(source, label, first, &similar))
}

/// Resolves a batch read from `source`.
///
/// The syntax of the whole batch is checked first; a malformed token fails
/// the entire batch. After that every entity is resolved independently, so
/// one unknown name only affects the entity that contains it.
///
/// # Errors
///
/// Returns `TemplateSyntax` if any token in the batch is malformed.
pub fn resolve(
    entity_type: &EntityType,
    entities: &[Entity],
    table: &NameIdTable,
    source: &str,
) -> Result<Vec<EntityResolution>, Error> {
    check_syntax(entities, source)?;

    Ok(entities
        .iter()
        .enumerate()
        .map(|(index, original)| {
            let label = entity::describe(entity_type, original, index);
            let mut resolved = original.clone();
            let result = resolve_entity(&mut resolved, table, source, &label).map(|()| resolved);
            if let Err(e) = &result {
                debug!(entity = %label, error = %e, "entity not resolvable");
            }
            EntityResolution {
                index,
                label,
                result,
            }
        })
        .collect())
}
