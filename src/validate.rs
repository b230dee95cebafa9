//! Offline consistency checks over a loaded set of entities.

use crate::entity::{self, registry, EntitiesByType, Entity, EntityKind};
use crate::error::Error;
use crate::resolve::{token, walker, NameIdTable};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// How a policy violation is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Reported, processing continues
    Warning,
    /// Reported and the affected file is skipped; the run exits non-zero
    Error,
}

impl Severity {
    pub const VALUES: &'static [&'static str] = &["error", "warning"];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            _ => Err(()),
        }
    }
}

/// Two entities of one type sharing an `id` or a `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inconsistency {
    pub entity_type: EntityKind,
    /// `id` or `name`
    pub field: &'static str,
    pub value: String,
    /// Zero-based positions of the first and the duplicate entity
    pub first: usize,
    pub duplicate: usize,
}

impl Inconsistency {
    #[must_use]
    pub fn to_error(&self) -> Error {
        Error::data_inconsistency(self.entity_type.as_str(), self.field, &self.value)
    }
}

/// A reference token whose name is neither defined in the loaded set nor
/// already known to the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingReference {
    pub file: String,
    pub entity: String,
    pub path: String,
    pub name: String,
}

/// Duplicate `id`s and case-insensitive duplicate `name`s within one batch,
/// in the order they are found.
#[must_use]
pub fn check_batch(kind: EntityKind, entities: &[Entity]) -> Vec<Inconsistency> {
    let mut found = Vec::new();
    let mut ids: HashMap<String, usize> = HashMap::new();
    let mut names: HashMap<String, usize> = HashMap::new();

    for (index, e) in entities.iter().enumerate() {
        if let Some(id) = entity::entity_id(e) {
            if let Some(&first) = ids.get(&id) {
                found.push(Inconsistency {
                    entity_type: kind,
                    field: crate::constants::FIELD_ID,
                    value: id,
                    first,
                    duplicate: index,
                });
            } else {
                ids.insert(id, index);
            }
        }
        if let Some(name) = entity::entity_name(e) {
            let folded = name.to_lowercase();
            if let Some(&first) = names.get(&folded) {
                found.push(Inconsistency {
                    entity_type: kind,
                    field: crate::constants::FIELD_NAME,
                    value: name.to_string(),
                    first,
                    duplicate: index,
                });
            } else {
                names.insert(folded, index);
            }
        }
    }
    found
}

/// Every duplicate across all types.
#[must_use]
pub fn find_inconsistencies(entities_by_type: &EntitiesByType) -> Vec<Inconsistency> {
    entities_by_type
        .iter()
        .flat_map(|(kind, entities)| check_batch(*kind, entities))
        .collect()
}

/// Fails on the first duplicate `id` or `name` found.
///
/// # Errors
///
/// Returns `DataInconsistency` naming the offending field and value.
pub fn validate(entities_by_type: &EntitiesByType) -> Result<(), Error> {
    find_inconsistencies(entities_by_type)
        .first()
        .map_or(Ok(()), |first| Err(first.to_error()))
}

/// Lists reference tokens that cannot resolve: the name is not defined by a
/// loaded entity of a kind the field may point at, and `known` has no entry
/// for it either. Malformed tokens are not reported here.
#[must_use]
pub fn find_dangling_references(
    entities_by_type: &EntitiesByType,
    known: &NameIdTable,
) -> Vec<DanglingReference> {
    let mut defined: HashMap<EntityKind, HashSet<String>> = HashMap::new();
    for (kind, entities) in entities_by_type {
        let names = defined.entry(*kind).or_default();
        names.extend(
            entities
                .iter()
                .filter_map(entity::entity_name)
                .map(str::to_lowercase),
        );
    }
    let defined_anywhere = |name: &str| defined.values().any(|names| names.contains(name));

    let mut dangling = Vec::new();
    for (kind, entities) in entities_by_type {
        let entity_type = registry::get(*kind);
        let file = entity_type.relative_path();
        for (index, e) in entities.iter().enumerate() {
            let label = entity::describe(entity_type, e, index);
            let _ = walker::scan_entity(e, |visit| {
                let Some(text) = visit.value.as_str() else {
                    return Ok::<_, Infallible>(());
                };
                if !token::may_contain_reference(text) {
                    return Ok(());
                }
                let Ok(names) = token::references(text) else {
                    return Ok(());
                };
                let scope = visit
                    .field
                    .map(registry::kinds_for_reference_field)
                    .unwrap_or_default();
                for name in names {
                    let folded = name.to_lowercase();
                    let locally = if scope.is_empty() {
                        defined_anywhere(&folded)
                    } else {
                        scope
                            .iter()
                            .any(|k| defined.get(k).is_some_and(|n| n.contains(&folded)))
                    };
                    if !locally && known.resolve(&name, &scope).is_none() {
                        dangling.push(DanglingReference {
                            file: file.clone(),
                            entity: label.clone(),
                            path: visit.path_string(),
                            name,
                        });
                    }
                }
                Ok(())
            });
        }
    }
    dangling
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::{json, Value};

    fn batch(value: Value) -> Vec<Entity> {
        serde_json::from_value(value).unwrap()
    }

    fn one(kind: EntityKind, value: Value) -> EntitiesByType {
        let mut map = EntitiesByType::new();
        map.insert(kind, batch(value));
        map
    }

    #[test]
    fn test_duplicate_id_names_field_and_value() {
        let set = one(
            EntityKind::Pipeline,
            json!([{"id": "X", "name": "a"}, {"id": "X", "name": "b"}]),
        );

        let err = validate(&set).unwrap_err();

        assert_eq!(err.kind(), Some(ErrorKind::DataInconsistency));
        let details = err.to_json().details.unwrap();
        assert_eq!(details["field"], "id");
        assert_eq!(details["value"], "X");
    }

    #[test]
    fn test_duplicate_names_ignore_case() {
        let found = check_batch(
            EntityKind::Seed,
            &batch(json!([{"name": "Web"}, {"name": "other"}, {"name": "WEB"}])),
        );
        assert_eq!(
            found,
            vec![Inconsistency {
                entity_type: EntityKind::Seed,
                field: "name",
                value: "WEB".into(),
                first: 0,
                duplicate: 2,
            }]
        );
    }

    #[test]
    fn test_null_ids_and_unnamed_entities_are_not_duplicates() {
        let set = one(
            EntityKind::Scheduler,
            json!([{"id": null, "seedId": "a"}, {"id": null, "seedId": "b"}, {}]),
        );
        assert!(validate(&set).is_ok());
    }

    #[test]
    fn test_same_name_in_different_types_is_fine() {
        let mut set = one(EntityKind::IngestionProcessor, json!([{"name": "ocr"}]));
        set.insert(EntityKind::DiscoveryProcessor, batch(json!([{"name": "OCR"}])));
        assert!(find_inconsistencies(&set).is_empty());
    }

    #[test]
    fn test_every_inconsistency_is_listed() {
        let set = one(
            EntityKind::Credential,
            json!([{"id": "1", "name": "a"}, {"id": "1", "name": "A"}]),
        );
        let found = find_inconsistencies(&set);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].field, "id");
        assert_eq!(found[1].field, "name");
    }

    #[test]
    fn test_references_defined_in_the_set_are_not_dangling() {
        let mut set = one(EntityKind::Pipeline, json!([{"name": "Ingest"}]));
        set.insert(
            EntityKind::Seed,
            batch(json!([
                {"name": "web", "pipelineId": "{{ fromName('ingest') }}"},
                {"name": "docs", "pipelineId": "{{ fromName('missing') }}"}
            ])),
        );

        let dangling = find_dangling_references(&set, &NameIdTable::new());

        assert_eq!(
            dangling,
            vec![DanglingReference {
                file: "Ingestion/seeds.json".into(),
                entity: "seed 'docs'".into(),
                path: "pipelineId".into(),
                name: "missing".into(),
            }]
        );
    }

    #[test]
    fn test_names_known_to_the_table_are_not_dangling() {
        let set = one(
            EntityKind::Seed,
            json!([{"name": "web", "credentialId": "{{ fromName('vault') }}"}]),
        );
        let mut known = NameIdTable::new();
        known.register(EntityKind::Credential, "Vault", "c-1");

        assert!(find_dangling_references(&set, &known).is_empty());
    }

    #[test]
    fn test_reference_to_wrong_kind_is_dangling() {
        let mut set = one(EntityKind::DiscoveryProcessor, json!([{"name": "ocr"}]));
        set.insert(
            EntityKind::Pipeline,
            batch(json!([{"name": "p", "steps": [{"processorId": "{{ fromName('ocr') }}"}]}])),
        );

        let dangling = find_dangling_references(&set, &NameIdTable::new());

        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].path, "steps[0].processorId");
    }

    #[test]
    fn test_severity_parses_loosely() {
        assert_eq!("WARN".parse::<Severity>(), Ok(Severity::Warning));
        assert_eq!("error".parse::<Severity>(), Ok(Severity::Error));
        assert!("fatal".parse::<Severity>().is_err());
    }
}
