//! `pdp export`: fetch remote entities and store them with portable name
//! references.

use crate::api::EntityApi;
use crate::constants::VOLATILE_FIELDS;
use crate::entity::{self, Entity, EntityType, Product};
use crate::error::Error;
use crate::fs::FileSystem;
use crate::plan;
use crate::project::Project;
use crate::resolve::{id_to_name, IdNameTable, MissingMapping};
use crate::validate::Severity;
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    /// Keep server-managed timestamps
    pub keep_volatile: bool,
    pub missing_mappings: Severity,
}

/// Outcome for one entity type.
#[derive(Debug, Serialize)]
pub struct TypeExport {
    pub entity_type: String,
    pub file: String,
    pub count: usize,
    pub missing: Vec<MissingMapping>,
    /// Set when the type could not be listed or written
    pub error: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct ExportReport {
    pub types: Vec<TypeExport>,
    /// Whether missing mappings count as failures
    #[serde(skip)]
    pub missing_is_error: bool,
}

impl ExportReport {
    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.types.iter().map(|t| t.missing.len()).sum()
    }

    /// Whether the run should exit non-zero.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.types.iter().any(|t| t.error.is_some())
            || (self.missing_is_error && self.missing_count() > 0)
    }
}

/// Removes server-managed fields from an entity.
pub fn strip_volatile(entity: &mut Entity) {
    for field in VOLATILE_FIELDS {
        entity.shift_remove(*field);
    }
}

/// Seeds `table` with `id → name` of every local entity of a type that is
/// not part of this run, so references to them still become names.
pub fn seed_from_project<F: FileSystem + Clone>(
    project: &Project<F>,
    skipped: &[&'static EntityType],
    table: &mut IdNameTable,
) {
    for entity_type in skipped {
        match project.read_entities(entity_type) {
            Ok(entities) => {
                for e in &entities {
                    if let (Some(id), Some(name)) = (entity::entity_id(e), entity::entity_name(e)) {
                        table.register(&id, name);
                    }
                }
            }
            Err(e) => warn!(entity_type = %entity_type, error = %e, "ignoring unreadable local file"),
        }
    }
}

/// Exports every type of `products` in dependency order.
///
/// Failing to list or write one type is recorded and the run continues with
/// the next type; references to that type's entities then show up as
/// missing mappings.
///
/// # Errors
///
/// Returns an error only if no plan can be made.
pub async fn export<A: EntityApi, F: FileSystem + Clone>(
    api: &A,
    project: &Project<F>,
    products: &[Product],
    options: ExportOptions,
) -> Result<ExportReport, Error> {
    let order = plan::plan_order(products)?;
    let mut table = IdNameTable::new();
    seed_from_project(project, &plan::unselected_types(products)?, &mut table);

    let mut report = ExportReport {
        types: Vec::with_capacity(order.len()),
        missing_is_error: options.missing_mappings == Severity::Error,
    };

    for entity_type in order {
        let file = entity_type.relative_path();
        let mut entities = match api.list(entity_type).await {
            Ok(entities) => entities,
            Err(e) => {
                error!(entity_type = %entity_type, error = %e, "listing failed");
                report.types.push(TypeExport {
                    entity_type: entity_type.kind.to_string(),
                    file,
                    count: 0,
                    missing: Vec::new(),
                    error: Some(e.to_string()),
                });
                continue;
            }
        };

        if !options.keep_volatile {
            entities.iter_mut().for_each(strip_volatile);
        }
        let missing = id_to_name::resolve(entity_type, &mut entities, &mut table);
        if options.missing_mappings == Severity::Error {
            for m in &missing {
                error!(error = %m.to_error(), "missing id mapping");
            }
        }

        let error = project
            .write_entities(entity_type, &entities)
            .err()
            .map(|e| e.to_string());
        info!(entity_type = %entity_type, count = entities.len(), file = %file, "exported");

        report.types.push(TypeExport {
            entity_type: entity_type.kind.to_string(),
            file,
            count: entities.len(),
            missing,
            error,
        });
    }

    Ok(report)
}
