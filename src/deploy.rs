//! `pdp deploy`: resolve name references against the target environment and
//! create or update entities type by type.

use crate::api::EntityApi;
use crate::constants::FIELD_ID;
use crate::entity::{self, Entity, EntityKind, EntityType, Product};
use crate::error::{Error, ErrorKind};
use crate::fs::FileSystem;
use crate::plan;
use crate::project::Project;
use crate::resolve::{name_to_id, token, NameIdTable};
use crate::validate::{self, Inconsistency, Severity};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct DeployOptions {
    /// Drop local IDs and create every entity
    pub ignore_ids: bool,
    /// Store assigned IDs back into the local files
    pub write_back: bool,
    /// Resolve and validate without calling the APIs
    pub dry_run: bool,
    pub duplicates: Severity,
}

/// What happened to one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntityStatus {
    /// IDs keep their JSON type as returned by the server
    Created { id: Value },
    Updated { id: Value },
    /// Dry run: the resolved payload that would be sent
    Planned { payload: Value },
    /// Not sent because a reference could not be resolved
    Skipped { reason: String },
    /// Sent and rejected, or the transport failed
    Failed { reason: String },
}

impl EntityStatus {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::Updated { .. } => "updated",
            Self::Planned { .. } => "planned",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(
            self,
            Self::Created { .. } | Self::Updated { .. } | Self::Planned { .. }
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityReport {
    pub entity: String,
    #[serde(flatten)]
    pub status: EntityStatus,
}

/// Outcome for one entity type.
#[derive(Debug, Serialize)]
pub struct TypeDeploy {
    pub entity_type: EntityKind,
    pub file: String,
    pub entities: Vec<EntityReport>,
    pub inconsistencies: Vec<Inconsistency>,
    /// Set when the whole file was skipped
    pub file_error: Option<String>,
}

impl TypeDeploy {
    fn new(entity_type: &EntityType) -> Self {
        Self {
            entity_type: entity_type.kind,
            file: entity_type.relative_path(),
            entities: Vec::new(),
            inconsistencies: Vec::new(),
            file_error: None,
        }
    }

    fn count(&self, f: impl Fn(&EntityStatus) -> bool) -> usize {
        self.entities.iter().filter(|e| f(&e.status)).count()
    }
}

#[derive(Debug, Default, Serialize)]
pub struct DeployReport {
    pub types: Vec<TypeDeploy>,
}

impl DeployReport {
    /// Whether the run should exit non-zero: a file was skipped as a whole.
    /// Per-entity failures are reported but do not fail the run.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.types.iter().any(|t| t.file_error.is_some())
    }

    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.types.iter().map(|t| t.count(EntityStatus::is_success)).sum()
    }

    #[must_use]
    pub fn unsuccessful(&self) -> usize {
        self.types
            .iter()
            .map(|t| t.count(|s| !s.is_success()))
            .sum()
    }
}

/// Registers `name → id` of every local entity of a type outside this run,
/// so references to entities deployed earlier keep resolving.
pub fn seed_from_project<F: FileSystem + Clone>(
    project: &Project<F>,
    skipped: &[&'static EntityType],
    table: &mut NameIdTable,
) {
    for entity_type in skipped {
        let entities = match project.read_entities(entity_type) {
            Ok(entities) => entities,
            Err(e) => {
                warn!(entity_type = %entity_type, error = %e, "ignoring unreadable local file");
                continue;
            }
        };
        for e in &entities {
            let (Some(id), Some(name)) = (entity::id_value(e), entity::entity_name(e)) else {
                continue;
            };
            if !id.as_str().is_some_and(token::may_contain_reference) {
                table.register(entity_type.kind, name, id.clone());
            }
        }
    }
}

/// Deploys every type of `products` in dependency order.
///
/// Each type is finished, and every resulting ID registered, before the
/// next type is resolved.
///
/// # Errors
///
/// Returns an error only if no plan can be made.
pub async fn deploy<A: EntityApi, F: FileSystem + Clone>(
    api: &A,
    project: &Project<F>,
    products: &[Product],
    options: DeployOptions,
) -> Result<DeployReport, Error> {
    let order = plan::plan_order(products)?;
    let mut table = NameIdTable::new();
    seed_from_project(project, &plan::unselected_types(products)?, &mut table);

    let mut report = DeployReport::default();
    for entity_type in order {
        let outcome = deploy_type(api, project, entity_type, &mut table, options).await;
        if let Some(reason) = &outcome.file_error {
            error!(file = %outcome.file, error = %reason, "file skipped");
        }
        report.types.push(outcome);
    }
    Ok(report)
}

async fn deploy_type<A: EntityApi, F: FileSystem + Clone>(
    api: &A,
    project: &Project<F>,
    entity_type: &'static EntityType,
    table: &mut NameIdTable,
    options: DeployOptions,
) -> TypeDeploy {
    let mut outcome = TypeDeploy::new(entity_type);
    let source = outcome.file.clone();

    let mut entities = match project.read_entities(entity_type) {
        Ok(entities) => entities,
        Err(e) => {
            outcome.file_error = Some(e.to_string());
            return outcome;
        }
    };
    if entities.is_empty() {
        debug!(file = %source, "nothing to deploy");
        return outcome;
    }

    outcome.inconsistencies = validate::check_batch(entity_type.kind, &entities)
        .into_iter()
        .filter(|i| !(options.ignore_ids && i.field == FIELD_ID))
        .collect();
    if let Some(first) = outcome.inconsistencies.first() {
        if options.duplicates == Severity::Error {
            outcome.file_error = Some(first.to_error().to_string());
            return outcome;
        }
        for i in &outcome.inconsistencies {
            warn!(error = %i.to_error(), "continuing despite duplicate");
        }
    }

    let resolutions = match name_to_id::resolve(entity_type, &entities, table, &source) {
        Ok(resolutions) => resolutions,
        Err(e) => {
            outcome.file_error = Some(e.to_string());
            return outcome;
        }
    };

    let mut dirty = false;
    for resolution in resolutions {
        let status = match resolution.result {
            Err(e) => {
                warn!(entity = %resolution.label, error = %e, "entity skipped");
                EntityStatus::Skipped {
                    reason: e.to_string(),
                }
            }
            Ok(mut resolved) => {
                if options.ignore_ids {
                    resolved.shift_remove(FIELD_ID);
                }
                let status = if options.dry_run {
                    plan_entity(entity_type, &resolved)
                } else {
                    send_entity(api, entity_type, &resolved).await
                };
                register_result(table, entity_type, &resolved, &status);
                if options.write_back && !options.dry_run {
                    dirty |= store_id(&mut entities[resolution.index], &status);
                }
                status
            }
        };
        outcome.entities.push(EntityReport {
            entity: resolution.label,
            status,
        });
    }

    if dirty {
        if let Err(e) = project.write_entities(entity_type, &entities) {
            outcome.file_error = Some(format!("failed to write back ids: {e}"));
        }
    }

    info!(
        entity_type = %entity_type,
        succeeded = outcome.count(EntityStatus::is_success),
        unsuccessful = outcome.count(|s| !s.is_success()),
        "type deployed"
    );
    outcome
}

fn plan_entity(entity_type: &EntityType, resolved: &Entity) -> EntityStatus {
    debug!(entity_type = %entity_type, "dry run, not sending");
    EntityStatus::Planned {
        payload: Value::Object(resolved.clone()),
    }
}

/// Updates the entity if it has an ID, falling back to create when the
/// server does not know that ID; creates it otherwise.
async fn send_entity<A: EntityApi>(
    api: &A,
    entity_type: &EntityType,
    resolved: &Entity,
) -> EntityStatus {
    if let (Some(id), Some(local_id)) = (entity::entity_id(resolved), entity::id_value(resolved)) {
        match api.update(entity_type, &id, resolved).await {
            Ok(returned) => {
                let id = returned
                    .as_ref()
                    .and_then(entity::id_value)
                    .unwrap_or(local_id)
                    .clone();
                return EntityStatus::Updated { id };
            }
            Err(e) if e.http_status() == Some(404) => {
                info!(entity_type = %entity_type, id = %id, "unknown id, creating instead");
            }
            Err(e) => {
                return EntityStatus::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    let mut payload = resolved.clone();
    payload.shift_remove(FIELD_ID);
    match api.create(entity_type, &payload).await {
        Ok(returned) => returned.as_ref().and_then(entity::id_value).cloned().map_or_else(
            || EntityStatus::Failed {
                reason: Error::new(
                    ErrorKind::HttpRequest,
                    "created, but the server did not return an id",
                    None,
                )
                .to_string(),
            },
            |id| EntityStatus::Created { id },
        ),
        Err(e) => EntityStatus::Failed {
            reason: e.to_string(),
        },
    }
}

/// Makes the entity's name resolvable for the types deployed after it.
fn register_result(
    table: &mut NameIdTable,
    entity_type: &EntityType,
    resolved: &Entity,
    status: &EntityStatus,
) {
    let Some(name) = entity::entity_name(resolved) else {
        return;
    };
    let id = match status {
        EntityStatus::Created { id } | EntityStatus::Updated { id } => id.clone(),
        // Dependents of a dry-run entity still resolve, to a marker
        EntityStatus::Planned { .. } => entity::id_value(resolved).cloned().unwrap_or_else(|| {
            Value::String(format!("<new {} '{name}'>", entity_type.kind))
        }),
        EntityStatus::Skipped { .. } | EntityStatus::Failed { .. } => return,
    };
    debug!(entity_type = %entity_type, name = %name, id = %id, "name registered");
    table.register(entity_type.kind, name, id);
}

/// Writes the assigned ID into the local (unresolved) entity. Returns
/// whether anything changed.
fn store_id(local: &mut Entity, status: &EntityStatus) -> bool {
    let (EntityStatus::Created { id } | EntityStatus::Updated { id }) = status else {
        return false;
    };
    if entity::id_value(local) == Some(id) {
        return false;
    }
    if let Some(existing) = local.get_mut(FIELD_ID) {
        *existing = id.clone();
    } else {
        let mut with_id = Entity::new();
        with_id.insert(FIELD_ID.to_string(), id.clone());
        with_id.extend(std::mem::take(local));
        *local = with_id;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::registry;
    use serde_json::json;

    fn entity(value: Value) -> Entity {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_new_id_is_stored_first_and_tokens_kept() {
        let mut local = entity(json!({"name": "web", "pipelineId": "{{ fromName('ingest') }}"}));

        let changed = store_id(
            &mut local,
            &EntityStatus::Created {
                id: "seed-1".into(),
            },
        );

        assert!(changed);
        assert_eq!(
            serde_json::to_string(&local).unwrap(),
            r#"{"id":"seed-1","name":"web","pipelineId":"{{ fromName('ingest') }}"}"#
        );
    }

    #[test]
    fn test_unchanged_id_is_not_rewritten() {
        let mut local = entity(json!({"id": "s1", "name": "web"}));
        assert!(!store_id(
            &mut local,
            &EntityStatus::Updated { id: "s1".into() }
        ));
        assert!(!store_id(
            &mut local,
            &EntityStatus::Skipped {
                reason: "x".into()
            }
        ));
    }

    #[test]
    fn test_only_successes_register_names() {
        let mut table = NameIdTable::new();
        let seed = registry::get(EntityKind::Seed);
        let resolved = entity(json!({"name": "Web"}));

        register_result(
            &mut table,
            seed,
            &resolved,
            &EntityStatus::Failed {
                reason: "boom".into(),
            },
        );
        assert!(table.is_empty());

        register_result(
            &mut table,
            seed,
            &resolved,
            &EntityStatus::Created { id: "s-9".into() },
        );
        assert_eq!(
            table.resolve("web", &[EntityKind::Seed]),
            Some(&json!("s-9"))
        );
    }

    #[test]
    fn test_report_fails_only_on_file_errors() {
        let mut report = DeployReport::default();
        let mut seeds = TypeDeploy::new(registry::get(EntityKind::Seed));
        seeds.entities.push(EntityReport {
            entity: "seed 'a'".into(),
            status: EntityStatus::Skipped {
                reason: "unresolved".into(),
            },
        });
        report.types.push(seeds);
        assert!(!report.failed());
        assert_eq!(report.unsuccessful(), 1);

        report.types[0].file_error = Some("bad json".into());
        assert!(report.failed());
    }

    mod run {
        use super::*;
        use crate::fs::OsFileSystem;
        use std::sync::Mutex;
        use tempfile::TempDir;

        /// In-memory API: creates get `<wireType>-<n>` IDs, updates of
        /// `unknown` IDs answer 404.
        #[derive(Default)]
        struct MockApi {
            unknown: Vec<String>,
            next: Mutex<u32>,
            sent: Mutex<Vec<(&'static str, EntityKind, Entity)>>,
        }

        impl MockApi {
            fn sent(&self, kind: EntityKind) -> Vec<Entity> {
                self.sent
                    .lock()
                    .unwrap()
                    .iter()
                    .filter(|(_, k, _)| *k == kind)
                    .map(|(_, _, e)| e.clone())
                    .collect()
            }
        }

        impl EntityApi for MockApi {
            async fn list(&self, _: &EntityType) -> Result<Vec<Entity>, Error> {
                Ok(Vec::new())
            }

            async fn create(
                &self,
                entity_type: &EntityType,
                entity: &Entity,
            ) -> Result<Option<Entity>, Error> {
                self.sent
                    .lock()
                    .unwrap()
                    .push(("create", entity_type.kind, entity.clone()));
                let mut next = self.next.lock().unwrap();
                *next += 1;
                let mut returned = entity.clone();
                returned.insert(
                    "id".into(),
                    Value::String(format!("{}-{}", entity_type.wire_type, *next)),
                );
                Ok(Some(returned))
            }

            async fn update(
                &self,
                entity_type: &EntityType,
                id: &str,
                entity: &Entity,
            ) -> Result<Option<Entity>, Error> {
                if self.unknown.iter().any(|u| u == id) {
                    return Err(Error::http_request("PUT", "http://mock", 404, vec![]));
                }
                self.sent
                    .lock()
                    .unwrap()
                    .push(("update", entity_type.kind, entity.clone()));
                Ok(None)
            }
        }

        fn project(files: &[(EntityKind, Value)]) -> (TempDir, Project<OsFileSystem>) {
            let dir = TempDir::new().unwrap();
            let project = Project::new(dir.path());
            for (kind, content) in files {
                let entities: Vec<Entity> = serde_json::from_value(content.clone()).unwrap();
                project.write_entities(registry::get(*kind), &entities).unwrap();
            }
            (dir, project)
        }

        const fn options() -> DeployOptions {
            DeployOptions {
                ignore_ids: false,
                write_back: true,
                dry_run: false,
                duplicates: Severity::Error,
            }
        }

        fn ingestion_files() -> Vec<(EntityKind, Value)> {
            vec![
                (
                    EntityKind::IngestionProcessor,
                    json!([{"name": "OCR Processor", "type": "ocr"}]),
                ),
                (
                    EntityKind::Pipeline,
                    json!([{
                        "name": "ingest",
                        "steps": [{"processorId": "{{ fromName('OCR Processor') }}"}]
                    }]),
                ),
            ]
        }

        #[tokio::test]
        async fn test_dependents_resolve_to_ids_created_in_the_same_run() {
            let (_dir, project) = project(&ingestion_files());
            let api = MockApi::default();

            let report = deploy(&api, &project, &[Product::Ingestion], options())
                .await
                .unwrap();

            assert!(!report.failed());
            let sent = api.sent(EntityKind::Pipeline);
            assert_eq!(sent[0]["steps"][0]["processorId"], "processor-1");

            let local = project
                .read_entities(registry::get(EntityKind::IngestionProcessor))
                .unwrap();
            assert_eq!(local[0].keys().next().map(String::as_str), Some("id"));
            assert_eq!(local[0]["id"], "processor-1");
            let pipelines = project
                .read_entities(registry::get(EntityKind::Pipeline))
                .unwrap();
            assert_eq!(
                pipelines[0]["steps"][0]["processorId"],
                "{{ fromName('OCR Processor') }}"
            );
        }

        #[tokio::test]
        async fn test_unknown_name_skips_only_that_entity() {
            let (_dir, project) = project(&[(
                EntityKind::Pipeline,
                json!([
                    {"name": "ok"},
                    {"name": "broken", "steps": [{"processorId": "{{ fromName('missing') }}"}]}
                ]),
            )]);
            let api = MockApi::default();

            let report = deploy(&api, &project, &[Product::Ingestion], options())
                .await
                .unwrap();

            let pipelines = report
                .types
                .iter()
                .find(|t| t.entity_type == EntityKind::Pipeline)
                .unwrap();
            assert_eq!(pipelines.entities[0].status.label(), "created");
            match &pipelines.entities[1].status {
                EntityStatus::Skipped { reason } => assert!(reason.contains("'missing'"), "{reason}"),
                other => panic!("unexpected status {other:?}"),
            }
            assert!(!report.failed());
            assert_eq!(api.sent(EntityKind::Pipeline).len(), 1);
        }

        #[tokio::test]
        async fn test_dry_run_sends_nothing_and_writes_nothing() {
            let (_dir, project) = project(&ingestion_files());
            let api = MockApi::default();
            let before = project
                .read_entities(registry::get(EntityKind::IngestionProcessor))
                .unwrap();

            let report = deploy(
                &api,
                &project,
                &[Product::Ingestion],
                DeployOptions {
                    dry_run: true,
                    ..options()
                },
            )
            .await
            .unwrap();

            assert!(api.sent.lock().unwrap().is_empty());
            let pipeline = &report
                .types
                .iter()
                .find(|t| t.entity_type == EntityKind::Pipeline)
                .unwrap()
                .entities[0];
            match &pipeline.status {
                EntityStatus::Planned { payload } => assert_eq!(
                    payload["steps"][0]["processorId"],
                    "<new ingestion processor 'OCR Processor'>"
                ),
                other => panic!("unexpected status {other:?}"),
            }
            assert_eq!(
                project
                    .read_entities(registry::get(EntityKind::IngestionProcessor))
                    .unwrap(),
                before
            );
        }

        #[tokio::test]
        async fn test_update_of_unknown_id_falls_back_to_create() {
            let (_dir, project) = project(&[(
                EntityKind::Seed,
                json!([{"id": "gone", "name": "web"}]),
            )]);
            let api = MockApi {
                unknown: vec!["gone".into()],
                ..MockApi::default()
            };

            let report = deploy(&api, &project, &[Product::Ingestion], options())
                .await
                .unwrap();

            let seeds = report
                .types
                .iter()
                .find(|t| t.entity_type == EntityKind::Seed)
                .unwrap();
            assert_eq!(
                seeds.entities[0].status,
                EntityStatus::Created { id: "seed-1".into() }
            );
            assert!(!api.sent(EntityKind::Seed)[0].contains_key("id"));
            let local = project.read_entities(registry::get(EntityKind::Seed)).unwrap();
            assert_eq!(local[0]["id"], "seed-1");
        }

        #[tokio::test]
        async fn test_duplicate_names_skip_the_file_under_error_policy() {
            let (_dir, project) = project(&[(
                EntityKind::Seed,
                json!([{"name": "Web"}, {"name": "web"}]),
            )]);
            let api = MockApi::default();

            let report = deploy(&api, &project, &[Product::Ingestion], options())
                .await
                .unwrap();

            assert!(report.failed());
            assert!(api.sent(EntityKind::Seed).is_empty());

            let report = deploy(
                &api,
                &project,
                &[Product::Ingestion],
                DeployOptions {
                    duplicates: Severity::Warning,
                    write_back: false,
                    ..options()
                },
            )
            .await
            .unwrap();
            assert!(!report.failed());
            assert_eq!(api.sent(EntityKind::Seed).len(), 2);
        }

        #[tokio::test]
        async fn test_references_to_unselected_products_use_local_ids() {
            let (_dir, project) = project(&[
                (EntityKind::Credential, json!([{"id": "cred-7", "name": "s3"}])),
                (
                    EntityKind::IngestionProcessor,
                    json!([{"name": "fetch", "credentialId": "{{ fromName('S3') }}"}]),
                ),
            ]);
            let api = MockApi::default();

            deploy(&api, &project, &[Product::Ingestion], options())
                .await
                .unwrap();

            assert!(api.sent(EntityKind::Credential).is_empty());
            assert_eq!(
                api.sent(EntityKind::IngestionProcessor)[0]["credentialId"],
                "cred-7"
            );
        }
    }
}
