//! `pdp validate`: offline checks of a project before it is deployed.

use crate::deploy;
use crate::entity::{EntitiesByType, EntityKind, Product};
use crate::error::Error;
use crate::fs::FileSystem;
use crate::plan;
use crate::project::Project;
use crate::resolve::{name_to_id, NameIdTable};
use crate::validate::{self, DanglingReference, Inconsistency, Severity};
use serde::Serialize;
use tracing::{error, warn};

#[derive(Debug, Serialize)]
pub struct FileCheck {
    pub entity_type: EntityKind,
    pub file: String,
    pub count: usize,
    /// Parse or token syntax error; the file is left out of the other checks
    pub error: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct ValidationReport {
    pub files: Vec<FileCheck>,
    pub inconsistencies: Vec<Inconsistency>,
    pub dangling: Vec<DanglingReference>,
    #[serde(skip)]
    pub duplicates_are_errors: bool,
}

impl ValidationReport {
    /// Whether the project would not deploy cleanly.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.files.iter().any(|f| f.error.is_some())
            || !self.dangling.is_empty()
            || (self.duplicates_are_errors && !self.inconsistencies.is_empty())
    }

    #[must_use]
    pub fn problem_count(&self) -> usize {
        self.files.iter().filter(|f| f.error.is_some()).count()
            + self.inconsistencies.len()
            + self.dangling.len()
    }
}

/// Checks the files of `products`: JSON structure, reference token syntax,
/// duplicate IDs and names, and references no deploy could resolve.
///
/// References into products outside `products` count as resolvable when
/// the local file of the target type has the entity with an ID.
///
/// # Errors
///
/// Returns an error only if no plan can be made.
pub fn check<F: FileSystem + Clone>(
    project: &Project<F>,
    products: &[Product],
    duplicates: Severity,
) -> Result<ValidationReport, Error> {
    let mut report = ValidationReport {
        duplicates_are_errors: duplicates == Severity::Error,
        ..ValidationReport::default()
    };
    let mut loaded = EntitiesByType::new();

    for entity_type in plan::plan_order(products)? {
        let file = entity_type.relative_path();
        let result = project.read_entities(entity_type).and_then(|entities| {
            name_to_id::check_syntax(&entities, &file)?;
            Ok(entities)
        });
        match result {
            Ok(entities) => {
                report.files.push(FileCheck {
                    entity_type: entity_type.kind,
                    file,
                    count: entities.len(),
                    error: None,
                });
                loaded.insert(entity_type.kind, entities);
            }
            Err(e) => {
                error!(file = %file, error = %e, "file is invalid");
                report.files.push(FileCheck {
                    entity_type: entity_type.kind,
                    file,
                    count: 0,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    report.inconsistencies = validate::find_inconsistencies(&loaded);
    for i in &report.inconsistencies {
        warn!(error = %i.to_error(), "duplicate");
    }

    let mut known = NameIdTable::new();
    deploy::seed_from_project(project, &plan::unselected_types(products)?, &mut known);
    report.dangling = validate::find_dangling_references(&loaded, &known);
    for d in &report.dangling {
        warn!(file = %d.file, entity = %d.entity, name = %d.name, "reference cannot be resolved");
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::registry;
    use crate::fs::OsFileSystem;
    use std::fs;
    use tempfile::TempDir;

    fn project_with(files: &[(&str, &str)]) -> (TempDir, Project<OsFileSystem>) {
        let dir = TempDir::new().unwrap();
        for (path, content) in files {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        let project = Project::new(dir.path());
        (dir, project)
    }

    #[test]
    fn test_clean_project_passes() {
        let (_dir, project) = project_with(&[
            ("Ingestion/processors.json", r#"[{"name": "OCR"}]"#),
            (
                "Ingestion/pipelines.json",
                r#"[{"name": "p", "steps": [{"processorId": "{{ fromName('ocr') }}"}]}]"#,
            ),
        ]);

        let report = check(&project, &[Product::Ingestion], Severity::Error).unwrap();

        assert!(!report.failed(), "{report:?}");
        assert_eq!(report.problem_count(), 0);
    }

    #[test]
    fn test_malformed_file_is_reported_and_others_still_checked() {
        let (_dir, project) = project_with(&[
            ("Ingestion/processors.json", "[{"),
            ("Ingestion/seeds.json", r#"[{"id": "X"}, {"id": "X"}]"#),
        ]);

        let report = check(&project, &[Product::Ingestion], Severity::Warning).unwrap();

        let processors = report
            .files
            .iter()
            .find(|f| f.entity_type == EntityKind::IngestionProcessor)
            .unwrap();
        assert!(processors.error.is_some());
        assert_eq!(report.inconsistencies.len(), 1);
        assert_eq!(report.inconsistencies[0].field, "id");
        assert_eq!(report.inconsistencies[0].value, "X");
        assert!(report.failed());
    }

    #[test]
    fn test_duplicates_fail_only_under_error_policy() {
        let (_dir, project) =
            project_with(&[("Core/credentials.json", r#"[{"name": "a"}, {"name": "A"}]"#)]);

        assert!(!check(&project, &[Product::Core], Severity::Warning)
            .unwrap()
            .failed());
        assert!(check(&project, &[Product::Core], Severity::Error)
            .unwrap()
            .failed());
    }

    #[test]
    fn test_token_syntax_errors_name_the_file() {
        let (_dir, project) = project_with(&[(
            "Discovery/endpoints.json",
            r#"[{"name": "e", "processors": "{{ fromName('open }}"}]"#,
        )]);

        let report = check(&project, &[Product::Discovery], Severity::Error).unwrap();

        let endpoints = &report.files[report.files.len() - 1];
        assert_eq!(endpoints.entity_type, EntityKind::Endpoint);
        assert!(endpoints
            .error
            .as_deref()
            .is_some_and(|e| e.contains("Discovery/endpoints.json")));
    }

    #[test]
    fn test_dangling_reference_respects_unselected_local_files() {
        let (_dir, project) = project_with(&[
            ("Core/credentials.json", r#"[{"id": "c-1", "name": "vault"}]"#),
            (
                "Ingestion/processors.json",
                r#"[{"name": "a", "credentialId": "{{ fromName('vault') }}"},
                    {"name": "b", "credentialId": "{{ fromName('nowhere') }}"}]"#,
            ),
        ]);

        let report = check(&project, &[Product::Ingestion], Severity::Error).unwrap();

        assert_eq!(report.dangling.len(), 1);
        assert_eq!(report.dangling[0].name, "nowhere");
        assert_eq!(
            report.dangling[0].file,
            registry::get(EntityKind::IngestionProcessor).relative_path()
        );
        assert!(report.failed());
    }
}
