//! Table rendering of command reports.

use crate::check::ValidationReport;
use crate::deploy::{DeployReport, EntityStatus};
use crate::export::ExportReport;
use crate::plan::PlanStep;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Longest reason shown in a table cell; the full text is in the logs.
const MAX_REASON_LEN: usize = 120;

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Type")]
    entity_type: String,
    #[tabled(rename = "Product")]
    product: String,
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "References")]
    references: String,
}

#[derive(Tabled)]
struct ExportRow {
    #[tabled(rename = "Type")]
    entity_type: String,
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Entities")]
    count: usize,
    #[tabled(rename = "Unmapped IDs")]
    missing: usize,
    #[tabled(rename = "Error")]
    error: String,
}

#[derive(Tabled)]
struct DeployRow {
    #[tabled(rename = "Type")]
    entity_type: String,
    #[tabled(rename = "Entity")]
    entity: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

#[derive(Tabled)]
struct ProblemRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Problem")]
    problem: String,
}

fn table<T: Tabled>(rows: &[T]) -> String {
    Table::new(rows).with(Style::sharp()).to_string()
}

fn shorten(text: &str) -> String {
    if text.chars().count() <= MAX_REASON_LEN {
        return text.to_string();
    }
    let cut: String = text.chars().take(MAX_REASON_LEN).collect();
    format!("{cut}…")
}

#[must_use]
pub fn render_plan(steps: &[PlanStep]) -> String {
    let rows: Vec<PlanRow> = steps
        .iter()
        .map(|s| PlanRow {
            position: s.position,
            entity_type: s.entity_type.clone(),
            product: s.product.to_string(),
            file: s.file.clone(),
            references: if s.references.is_empty() {
                "-".to_string()
            } else {
                s.references.join(", ")
            },
        })
        .collect();
    table(&rows)
}

#[must_use]
pub fn render_export(report: &ExportReport) -> String {
    let rows: Vec<ExportRow> = report
        .types
        .iter()
        .map(|t| ExportRow {
            entity_type: t.entity_type.clone(),
            file: t.file.clone(),
            count: t.count,
            missing: t.missing.len(),
            error: t.error.as_deref().map(shorten).unwrap_or_default(),
        })
        .collect();
    let mut out = table(&rows);
    for t in &report.types {
        for m in &t.missing {
            out.push_str(&format!(
                "\n{}: {} at {} keeps unmapped id '{}'",
                t.file, m.entity, m.path, m.value
            ));
        }
    }
    out
}

#[must_use]
pub fn render_deploy(report: &DeployReport) -> String {
    let mut rows = Vec::new();
    for t in &report.types {
        if let Some(error) = &t.file_error {
            rows.push(DeployRow {
                entity_type: t.entity_type.to_string(),
                entity: t.file.clone(),
                result: "file skipped".to_string(),
                detail: shorten(error),
            });
        }
        for e in &t.entities {
            let detail = match &e.status {
                EntityStatus::Created { id } | EntityStatus::Updated { id } => {
                    crate::entity::scalar_text(id).unwrap_or_default()
                }
                EntityStatus::Planned { payload } => {
                    serde_json::to_string(payload).map_or_else(|_| String::new(), |s| shorten(&s))
                }
                EntityStatus::Skipped { reason } | EntityStatus::Failed { reason } => shorten(reason),
            };
            rows.push(DeployRow {
                entity_type: t.entity_type.to_string(),
                entity: e.entity.clone(),
                result: e.status.label().to_string(),
                detail,
            });
        }
    }
    if rows.is_empty() {
        return "Nothing to deploy.".to_string();
    }
    table(&rows)
}

#[must_use]
pub fn render_validation(report: &ValidationReport) -> String {
    let mut rows: Vec<ProblemRow> = report
        .files
        .iter()
        .filter_map(|f| {
            f.error.as_ref().map(|e| ProblemRow {
                file: f.file.clone(),
                problem: shorten(e),
            })
        })
        .collect();
    rows.extend(report.inconsistencies.iter().map(|i| ProblemRow {
        file: crate::entity::registry::get(i.entity_type).relative_path(),
        problem: format!(
            "duplicate {} '{}' (entities #{} and #{})",
            i.field,
            i.value,
            i.first + 1,
            i.duplicate + 1
        ),
    }));
    rows.extend(report.dangling.iter().map(|d| ProblemRow {
        file: d.file.clone(),
        problem: format!("{} at {} references unknown name '{}'", d.entity, d.path, d.name),
    }));

    if rows.is_empty() {
        let count: usize = report.files.iter().map(|f| f.count).sum();
        return format!("{} files, {count} entities: no problems found.", report.files.len());
    }
    table(&rows)
}
