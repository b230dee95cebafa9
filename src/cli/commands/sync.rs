//! Handlers for the commands that talk to the platform: `export` and `deploy`.

use crate::api::HttpEntityApi;
use crate::cli::render;
use crate::deploy::{self, DeployOptions};
use crate::entity::Product;
use crate::error::Error;
use crate::export::{self, ExportOptions};
use crate::fs::FileSystem;
use crate::output::Output;
use crate::project::Project;

pub async fn export<F: FileSystem + Clone>(
    project: &Project<F>,
    products: &[Product],
    urls: &[(Product, String)],
    keep_volatile: bool,
    output: &Output,
) -> Result<(), Error> {
    let config = project.load_config()?;
    let api = HttpEntityApi::from_config(&config, urls)?;
    let options = ExportOptions {
        keep_volatile,
        missing_mappings: config.policy.missing_mappings,
    };

    let report = export::export(&api, project, products, options).await?;
    output.info(render::render_export(&report));

    if report.failed() {
        return Err(Error::validation_error(format!(
            "export incomplete: {} type(s) failed, {} unmapped id(s)",
            report.types.iter().filter(|t| t.error.is_some()).count(),
            report.missing_count()
        )));
    }
    output.success(format!(
        "Exported {} entities.",
        report.types.iter().map(|t| t.count).sum::<usize>()
    ));
    Ok(())
}

pub async fn deploy<F: FileSystem + Clone>(
    project: &Project<F>,
    products: &[Product],
    urls: &[(Product, String)],
    mut options: DeployOptions,
    output: &Output,
) -> Result<(), Error> {
    let config = project.load_config()?;
    options.duplicates = config.policy.duplicates;
    let api = HttpEntityApi::from_config(&config, urls)?;

    let report = deploy::deploy(&api, project, products, options).await?;
    // Dry-run payloads are what the operator asked to see
    if options.dry_run {
        output.data(render::render_deploy(&report));
    } else {
        output.info(render::render_deploy(&report));
    }

    if report.failed() {
        return Err(Error::validation_error(format!(
            "deploy incomplete: {} file(s) skipped",
            report.types.iter().filter(|t| t.file_error.is_some()).count()
        )));
    }
    output.success(format!(
        "{} succeeded, {} not deployed.",
        report.succeeded(),
        report.unsuccessful()
    ));
    Ok(())
}
