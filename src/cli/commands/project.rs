//! Handlers for the offline commands: `init`, `plan` and `validate`.

use crate::check;
use crate::cli::render;
use crate::entity::Product;
use crate::error::Error;
use crate::fs::FileSystem;
use crate::output::Output;
use crate::plan;
use crate::project::Project;

pub fn init<F: FileSystem + Clone>(
    project: &Project<F>,
    force: bool,
    output: &Output,
) -> Result<(), Error> {
    let created = project.init(force)?;
    for path in &created {
        output.info(format!("  created {}", path.display()));
    }
    output.success(format!("Project initialised in {}", project.root().display()));
    output.tip("Next: set the product URLs with 'pdp config set products.<product>.url <URL>'.");
    Ok(())
}

pub fn plan(products: &[Product], json: bool, output: &Output) -> Result<(), Error> {
    let steps = plan::describe_plan(products)?;
    if json {
        output.data(serde_json::to_string_pretty(&steps)?);
    } else {
        output.data(render::render_plan(&steps));
    }
    Ok(())
}

pub fn validate<F: FileSystem + Clone>(
    project: &Project<F>,
    products: &[Product],
    json: bool,
    output: &Output,
) -> Result<(), Error> {
    let config = project.load_config()?;
    let report = check::check(project, products, config.policy.duplicates)?;
    if json {
        output.data(serde_json::to_string_pretty(&report)?);
    } else {
        output.data(render::render_validation(&report));
    }
    if report.failed() {
        return Err(Error::validation_error(format!(
            "{} problem(s) found",
            report.problem_count()
        )));
    }
    Ok(())
}
