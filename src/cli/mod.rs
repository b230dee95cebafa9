pub mod commands;
pub mod errors;
pub mod render;
pub mod tracing_init;

use crate::constants;
use crate::entity::Product;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "pdp: export and deploy content platform configuration",
    long_about = "pdp moves entity configuration (credentials, processors, pipelines, seeds,\n\
                  schedulers, endpoints) between platform environments.\n\n\
                  Export stores entities as JSON files in a project directory, replacing\n\
                  IDs with portable {{ fromName('...') }} references. Deploy resolves\n\
                  those references against the target environment and creates or\n\
                  updates the entities in dependency order.\n\n\
                  Examples:\n  \
                  pdp init\n  \
                  pdp --product ingestion export\n  \
                  pdp validate\n  \
                  pdp deploy --dry-run\n  \
                  pdp config set products.discovery.url https://search.example.com"
)]
pub struct Cli {
    /// Project directory holding pdp.toml and the entity files
    #[arg(
        long,
        short = 'p',
        global = true,
        env = constants::ENV_PDP_PROJECT,
        default_value = constants::DEFAULT_PROJECT_DIR,
        value_name = "DIR",
        help = "Project directory (default: current directory)"
    )]
    pub project: String,

    /// Restrict the run to these products; repeat for several
    #[arg(
        long = "product",
        global = true,
        value_enum,
        value_name = "PRODUCT",
        help = "Only process this product (repeatable; default: all)"
    )]
    pub products: Vec<Product>,

    /// Per-product base URL, ahead of the environment and pdp.toml
    #[arg(
        long = "url",
        global = true,
        value_name = "PRODUCT=URL",
        value_parser = parse_url_override,
        help = "Override a product's API URL (repeatable)"
    )]
    pub urls: Vec<(Product, String)>,

    /// Output all errors as structured JSON to stderr
    #[arg(long, global = true, help = "Output errors in JSON format")]
    pub json_errors: bool,

    /// Suppress non-essential output (summaries, tips)
    #[arg(
        long,
        short = 'q',
        global = true,
        help = "Suppress informational output"
    )]
    pub quiet: bool,

    /// Increase logging verbosity
    #[arg(
        short = 'v',
        global = true,
        action = ArgAction::Count,
        help = "Increase logging verbosity (-v for debug, -vv for trace)"
    )]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// The project directory with `~` and environment variables expanded.
    #[must_use]
    pub fn project_dir(&self) -> PathBuf {
        crate::fs::expand_path(&self.project)
    }

    /// Products selected with `--product`, or all of them.
    #[must_use]
    pub fn selected_products(&self) -> Vec<Product> {
        if self.products.is_empty() {
            return Product::ALL.to_vec();
        }
        let mut selected = self.products.clone();
        selected.sort_unstable();
        selected.dedup();
        selected
    }
}

/// Parses `discovery=http://search:8088` into its product and URL.
fn parse_url_override(raw: &str) -> Result<(Product, String), String> {
    let (product, url) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected PRODUCT=URL, got '{raw}'"))?;
    let product: Product = product.trim().parse().map_err(|e: crate::error::Error| e.to_string())?;
    let url = url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(format!("'{url}' is not an http(s) URL"));
    }
    Ok((product, url.to_string()))
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a project with default settings and empty entity files
    #[command(long_about = "Create pdp.toml and one empty JSON file per entity type.\n\n\
                      Existing entity files are never overwritten.\n\n\
                      Examples:\n  \
                      pdp init\n  \
                      pdp -p ~/platform/prod init --force")]
    Init {
        /// Rewrite an existing pdp.toml with defaults
        #[arg(long, help = "Overwrite an existing pdp.toml")]
        force: bool,
    },
    /// Fetch entities and store them with name references
    #[command(long_about = "Fetch every entity of the selected products and write them to the\n\
                      project, replacing known IDs in reference fields with\n\
                      {{ fromName('...') }} tokens.\n\n\
                      Examples:\n  \
                      pdp export\n  \
                      pdp --product discovery export --keep-volatile")]
    Export {
        /// Keep server-managed timestamps in the files
        #[arg(long, help = "Keep creationTimestamp and lastUpdatedTimestamp")]
        keep_volatile: bool,
    },
    /// Resolve name references and create or update entities
    #[command(long_about = "Deploy the project's entities in dependency order.\n\n\
                      An entity with an id is updated (created when the server does not\n\
                      know the id); one without is created. Assigned ids are written back\n\
                      to the project files unless --no-write-back is given.\n\n\
                      Examples:\n  \
                      pdp deploy --dry-run\n  \
                      pdp --product ingestion deploy --ignore-ids")]
    Deploy {
        /// Create every entity, ignoring local ids
        #[arg(long, help = "Ignore local ids and create every entity")]
        ignore_ids: bool,
        /// Leave the project files untouched
        #[arg(long, help = "Do not write assigned ids back to the project")]
        no_write_back: bool,
        /// Resolve and print the payloads without calling any API
        #[arg(long, help = "Show resolved payloads without sending them")]
        dry_run: bool,
    },
    /// Check the project offline
    #[command(long_about = "Check the selected entity files without contacting any server:\n\
                      JSON structure, reference token syntax, duplicate ids and names,\n\
                      and references no deploy could resolve.")]
    Validate {
        /// Output the report as JSON
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Show the order in which entity types are deployed
    Plan {
        /// Output the plan as JSON
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Read and change project settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Set a project setting
    #[command(long_about = "Set a setting in the project's pdp.toml.\n\n\
                      Available settings:\n  \
                      timeout_secs                (integer)  - Request timeout\n  \
                      page_size                   (integer)  - Entities per page when listing\n  \
                      products.<product>.url      (url)      - Product API base URL\n  \
                      policy.duplicates           (severity) - error | warning\n  \
                      policy.missing_mappings     (severity) - error | warning\n\n\
                      Examples:\n  \
                      pdp config set timeout_secs 60\n  \
                      pdp config set products.core.url https://core.example.com\n  \
                      pdp config set policy.duplicates warning")]
    Set {
        /// Setting key (use `config list` to see all available keys)
        key: String,
        /// Value to set (validated against expected type)
        value: String,
    },
    /// Get a project setting
    Get {
        /// Setting key to retrieve
        key: String,
        /// Output as JSON
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// List all settings with their current values
    List {
        /// Output as JSON
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_override_parses_product_and_url() {
        assert_eq!(
            parse_url_override("Discovery=https://search.example.com/"),
            Ok((Product::Discovery, "https://search.example.com/".to_string()))
        );
    }

    #[test]
    fn test_url_override_rejects_malformed_values() {
        assert!(parse_url_override("discovery").is_err());
        assert!(parse_url_override("billing=http://x").is_err());
        assert!(parse_url_override("core=localhost:8081").is_err());
    }

    #[test]
    fn test_url_flag_is_repeatable() {
        let cli = Cli::try_parse_from([
            "pdp",
            "--url",
            "core=http://core:1",
            "--url",
            "ingestion=http://ing:2",
            "plan",
        ])
        .unwrap();
        assert_eq!(
            cli.urls,
            vec![
                (Product::Core, "http://core:1".to_string()),
                (Product::Ingestion, "http://ing:2".to_string()),
            ]
        );
    }
}
