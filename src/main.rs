use clap::Parser;
use pdp_cli::cli::commands::{config, project as project_cmd, sync};
use pdp_cli::cli::errors::print_error_with_json;
use pdp_cli::cli::tracing_init::init_tracing;
use pdp_cli::cli::{Cli, Commands, ConfigCommands};
use pdp_cli::deploy::DeployOptions;
use pdp_cli::error::Error;
use pdp_cli::output::Output;
use pdp_cli::project::Project;
use pdp_cli::validate::Severity;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_errors = cli.json_errors;
    init_tracing(cli.verbosity);

    if let Err(e) = run_command(cli).await {
        print_error_with_json(&e, json_errors);
        std::process::exit(1);
    }
}

async fn run_command(cli: Cli) -> Result<(), Error> {
    let output = Output::new(cli.quiet, cli.json_errors);
    let project = Project::new(cli.project_dir());
    let products = cli.selected_products();

    match cli.command {
        Commands::Init { force } => project_cmd::init(&project, force, &output),
        Commands::Export { keep_volatile } => {
            sync::export(&project, &products, &cli.urls, keep_volatile, &output).await
        }
        Commands::Deploy {
            ignore_ids,
            no_write_back,
            dry_run,
        } => {
            let options = DeployOptions {
                ignore_ids,
                write_back: !no_write_back,
                dry_run,
                duplicates: Severity::Error,
            };
            sync::deploy(&project, &products, &cli.urls, options, &output).await
        }
        Commands::Validate { json } => project_cmd::validate(&project, &products, json, &output),
        Commands::Plan { json } => project_cmd::plan(&products, json, &output),
        Commands::Config { command } => match command {
            ConfigCommands::Set { key, value } => {
                config::set_setting(&project, &key, &value, &output)
            }
            ConfigCommands::Get { key, json } => config::get_setting(&project, &key, json, &output),
            ConfigCommands::List { json } => {
                let settings = project.config_manager().list_settings()?;
                config::print_settings_list(settings, json, &output)
            }
        },
    }
}
