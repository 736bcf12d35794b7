//! fopctl - feature model and variant build tool.
//!
//! Loads and saves FeatureIDE-style feature models, and builds variants by
//! driving the FeatureHouse composition engine over a directory of feature
//! modules.
//!
//! Every command prints one payload on stdout and exits with status 1 when
//! that payload is an error. Logs go to stderr.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::{error_payload, show::ShowTarget};
use fopctl::config::Config;

#[derive(Parser)]
#[command(name = "fopctl")]
#[command(about = "Feature model and variant build tool")]
#[command(
    after_help = "QUICK START:\n  fopctl preflight                               Check java and the engine jar\n  fopctl init-config model.xml config.xml        Select all mandatory features\n  fopctl build-variant config.xml features/ out/ Compose the variant"
)]
struct Cli {
    /// Directory holding .env and the default engine jar location
    #[arg(long, global = true, default_value = ".")]
    base_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a feature model as JSON
    LoadModel {
        path: PathBuf,
        /// Inline <subtree> references first
        #[arg(long)]
        expand: bool,
    },

    /// Replace the feature tree of a model with a JSON payload
    SaveModel {
        path: PathBuf,
        /// Node or {"status":"ok","root":...} JSON, or - for stdin
        json: String,
    },

    /// Compose the variant selected in a configuration
    BuildVariant {
        config: PathBuf,
        features_dir: PathBuf,
        output_dir: PathBuf,
    },

    /// Write a configuration selecting every mandatory feature
    InitConfig {
        model: PathBuf,
        config: PathBuf,
        /// Inline <subtree> references first
        #[arg(long)]
        expand: bool,
    },

    /// Show information
    Show {
        #[command(subcommand)]
        what: ShowCommand,
    },

    /// Run preflight checks (java, engine jar)
    Preflight {
        /// Fail if any checks fail (exit code 1)
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Subcommand)]
enum ShowCommand {
    /// Render a feature model as a tree
    Model {
        path: PathBuf,
        #[arg(long)]
        expand: bool,
    },
    /// Show current configuration
    Config,
}

/// Initialize tracing on stderr so stdout stays clean for payloads.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "fopctl=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::load(&cli.base_dir);

    let result = match cli.command {
        Commands::LoadModel { path, expand } => commands::cmd_load_model(&path, expand),
        Commands::SaveModel { path, json } => commands::cmd_save_model(&path, &json),
        Commands::BuildVariant {
            config: config_path,
            features_dir,
            output_dir,
        } => commands::cmd_build_variant(&config_path, &features_dir, &output_dir, &config),
        Commands::InitConfig {
            model,
            config: config_path,
            expand,
        } => commands::cmd_init_config(&model, &config_path, expand),
        Commands::Show { what } => {
            let target = match what {
                ShowCommand::Model { path, expand } => ShowTarget::Model { path, expand },
                ShowCommand::Config => ShowTarget::Config,
            };
            commands::cmd_show(target, &config)
        }
        Commands::Preflight { strict } => commands::cmd_preflight(&config, strict),
    };

    match result {
        Ok(output) => {
            println!("{}", output.render());
            if output.is_error() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            tracing::debug!("{:?}", e);
            println!("{}", error_payload(&e));
            ExitCode::FAILURE
        }
    }
}
