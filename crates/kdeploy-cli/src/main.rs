mod cmd;
mod output;
mod workdir;

use clap::{Parser, Subcommand};
use cmd::{cache::CacheSubcommand, run::RunArgs, run::RunExit};
use kdeploy_core::config::Settings;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "kdeploy",
    about = "Resolve kubectl and deploy, promote or reject Kubernetes manifests from a pipeline step",
    version,
    propagate_version = true
)]
struct Cli {
    /// Settings file (YAML)
    #[arg(long, global = true, env = "KDEPLOY_CONFIG")]
    config: Option<PathBuf>,

    /// Tool cache root (default: settings file, then ~/.kdeploy/tool-cache)
    #[arg(long, global = true, env = "RUNNER_TOOL_CACHE")]
    tool_cache: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve kubectl, validate the step inputs and run the requested action
    Run(RunArgs),

    /// Resolve kubectl only and print its path
    Resolve {
        /// kubectl version to use ("latest" resolves the stable release)
        #[arg(long = "kubectl-version", env = "INPUT_KUBECTL-VERSION")]
        kubectl_version: Option<String>,
    },

    /// Inspect and seed the kubectl tool cache
    Cache {
        #[command(subcommand)]
        subcommand: CacheSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let runner_debug = std::env::var("RUNNER_DEBUG").is_ok_and(|v| v == "1");
    let default_level = match &cli.command {
        _ if runner_debug => tracing::Level::DEBUG,
        Commands::Run(_) => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    // RUST_LOG, when set, replaces the default level entirely.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(default_level.into()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = Settings::load(cli.config.as_deref())
        .map_err(anyhow::Error::from)
        .and_then(|settings| {
            let tool_cache = cli.tool_cache.as_deref();
            match cli.command {
                Commands::Run(args) => cmd::run::run(args, &settings, tool_cache, cli.json),
                Commands::Resolve { kubectl_version } => cmd::resolve::run(
                    kubectl_version.as_deref(),
                    &settings,
                    tool_cache,
                    cli.json,
                ),
                Commands::Cache { subcommand } => {
                    cmd::cache::run(subcommand, &settings, tool_cache, cli.json)
                }
            }
        });

    if let Err(e) = result {
        // Reported failures were already written as workflow commands.
        if let Some(exit) = e.downcast_ref::<RunExit>() {
            std::process::exit(exit.exit_code());
        }
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
