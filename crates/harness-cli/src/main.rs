mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "harness",
    about = "Inspect the health, task board and usage of an assistant project configuration",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .claude/ or .git/)
    #[arg(long, global = true, env = "HARNESS_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score the configuration and suggest fixes
    Health,

    /// Show the task board parsed from Plans.md
    Plans {
        /// Workflow mode: solo or 2agent (default: from config)
        #[arg(long)]
        mode: Option<String>,
    },

    /// Rank usage and list cleanup candidates
    Usage,

    /// Optimization insights, optionally with a generated narrative
    Insights {
        /// Ask the configured narrative command for a summary
        #[arg(long)]
        narrative: bool,
    },

    /// List skills with token cost and usage
    Skills,

    /// List memory notes and likely duplicates
    Notes,

    /// List rules and their initial-load cost
    Rules,

    /// List configured hooks
    Hooks,

    /// Show, validate or initialize .claude/harness.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Serve the JSON API
    Serve {
        /// Port to listen on (0 = OS-assigned)
        #[arg(long, default_value_t = cmd::serve::DEFAULT_PORT)]
        port: u16,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Health => cmd::health::run(&root, cli.json),
        Commands::Plans { mode } => cmd::plans::run(&root, mode.as_deref(), cli.json),
        Commands::Usage => cmd::usage::run(&root, cli.json),
        Commands::Insights { narrative } => cmd::insights::run(&root, narrative, cli.json),
        Commands::Skills => cmd::artifacts::skills(&root, cli.json),
        Commands::Notes => cmd::artifacts::notes(&root, cli.json),
        Commands::Rules => cmd::artifacts::rules(&root, cli.json),
        Commands::Hooks => cmd::artifacts::hooks(&root, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Serve { port } => cmd::serve::run(&root, port),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
