mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{actions::ActionsSubcommand, config::ConfigSubcommand, run::RunArgs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "standsim",
    about = "Per-stand growth simulation batches with management actions and result joins",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .standsim/)
    #[arg(long, global = true, env = "STANDSIM_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize standsim in the current project
    Init,

    /// Validate the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// List the output fields that can be joined onto stands
    Fields,

    /// Author and inspect management action plans
    Actions {
        #[command(subcommand)]
        subcommand: ActionsSubcommand,
    },

    /// Print the keyword block a plan encodes to
    Encode {
        /// Management plan file (YAML)
        #[arg(long)]
        plan: PathBuf,
    },

    /// Print the job script for a single stand
    Script {
        /// Stand identifier
        #[arg(long)]
        stand: String,
        /// Input simulation database
        #[arg(long)]
        db: PathBuf,
        /// Number of years to simulate
        #[arg(long)]
        years: u32,
        /// Management plan file (YAML)
        #[arg(long)]
        plan: Option<PathBuf>,
    },

    /// Simulate every stand, join results and run an optional assessment
    Run(RunArgs),
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run(_) => tracing::Level::INFO,
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
        Commands::Init => cmd::init::run(&root),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Fields => cmd::fields::run(cli.json),
        Commands::Actions { subcommand } => cmd::actions::run(subcommand, cli.json),
        Commands::Encode { plan } => cmd::encode::run(&plan, cli.json),
        Commands::Script {
            stand,
            db,
            years,
            plan,
        } => cmd::script::run(&root, &stand, &db, years, plan.as_deref()),
        Commands::Run(args) => cmd::run::run(&root, args, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
