use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "intake")]
#[command(version, about = "Human-in-the-loop form intake orchestrator")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Correction attempts allowed per section before a forced reset.
    /// Overrides the intake.toml setting.
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize an intake project (.intake/ directory)
    Init,
    /// List the form specs available to this project
    Forms,
    /// Start a new session for a form (path or form name)
    Start { form: String },
    /// Resume a suspended session
    Resume { session: String },
    /// List all sessions
    Sessions,
    /// Show per-section status for a session
    Status { session: String },
    /// Print the final summary of a completed session
    Summary { session: String },
    /// Delete a session and its snapshot
    Delete {
        session: String,
        #[arg(long)]
        force: bool,
    },
}

/// Route tracing output into `.intake/logs/` once a project exists;
/// before that, only an explicit `RUST_LOG` sends anything to stderr.
fn init_tracing(project_dir: &std::path::Path) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = intake::init::get_intake_dir(project_dir).join("logs");
    if log_dir.is_dir() {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("intake=info"));
        let appender = tracing_appender::rolling::daily(log_dir, "intake.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
        Some(guard)
    } else {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("intake=warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        None
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_dir = cli
        .project_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));

    // Keep the guard alive for the process lifetime so buffered log
    // lines flush on exit.
    let _log_guard = init_tracing(&project_dir);

    match &cli.command {
        Commands::Init => cmd::cmd_init(project_dir),
        Commands::Forms => cmd::cmd_forms(&cli, project_dir),
        Commands::Start { form } => cmd::cmd_start(&cli, form, project_dir).await,
        Commands::Resume { session } => cmd::cmd_resume(&cli, session, project_dir).await,
        Commands::Sessions => cmd::cmd_sessions(&cli, project_dir),
        Commands::Status { session } => cmd::cmd_status(&cli, session, project_dir),
        Commands::Summary { session } => cmd::cmd_summary(&cli, session, project_dir),
        Commands::Delete { session, force } => {
            cmd::cmd_delete(&cli, session, *force, project_dir)
        }
    }
}
