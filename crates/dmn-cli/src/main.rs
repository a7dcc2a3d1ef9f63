use anyhow::Context;
use clap::{Parser, Subcommand};
use dmn_core::DmnConfig;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "dmn", version, about = "Decision audit and history job tools")]
struct Cli {
    /// Path to dmn.yaml. Defaults apply when omitted.
    #[arg(long, global = true, env = "DMN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a human-readable summary of a stored decision audit.
    Inspect {
        /// Path to the audit JSON file
        file: PathBuf,
    },

    /// Replay an evaluation trace through the audit recorder and print the audit.
    Record {
        /// Path to the trace JSON file
        file: PathBuf,

        /// Write the audit here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Indent the JSON output
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },

    /// Return expired history jobs to the pool.
    ResetExpiredJobs {
        /// JSON Lines file holding the history jobs
        #[arg(long)]
        store: PathBuf,

        /// Also reset every job whose claim has already expired
        #[arg(long, default_value_t = false)]
        expired: bool,

        /// Job IDs to reset
        job_ids: Vec<String>,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<DmnConfig> {
    match path {
        Some(path) => DmnConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(DmnConfig::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.cmd {
        Command::Inspect { file } => commands::inspect::run(&file)?,

        Command::Record {
            file,
            output,
            pretty,
        } => commands::record::run(&config, &file, output.as_deref(), pretty)?,

        Command::ResetExpiredJobs {
            store,
            expired,
            job_ids,
        } => commands::reset_jobs::run(&config, &store, expired, job_ids).await?,
    }

    Ok(())
}
