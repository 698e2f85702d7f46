mod cmd_run;
mod paths;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

use triage_core::time_util::parse_timestamp;

#[derive(Parser)]
#[command(name = "triage", version, about = "Issue and pull request triage for maintainers")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score a fetched batch of issues and PRs and write the report artifacts
    Run {
        /// JSON array of raw issue records, relative to the repository root
        #[arg(long)]
        issues: PathBuf,
        /// JSON array of raw pull request records, relative to the repository root
        #[arg(long)]
        prs: PathBuf,
        /// Config file (default: .github/maintainer/config.json)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Repository root (default: current directory)
        #[arg(long)]
        repo_root: Option<PathBuf>,
        /// Evaluation time, RFC 3339 (default: now)
        #[arg(long)]
        as_of: Option<String>,
        /// Report folder name (default: derived from the evaluation time)
        #[arg(long)]
        datetime: Option<String>,
        /// Compare against the previous run
        #[arg(long)]
        delta: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TRIAGE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.cmd {
        Command::Run {
            issues,
            prs,
            config,
            repo_root,
            as_of,
            datetime,
            delta,
        } => {
            let repo_root = match repo_root {
                Some(root) => root,
                None => std::env::current_dir()?,
            };
            let as_of = match as_of {
                Some(ts) => parse_timestamp(&ts, || "--as-of".into())?,
                None => OffsetDateTime::now_utc(),
            };
            let opts = cmd_run::RunOptions {
                issues,
                prs,
                config,
                as_of,
                datetime,
                delta,
            };
            cmd_run::execute(&repo_root, &opts)
        }
    }
}
