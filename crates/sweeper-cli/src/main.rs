use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info, warn};

use sweeper_core::config::{self, Config};
use sweeper_core::Purger;

mod logging;

use logging::{LogLevel, init_logging};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Delete every GitHub Actions artifact of a repository",
    long_about = "Delete every GitHub Actions artifact of a repository.\n\n\
                  Reads DA_TOKEN, DA_REPO and optionally DA_MAX_WORKERS, DA_API_BASE and \
                  DA_TIMEOUT_SECS from the environment or a .env file."
)]
struct Args {
    /// Load variables from this file instead of ./.env
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// List the artifacts that would be deleted, but don't delete them
    #[arg(long)]
    dry_run: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level)?;

    config::load_dotenv(args.env_file.as_deref()).context("failed to load env file")?;

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "invalid configuration");
            return Err(err).context("configuration error");
        }
    };

    let purger = Purger::github(&config)?.with_dry_run(args.dry_run);

    // Ctrl-C で新しい削除の dispatch を止める（実行中のものは待つ）
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, finishing in-flight deletes");
            let _ = shutdown_tx.send(true);
        }
    });

    let summary = purger.run_until(shutdown_rx).await;

    if !summary.report.failed.is_empty() {
        warn!(
            failed = summary.report.failed.len(),
            "some artifacts could not be deleted"
        );
    }
    if summary.found > 0 && !summary.dry_run {
        info!(
            deleted = summary.report.deleted,
            failed = summary.report.failed.len(),
            skipped = summary.report.skipped.len(),
            "done"
        );
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}
