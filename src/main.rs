use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fashion_shorts::config::Config;
use fashion_shorts::pipeline::Agent;
use fashion_shorts::scheduler::{self, Schedule};
use fashion_shorts::{init, init_tracing};

#[derive(Parser)]
#[command(name = "fashion-shorts", about = "Trend-driven fashion shorts, generated and published daily")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Run on the built-in schedule until interrupted (default).
    Run,
    /// Run one full cycle immediately.
    Test,
    /// Refresh engagement stats, then print the report.
    Analytics,
    /// Print the performance report.
    Report,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = Config::from_env().context("invalid configuration")?;
    init_tracing(&cfg.log_level);

    init::ensure_directories(&cfg).await?;
    if !init::check_ffmpeg().await {
        tracing::warn!("ffmpeg/ffprobe not found in PATH; video assembly will fail");
    }

    let agent = Agent::from_config(&cfg).await?;
    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            tracing::info!("starting scheduled agent (daily at 06:00)");
            scheduler::run(&agent, Schedule::default()).await?;
        }
        Command::Test => {
            let summary = agent.run_cycle().await?;
            tracing::info!(
                run_id = %summary.run_id,
                videos = summary.videos_created,
                uploads_ok = summary.uploads_succeeded,
                uploads_failed = summary.uploads_failed,
                "test cycle finished"
            );
        }
        Command::Analytics => {
            agent.update_analytics().await?;
            agent.report().await?;
        }
        Command::Report => {
            agent.report().await?;
        }
    }
    Ok(())
}
