use anyhow::{Context, Result};
use clap::Parser;
use owo_colors::OwoColorize;
use podcastgen::PodcastError;
use podcastgen::app::{exit_code, load_config, run_control, run_podcast};
use podcastgen::cli::Cli;
use podcastgen::logging::init_logging;
use std::process::ExitCode;
use std::sync::atomic::Ordering;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "Error:".red().bold(), err);
            let code = err.downcast_ref::<PodcastError>().map_or(2, exit_code);
            ExitCode::from(code)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli).context("failed to load configuration")?;
    init_logging(&config.logging.level, config.logging.file.as_deref())?;
    tracing::info!(version = %podcastgen::version_string(), "podcastgen starting");

    let control = run_control(&config);
    let flag = control.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "Interrupted, stopping after the current call...".yellow());
            flag.store(true, Ordering::SeqCst);
        }
    });

    run_podcast(config, &cli, control).await?;
    Ok(())
}
