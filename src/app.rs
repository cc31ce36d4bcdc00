//! Podcast application entry point.
//!
//! Wires configuration, CLI overrides, generation clients and the speech
//! backend into a [`PodcastPipeline`] run.

use crate::cli::Cli;
use crate::config::{Config, TtsBackendKind};
use crate::error::{PodcastError, Result};
use crate::llm::GenerationClients;
use crate::output::{ConsoleObserver, print_summary};
use crate::pipeline::{PodcastPipeline, RunControl, RunReport};
use crate::tts::{HttpSpeechBackend, SilentBackend, SpeechBackend};
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

/// Exit status for a failed run: 1 when a stage failed, 2 for
/// configuration problems and anything unexpected.
pub fn exit_code(error: &PodcastError) -> u8 {
    match error {
        PodcastError::GenerationFailure { .. }
        | PodcastError::SynthesisFailure { .. }
        | PodcastError::Document { .. }
        | PodcastError::Timeline { .. }
        | PodcastError::Cancelled { .. } => 1,
        _ => 2,
    }
}

/// Resolve the config file, then apply environment and CLI overrides.
///
/// Priority order (highest first): CLI flags, environment variables,
/// config file, built-in defaults.
pub fn load_config(cli: &Cli) -> Result<Config> {
    let config = Config::resolve(cli.config.as_deref())?.with_env_overrides();
    Ok(apply_cli_overrides(config, cli))
}

pub fn apply_cli_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(path) = &cli.pdf {
        config.document_path = Some(path.clone());
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(n) = cli.topics {
        config.content.num_topics = n;
    }
    if let Some(n) = cli.turns {
        config.content.num_turns = n;
    }
    if let Some(lang) = &cli.lang {
        config.audio.lang = lang.clone();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(file) = &cli.log_file {
        config.logging.file = Some(file.clone());
    }
    if cli.verbose {
        config.logging.verbose = true;
    }
    if let Some(timeout) = cli.timeout {
        config.pipeline.timeout_secs = Some(timeout.as_secs().max(1));
    }
    if let Some(url) = &cli.ollama_url {
        config.providers.ollama_base_url = url.clone();
    }
    if let Some(key) = &cli.openai_api_key {
        config.providers.openai_api_key = Some(key.clone());
    }
    if let Some(key) = &cli.anthropic_api_key {
        config.providers.anthropic_api_key = Some(key.clone());
    }
    if let Some(key) = &cli.groq_api_key {
        config.providers.groq_api_key = Some(key.clone());
    }
    config
}

/// Speech backend selected by `[tts] backend`.
pub fn build_speech_backend(config: &Config) -> Result<Arc<dyn SpeechBackend>> {
    match config.tts.backend {
        TtsBackendKind::Http => {
            let backend = HttpSpeechBackend::new(
                &config.tts.base_url,
                &config.tts.model,
                config.tts.api_key.clone(),
                Duration::from_secs(config.tts.request_timeout_secs),
            )?;
            Ok(Arc::new(backend))
        }
        TtsBackendKind::Silent => {
            tracing::warn!("Using the silent speech backend; audio will contain no speech");
            Ok(Arc::new(SilentBackend::new(config.audio.sample_rate)))
        }
    }
}

/// Run control for `config`, with the configured timeout if any.
pub fn run_control(config: &Config) -> RunControl {
    match config.pipeline.timeout_secs {
        Some(secs) => RunControl::new().with_timeout(Duration::from_secs(secs)),
        None => RunControl::new(),
    }
}

/// Validate `config`, build collaborators and run the pipeline.
pub async fn run_podcast(config: Config, cli: &Cli, control: RunControl) -> Result<RunReport> {
    config.validate()?;

    let clients = GenerationClients::from_config(&config)?;
    let backend = build_speech_backend(&config)?;
    let observer = ConsoleObserver::new(config.logging.verbose, std::io::stderr().is_terminal());

    let report = PodcastPipeline::new(config, clients, backend)
        .with_flags(cli.stage_flags())
        .with_control(control)
        .with_observer(Arc::new(observer))
        .run()
        .await?;

    print_summary(&report);
    Ok(report)
}
