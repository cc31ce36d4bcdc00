//! Command-line interface for podcastgen
//!
//! Provides argument parsing using clap derive macros.

use crate::pipeline::StageFlags;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Turn a document into a multi-speaker audio podcast
#[derive(Parser, Debug)]
#[command(
    name = "podcastgen",
    version,
    about = "Turn a document into a multi-speaker audio podcast"
)]
pub struct Cli {
    /// Path to configuration file (default: ./podcastgen.toml, then ~/.config/podcastgen/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Source document (.pdf, .txt or .md)
    #[arg(long, value_name = "PATH")]
    pub pdf: Option<PathBuf>,

    /// Output directory for audio, subtitles and exports
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Number of topics to extract
    #[arg(long, value_name = "N")]
    pub topics: Option<usize>,

    /// Number of dialogue turns per topic
    #[arg(long, value_name = "N")]
    pub turns: Option<usize>,

    /// Podcast language code (a, b, j, h, p, z, i, f, e)
    #[arg(long, value_name = "CODE")]
    pub lang: Option<String>,

    /// Reuse the saved script instead of generating new content
    #[arg(long)]
    pub skip_content: bool,

    /// Keep the generated text untranslated
    #[arg(long)]
    pub skip_translation: bool,

    /// Stop after the text stages (no audio or subtitles)
    #[arg(long)]
    pub skip_audio: bool,

    /// Logging level (debug, info, warning, error, critical)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Also append logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Print the generated dialogue as it is produced
    #[arg(short, long)]
    pub verbose: bool,

    /// Cancel the run after this long. Examples: 90s, 15m, 1h30m
    #[arg(long, value_name = "DURATION", value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    /// Ollama server URL (default: http://localhost:11434)
    #[arg(long, value_name = "URL")]
    pub ollama_url: Option<String>,

    /// OpenAI API key for openai/ models
    #[arg(long, value_name = "KEY")]
    pub openai_api_key: Option<String>,

    /// Anthropic API key for anthropic/ models
    #[arg(long, value_name = "KEY")]
    pub anthropic_api_key: Option<String>,

    /// Groq API key for groq/ models
    #[arg(long, value_name = "KEY")]
    pub groq_api_key: Option<String>,
}

impl Cli {
    pub fn stage_flags(&self) -> StageFlags {
        StageFlags {
            skip_content: self.skip_content,
            skip_translation: self.skip_translation,
            skip_audio: self.skip_audio,
        }
    }
}

/// Parse a timeout string.
///
/// Supports any duration format accepted by `humantime`; a bare number is
/// taken as seconds.
fn parse_timeout(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let duration = match s.parse::<u64>() {
        Ok(secs) => Duration::from_secs(secs),
        Err(_) => humantime::parse_duration(s).map_err(|e| e.to_string())?,
    };
    if duration.is_zero() {
        return Err("timeout must be greater than zero".to_string());
    }
    Ok(duration)
}
