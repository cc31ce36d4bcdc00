//! podcastgen - Turn documents into multi-speaker audio podcasts
//!
//! Topics → dialogue → optional translation → speech → one timed audio
//! timeline with background music, subtitles and a JSON export.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod content;
pub mod defaults;
pub mod document;
pub mod error;
pub mod llm;
pub mod logging;
#[cfg(feature = "cli")]
pub mod output;
pub mod pipeline;
pub mod timeline;
pub mod tts;

// Composition root - needs everything
#[cfg(feature = "cli")]
pub mod app;

// Core traits (generate → speak → assemble)
pub use llm::{GenerationClient, GenerationClients, MockGenerationClient};
pub use tts::{SilentBackend, SpeechBackend};

// Pipeline
pub use pipeline::{PodcastPipeline, RunControl, RunObserver, RunReport, StageFlags};

// Error handling
pub use error::{PodcastError, Result};

// Config
pub use config::{Config, SynthesisFailurePolicy};

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
