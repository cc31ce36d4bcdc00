//! Error types for podcastgen.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PodcastError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    Configuration { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Document errors
    #[error("Failed to load document {path}: {message}")]
    Document { path: String, message: String },

    // Generation errors
    #[error("Generation failed ({context}): {message}")]
    GenerationFailure { context: String, message: String },

    // Speech synthesis errors
    #[error("Speech synthesis failed ({context}): {message}")]
    SynthesisFailure { context: String, message: String },

    // Audio assembly errors
    #[error("Background mixing failed: {message}")]
    Mixing { message: String },

    #[error("Timeline error: {message}")]
    Timeline { message: String },

    #[error("Audio file error: {message}")]
    AudioFile { message: String },

    // Run control
    #[error("Run cancelled: {reason}")]
    Cancelled { reason: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl PodcastError {
    pub fn configuration(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn generation(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::GenerationFailure {
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn synthesis(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SynthesisFailure {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Errors that stop the run before any generation happens.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ConfigFileNotFound { .. } | Self::Configuration { .. } | Self::Config(_)
        )
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, PodcastError>;
