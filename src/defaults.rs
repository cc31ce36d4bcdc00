//! Default configuration constants for podcastgen.
//!
//! Shared between the configuration types and the stages that fall back
//! to them when a value is missing.

/// Sample rate of the rendered podcast in Hz.
///
/// Matches the native output rate of Kokoro voices, so the common case
/// needs no resampling.
pub const SAMPLE_RATE: u32 = 24000;

/// Number of topics extracted from the document.
pub const NUM_TOPICS: usize = 5;

/// Number of dialogue turns generated per topic.
pub const NUM_TURNS: usize = 6;

/// Characters of the document passed to the model as context.
pub const DOCUMENT_EXCERPT_CHARS: usize = 4000;

/// Maximum characters per text-to-speech request.
pub const CHUNK_SIZE: usize = 200;

/// Silence inserted between chunks of one segment.
pub const CHUNK_PAUSE_MS: u32 = 300;

/// Trailing silence after a topic announcement.
pub const PAUSE_AFTER_TOPIC_LABEL_MS: u32 = 1500;

/// Trailing silence after a dialogue turn.
pub const PAUSE_AFTER_TURN_MS: u32 = 700;

/// Trailing silence after the intro.
pub const PAUSE_AFTER_INTRO_MS: u32 = 1000;

/// Background crossfade length at phase boundaries.
pub const CROSSFADE_MS: u32 = 1000;

/// Fade-in / fade-out applied to the rendered mix.
pub const FADE_MS: u32 = 500;

/// Background level during the intro, in dB.
pub const BG_INTRO_VOLUME_DB: f32 = -12.0;

/// Background level under the dialogue, in dB.
pub const BG_CONTENT_VOLUME_DB: f32 = -20.0;

/// Background level during the outro, in dB.
pub const BG_OUTRO_VOLUME_DB: f32 = -12.0;

/// Default TTS language code (British English).
pub const DEFAULT_LANG: &str = "b";

/// Language the content stages write in.
pub const SOURCE_LANG: &str = "a";

/// Default model for every generation role.
pub const DEFAULT_MODEL: &str = "ollama/llama3.1:8b";

/// Default Ollama server.
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Default OpenAI-compatible TTS server (Kokoro-FastAPI).
pub const TTS_BASE_URL: &str = "http://localhost:8880/v1";

/// Per-request timeout for provider calls, in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Retries after a failed provider call before giving up.
pub const MAX_RETRIES: u32 = 3;

/// Topic chains processed concurrently.
pub const WORKERS: usize = 2;

/// Default configuration file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "podcastgen.toml";
