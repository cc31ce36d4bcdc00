use crate::content::language;
use crate::content::types::Speaker;
use crate::defaults;
use crate::error::{PodcastError, Result};
use crate::llm::provider::ProviderSpec;
use crate::timeline::subtitles::SubtitleFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Source document (`.pdf`, `.txt` or `.md`)
    pub document_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub content: ContentConfig,
    pub models: ModelsConfig,
    pub providers: ProvidersConfig,
    pub audio: AudioConfig,
    pub tts: TtsConfig,
    pub pipeline: PipelineSettings,
    pub logging: LoggingConfig,
}

/// Dialogue shape
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContentConfig {
    pub num_topics: usize,
    pub num_turns: usize,
    /// Speaker rotation, cycled turn by turn
    pub roles: Vec<Speaker>,
    pub document_excerpt_chars: usize,
}

/// Model per generation role, as `"<provider>/<model>"`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelsConfig {
    pub topic_generator: String,
    pub moderator: String,
    pub host: String,
    pub guest: String,
    pub intro_generator: String,
    pub outro_generator: String,
    /// Title and description; falls back to `topic_generator`
    pub metadata_generator: Option<String>,
    pub translator: String,
}

/// Provider endpoints and credentials
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProvidersConfig {
    pub ollama_base_url: String,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
}

/// Speech, mixing and subtitle configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    /// Target language code (see `content::language`)
    pub lang: String,
    /// Language the content stages write in
    pub source_lang: String,
    pub host_voice: String,
    pub moderator_voice: String,
    pub guest_voice: String,
    /// Maximum characters per TTS request
    pub chunk_size: usize,
    pub sample_rate: u32,
    pub output_file: String,
    /// Background music (WAV)
    pub music_path: Option<PathBuf>,
    pub vocal_volume: f32,
    pub bg_intro_volume: f32,
    pub bg_content_volume: f32,
    pub bg_outro_volume: f32,
    pub crossfade_ms: u32,
    pub fade_ms: u32,
    pub pause_after_intro_ms: u32,
    pub pause_after_topic_label_ms: u32,
    pub pause_after_turn_ms: u32,
    pub generate_subtitles: bool,
    pub subtitle_format: SubtitleFormat,
}

/// Text-to-speech backend selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TtsConfig {
    pub backend: TtsBackendKind,
    /// OpenAI-compatible speech endpoint root (e.g. Kokoro-FastAPI)
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
}

/// Text-to-speech backend enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TtsBackendKind {
    /// OpenAI-compatible `/audio/speech` server
    Http,
    /// Silence sized to the text; for dry runs
    Silent,
}

/// Orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineSettings {
    /// Topic chains processed concurrently
    pub workers: usize,
    pub synthesis_failure: SynthesisFailurePolicy,
    pub export_json: bool,
    /// Whole-run deadline in seconds
    #[serde(alias = "timeout")]
    pub timeout_secs: Option<u64>,
}

/// What to do when one segment cannot be synthesized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisFailurePolicy {
    /// Abort the run
    Abort,
    /// Drop the segment and record a gap in the timeline
    Skip,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
    /// Print the generated dialogue as it is written
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            document_path: None,
            output_dir: PathBuf::from("output"),
            content: ContentConfig::default(),
            models: ModelsConfig::default(),
            providers: ProvidersConfig::default(),
            audio: AudioConfig::default(),
            tts: TtsConfig::default(),
            pipeline: PipelineSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            num_topics: defaults::NUM_TOPICS,
            num_turns: defaults::NUM_TURNS,
            roles: vec![Speaker::Moderator, Speaker::Guest],
            document_excerpt_chars: defaults::DOCUMENT_EXCERPT_CHARS,
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            topic_generator: "ollama/qwen2.5:14b".to_string(),
            moderator: defaults::DEFAULT_MODEL.to_string(),
            host: defaults::DEFAULT_MODEL.to_string(),
            guest: defaults::DEFAULT_MODEL.to_string(),
            intro_generator: "ollama/qwen2.5:14b".to_string(),
            outro_generator: defaults::DEFAULT_MODEL.to_string(),
            metadata_generator: None,
            translator: "ollama/qwen2.5:14b".to_string(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            ollama_base_url: defaults::OLLAMA_BASE_URL.to_string(),
            openai_api_key: None,
            anthropic_api_key: None,
            groq_api_key: None,
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
            max_retries: defaults::MAX_RETRIES,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            lang: defaults::DEFAULT_LANG.to_string(),
            source_lang: defaults::SOURCE_LANG.to_string(),
            host_voice: "bf_emma".to_string(),
            moderator_voice: "bf_isabella".to_string(),
            guest_voice: "bm_george".to_string(),
            chunk_size: defaults::CHUNK_SIZE,
            sample_rate: defaults::SAMPLE_RATE,
            output_file: "podcast.wav".to_string(),
            music_path: None,
            vocal_volume: 0.0,
            bg_intro_volume: defaults::BG_INTRO_VOLUME_DB,
            bg_content_volume: defaults::BG_CONTENT_VOLUME_DB,
            bg_outro_volume: defaults::BG_OUTRO_VOLUME_DB,
            crossfade_ms: defaults::CROSSFADE_MS,
            fade_ms: defaults::FADE_MS,
            pause_after_intro_ms: defaults::PAUSE_AFTER_INTRO_MS,
            pause_after_topic_label_ms: defaults::PAUSE_AFTER_TOPIC_LABEL_MS,
            pause_after_turn_ms: defaults::PAUSE_AFTER_TURN_MS,
            generate_subtitles: false,
            subtitle_format: SubtitleFormat::Srt,
        }
    }
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            backend: TtsBackendKind::Http,
            base_url: defaults::TTS_BASE_URL.to_string(),
            model: "kokoro".to_string(),
            api_key: None,
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            workers: defaults::WORKERS,
            synthesis_failure: SynthesisFailurePolicy::Abort,
            export_json: true,
            timeout_secs: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file is missing or contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PodcastError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                PodcastError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(PodcastError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Resolve the configuration to use.
    ///
    /// An explicit path must exist. Without one, `./podcastgen.toml` and
    /// then the per-user config file are tried before falling back to
    /// defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let local = PathBuf::from(defaults::CONFIG_FILE_NAME);
        if local.exists() {
            return Self::load(&local);
        }
        match Self::default_path() {
            Some(path) => Self::load_or_default(&path),
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - PODCASTGEN_OUTPUT_DIR → output_dir
    /// - PODCASTGEN_LANG → audio.lang
    /// - PODCASTGEN_OLLAMA_URL → providers.ollama_base_url
    /// - OPENAI_API_KEY / ANTHROPIC_API_KEY / GROQ_API_KEY → provider keys
    ///   (only when the file leaves them unset)
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("PODCASTGEN_OUTPUT_DIR")
            && !dir.is_empty()
        {
            self.output_dir = PathBuf::from(dir);
        }

        if let Ok(lang) = std::env::var("PODCASTGEN_LANG")
            && !lang.is_empty()
        {
            self.audio.lang = lang;
        }

        if let Ok(url) = std::env::var("PODCASTGEN_OLLAMA_URL")
            && !url.is_empty()
        {
            self.providers.ollama_base_url = url;
        }

        fill_from_env(&mut self.providers.openai_api_key, "OPENAI_API_KEY");
        fill_from_env(&mut self.providers.anthropic_api_key, "ANTHROPIC_API_KEY");
        fill_from_env(&mut self.providers.groq_api_key, "GROQ_API_KEY");

        self
    }

    /// Check everything that can be checked before the first model call.
    pub fn validate(&self) -> Result<()> {
        if self.content.num_topics == 0 {
            return Err(PodcastError::configuration(
                "content.num_topics",
                "must be at least 1",
            ));
        }
        if self.content.num_turns == 0 {
            return Err(PodcastError::configuration(
                "content.num_turns",
                "must be at least 1",
            ));
        }
        if self.content.roles.is_empty() {
            return Err(PodcastError::configuration(
                "content.roles",
                "at least one speaker role is required",
            ));
        }
        if self.pipeline.workers == 0 {
            return Err(PodcastError::configuration(
                "pipeline.workers",
                "must be at least 1",
            ));
        }

        for (key, value) in self.models.entries() {
            ProviderSpec::parse(key, value)?;
        }

        if language::language_name(&self.audio.lang).is_none() {
            return Err(PodcastError::configuration(
                "audio.lang",
                format!(
                    "unknown language code '{}' (expected one of: {})",
                    self.audio.lang,
                    language::supported_codes().join(", ")
                ),
            ));
        }
        for (key, voice) in [
            ("audio.host_voice", &self.audio.host_voice),
            ("audio.moderator_voice", &self.audio.moderator_voice),
            ("audio.guest_voice", &self.audio.guest_voice),
        ] {
            if voice.trim().is_empty() {
                return Err(PodcastError::configuration(key, "voice is not set"));
            }
            if !language::voice_matches_language(voice, &self.audio.lang) {
                tracing::warn!(
                    key,
                    voice = %voice,
                    lang = %self.audio.lang,
                    "Voice name does not follow the naming scheme of the target language"
                );
            }
        }
        if self.audio.chunk_size == 0 {
            return Err(PodcastError::configuration(
                "audio.chunk_size",
                "must be at least 1",
            ));
        }
        if self.audio.sample_rate == 0 {
            return Err(PodcastError::configuration(
                "audio.sample_rate",
                "must be positive",
            ));
        }
        for (key, db) in [
            ("audio.vocal_volume", self.audio.vocal_volume),
            ("audio.bg_intro_volume", self.audio.bg_intro_volume),
            ("audio.bg_content_volume", self.audio.bg_content_volume),
            ("audio.bg_outro_volume", self.audio.bg_outro_volume),
        ] {
            if !db.is_finite() {
                return Err(PodcastError::configuration(key, "must be a finite dB value"));
            }
        }
        if let Some(music) = &self.audio.music_path
            && !music.is_file()
        {
            return Err(PodcastError::configuration(
                "audio.music_path",
                format!("file not found: {}", music.display()),
            ));
        }
        if let Some(doc) = &self.document_path
            && !doc.is_file()
        {
            return Err(PodcastError::configuration(
                "document_path",
                format!("file not found: {}", doc.display()),
            ));
        }
        Ok(())
    }

    /// Get the per-user configuration file path
    ///
    /// Returns ~/.config/podcastgen/config.toml on Linux
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("podcastgen").join("config.toml"))
    }
}

impl ModelsConfig {
    /// `(config key, model string)` for every generation role.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("models.topic_generator", self.topic_generator.as_str()),
            ("models.moderator", self.moderator.as_str()),
            ("models.host", self.host.as_str()),
            ("models.guest", self.guest.as_str()),
            ("models.intro_generator", self.intro_generator.as_str()),
            ("models.outro_generator", self.outro_generator.as_str()),
            (
                "models.metadata_generator",
                self.metadata_generator
                    .as_deref()
                    .unwrap_or(self.topic_generator.as_str()),
            ),
            ("models.translator", self.translator.as_str()),
        ]
    }
}

fn fill_from_env(slot: &mut Option<String>, var: &str) {
    if slot.as_deref().is_none_or(str::is_empty)
        && let Ok(value) = std::env::var(var)
        && !value.is_empty()
    {
        *slot = Some(value);
    }
}
