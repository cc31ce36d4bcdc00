use crate::audio::MonoAudio;
use crate::error::{PodcastError, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Text-to-speech engine.
///
/// Returns mono audio at whatever rate the engine produces; the
/// synthesizer resamples it to the pipeline rate.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    async fn speak(&self, text: &str, voice: &str, lang: &str) -> Result<MonoAudio>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// Implement SpeechBackend for Arc<T> to allow sharing one backend.
#[async_trait]
impl<T: SpeechBackend + ?Sized> SpeechBackend for Arc<T> {
    async fn speak(&self, text: &str, voice: &str, lang: &str) -> Result<MonoAudio> {
        (**self).speak(text, voice, lang).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Backend that renders silence sized to the text.
///
/// Used for dry runs (`tts.backend = "silent"`) and in tests, where a fixed
/// duration makes timelines predictable.
pub struct SilentBackend {
    sample_rate: u32,
    seconds_per_word: f64,
    fixed_seconds: Option<f64>,
    fail_on: Vec<String>,
    calls: Mutex<Vec<(String, String, String)>>,
}

impl SilentBackend {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            seconds_per_word: 0.35,
            fixed_seconds: None,
            fail_on: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every request returns exactly `seconds` of audio.
    pub fn with_fixed_duration(mut self, seconds: f64) -> Self {
        self.fixed_seconds = Some(seconds);
        self
    }

    pub fn with_seconds_per_word(mut self, seconds: f64) -> Self {
        self.seconds_per_word = seconds;
        self
    }

    /// Fail any request whose text contains `needle`.
    pub fn with_failure_on(mut self, needle: &str) -> Self {
        self.fail_on.push(needle.to_string());
        self
    }

    /// Every `(text, voice, lang)` received so far.
    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SpeechBackend for SilentBackend {
    async fn speak(&self, text: &str, voice: &str, lang: &str) -> Result<MonoAudio> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((text.to_string(), voice.to_string(), lang.to_string()));
        }

        if let Some(needle) = self.fail_on.iter().find(|n| text.contains(n.as_str())) {
            return Err(PodcastError::synthesis(
                "silent backend",
                format!("configured to fail on '{needle}'"),
            ));
        }

        let seconds = self
            .fixed_seconds
            .unwrap_or_else(|| text.split_whitespace().count() as f64 * self.seconds_per_word);
        let len = (seconds * self.sample_rate as f64).round() as usize;
        Ok(MonoAudio {
            samples: vec![0.0; len],
            sample_rate: self.sample_rate,
        })
    }

    fn name(&self) -> &str {
        "silent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duration_scales_with_words() {
        let backend = SilentBackend::new(1000).with_seconds_per_word(0.5);
        let audio = backend.speak("one two three four", "bf_emma", "b").await.unwrap();
        assert_eq!(audio.samples.len(), 2000);
        assert_eq!(audio.sample_rate, 1000);
    }

    #[tokio::test]
    async fn fixed_duration_ignores_text() {
        let backend = SilentBackend::new(24000).with_fixed_duration(6.0);
        let audio = backend.speak("hi", "v", "b").await.unwrap();
        assert_eq!(audio.duration_seconds(), 6.0);
    }

    #[tokio::test]
    async fn failure_on_matching_text() {
        let backend = SilentBackend::new(24000).with_failure_on("boom");
        assert!(backend.speak("this goes boom", "v", "b").await.is_err());
        assert!(backend.speak("this is fine", "v", "b").await.is_ok());
        assert_eq!(backend.calls().len(), 2);
    }
}
