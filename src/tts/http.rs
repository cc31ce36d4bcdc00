use super::backend::SpeechBackend;
use crate::audio::{MonoAudio, wav};
use crate::error::{PodcastError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// Client for an OpenAI-compatible `/audio/speech` endpoint, such as
/// Kokoro-FastAPI. Requests WAV so no extra decoder is needed.
pub struct HttpSpeechBackend {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
    lang_code: &'a str,
}

impl HttpSpeechBackend {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PodcastError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/audio/speech", self.base_url)
    }
}

#[async_trait]
impl SpeechBackend for HttpSpeechBackend {
    async fn speak(&self, text: &str, voice: &str, lang: &str) -> Result<MonoAudio> {
        let body = SpeechRequest {
            model: &self.model,
            input: text,
            voice,
            response_format: "wav",
            lang_code: lang,
        };

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PodcastError::synthesis(self.endpoint(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PodcastError::synthesis(
                self.endpoint(),
                format!("HTTP {}: {}", status.as_u16(), detail.trim()),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PodcastError::synthesis(self.endpoint(), e.to_string()))?;
        wav::from_bytes(&bytes)
    }

    fn name(&self) -> &str {
        &self.base_url
    }
}
