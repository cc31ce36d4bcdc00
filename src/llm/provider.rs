//! Provider routing for `"<provider>/<model>"` model strings.

use crate::error::{PodcastError, Result};
use async_trait::async_trait;
use std::fmt;

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Ollama,
    OpenAi,
    Anthropic,
    Groq,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Ollama => "ollama",
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Groq => "groq",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "ollama" => Some(Provider::Ollama),
            "openai" => Some(Provider::OpenAi),
            "anthropic" => Some(Provider::Anthropic),
            "groq" => Some(Provider::Groq),
            _ => None,
        }
    }
}

/// A model string resolved into provider and model name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderSpec {
    pub provider: Provider,
    pub model_name: String,
}

impl ProviderSpec {
    /// Parse `"<provider>/<model>"`.
    ///
    /// A string without a known provider prefix is an Ollama model, so
    /// `"llama3.1:8b"` and `"ollama/llama3.1:8b"` are equivalent. Unknown
    /// prefixes are rejected instead of being sent to Ollama.
    pub fn parse(key: &str, value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(PodcastError::configuration(key, "model name is empty"));
        }

        let Some((prefix, model)) = value.split_once('/') else {
            return Ok(Self {
                provider: Provider::Ollama,
                model_name: value.to_string(),
            });
        };

        if let Some(provider) = Provider::from_prefix(&prefix.to_lowercase()) {
            if model.trim().is_empty() {
                return Err(PodcastError::configuration(
                    key,
                    format!("missing model name after '{prefix}/'"),
                ));
            }
            return Ok(Self {
                provider,
                model_name: model.trim().to_string(),
            });
        }

        Err(PodcastError::configuration(
            key,
            format!("unknown provider '{prefix}' (expected ollama, openai, anthropic or groq)"),
        ))
    }
}

impl fmt::Display for ProviderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider.as_str(), self.model_name)
    }
}

/// Failure of a single provider request.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("rate limited")]
    RateLimited,
    #[error("server error {status}: {body}")]
    Server { status: u16, body: String },
    #[error("request rejected {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Request(_) | ProviderError::RateLimited | ProviderError::Server { .. }
        )
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            429 => ProviderError::RateLimited,
            500..=599 => ProviderError::Server { status, body },
            _ => ProviderError::Rejected { status, body },
        }
    }
}

/// One chat completion against a concrete provider API.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn chat(&self, system: &str, prompt: &str) -> std::result::Result<String, ProviderError>;

    fn model_name(&self) -> &str;
}

/// Turn a non-success response into a `ProviderError`.
pub(crate) async fn error_for_response(response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ProviderError::from_status(status, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_provider_prefix() {
        let cases = [
            ("ollama/qwen2.5:14b", Provider::Ollama, "qwen2.5:14b"),
            ("openai/gpt-4o-mini", Provider::OpenAi, "gpt-4o-mini"),
            ("anthropic/claude-3-5-haiku-latest", Provider::Anthropic, "claude-3-5-haiku-latest"),
            ("groq/llama-3.1-8b-instant", Provider::Groq, "llama-3.1-8b-instant"),
        ];
        for (input, provider, model) in cases {
            let spec = ProviderSpec::parse("models.host", input).unwrap();
            assert_eq!(spec.provider, provider, "{input}");
            assert_eq!(spec.model_name, model, "{input}");
        }
    }

    #[test]
    fn bare_model_defaults_to_ollama() {
        let spec = ProviderSpec::parse("models.host", "llama3.1:8b").unwrap();
        assert_eq!(spec.provider, Provider::Ollama);
        assert_eq!(spec.model_name, "llama3.1:8b");
        assert_eq!(spec.to_string(), "ollama/llama3.1:8b");
    }

    #[test]
    fn provider_prefix_is_case_insensitive() {
        let spec = ProviderSpec::parse("models.host", "OpenAI/gpt-4o").unwrap();
        assert_eq!(spec.provider, Provider::OpenAi);
    }

    #[test]
    fn unknown_provider_is_configuration_error() {
        let err = ProviderSpec::parse("models.guest", "mistral/large").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("unknown provider 'mistral'"));
    }

    #[test]
    fn empty_model_is_rejected() {
        assert!(ProviderSpec::parse("models.guest", "  ").is_err());
        assert!(ProviderSpec::parse("models.guest", "openai/").is_err());
    }

    #[test]
    fn status_classification() {
        assert!(matches!(
            ProviderError::from_status(429, String::new()),
            ProviderError::RateLimited
        ));
        assert!(ProviderError::from_status(503, String::new()).is_retryable());
        assert!(!ProviderError::from_status(401, String::new()).is_retryable());
        assert!(!ProviderError::InvalidResponse("x".into()).is_retryable());
    }
}
