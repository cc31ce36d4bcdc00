//! Resolves the `[models]` configuration into one client per role.

use crate::config::Config;
use crate::error::{PodcastError, Result};
use crate::llm::anthropic::AnthropicClient;
use crate::llm::client::{GenerationClient, GenerationRole};
use crate::llm::ollama::OllamaClient;
use crate::llm::openai::{GROQ_BASE_URL, OPENAI_BASE_URL, OpenAiClient};
use crate::llm::provider::{ChatProvider, Provider, ProviderSpec};
use crate::llm::retry::{RetryPolicy, RetryingClient};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Generation clients keyed by role.
///
/// Built once at startup; roles that share a model string share a client.
#[derive(Clone)]
pub struct GenerationClients {
    by_role: HashMap<GenerationRole, Arc<dyn GenerationClient>>,
}

impl GenerationClients {
    /// Use one client for every role.
    pub fn uniform(client: Arc<dyn GenerationClient>) -> Self {
        let by_role = GenerationRole::ALL
            .iter()
            .map(|role| (*role, client.clone()))
            .collect();
        Self { by_role }
    }

    /// Replace the client for a single role.
    pub fn with_role(mut self, role: GenerationRole, client: Arc<dyn GenerationClient>) -> Self {
        self.by_role.insert(role, client);
        self
    }

    /// Build provider clients from configuration.
    ///
    /// Fails with a configuration error when a model string is malformed or
    /// a provider's API key is missing, before any request is sent.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| PodcastError::Other(format!("failed to build HTTP client: {e}")))?;
        let policy = RetryPolicy::with_retries(
            config.providers.max_retries,
            Duration::from_secs(config.providers.request_timeout_secs),
        );

        let mut shared: HashMap<ProviderSpec, Arc<dyn GenerationClient>> = HashMap::new();
        let mut by_role = HashMap::new();

        for (role, (key, value)) in GenerationRole::ALL.iter().zip(config.models.entries()) {
            let spec = ProviderSpec::parse(key, value)?;
            let client = match shared.get(&spec) {
                Some(client) => client.clone(),
                None => {
                    let provider = build_provider(&spec, key, config, &http)?;
                    let client: Arc<dyn GenerationClient> = Arc::new(RetryingClient::new(
                        provider,
                        policy.clone(),
                        spec.to_string(),
                    ));
                    tracing::debug!(model = %spec, "Created generation client");
                    shared.insert(spec, client.clone());
                    client
                }
            };
            by_role.insert(*role, client);
        }

        Ok(Self { by_role })
    }

    /// Client for `role`.
    pub fn get(&self, role: GenerationRole) -> Result<Arc<dyn GenerationClient>> {
        self.by_role.get(&role).cloned().ok_or_else(|| {
            PodcastError::configuration(
                format!("models.{}", role.as_str()),
                "no generation client configured",
            )
        })
    }
}

fn build_provider(
    spec: &ProviderSpec,
    key: &str,
    config: &Config,
    http: &reqwest::Client,
) -> Result<Box<dyn ChatProvider>> {
    let providers = &config.providers;
    let require = |slot: &Option<String>, name: &str| -> Result<String> {
        slot.clone().filter(|k| !k.is_empty()).ok_or_else(|| {
            PodcastError::configuration(
                key,
                format!("{} requires {name} (set it in [providers] or the environment)", spec),
            )
        })
    };

    let provider: Box<dyn ChatProvider> = match spec.provider {
        Provider::Ollama => Box::new(OllamaClient::new(
            http.clone(),
            &providers.ollama_base_url,
            &spec.model_name,
        )),
        Provider::OpenAi => {
            let api_key = require(&providers.openai_api_key, "OPENAI_API_KEY")?;
            Box::new(OpenAiClient::new(
                http.clone(),
                OPENAI_BASE_URL,
                &api_key,
                &spec.model_name,
            ))
        }
        Provider::Groq => {
            let api_key = require(&providers.groq_api_key, "GROQ_API_KEY")?;
            Box::new(OpenAiClient::new(
                http.clone(),
                GROQ_BASE_URL,
                &api_key,
                &spec.model_name,
            ))
        }
        Provider::Anthropic => {
            let api_key = require(&providers.anthropic_api_key, "ANTHROPIC_API_KEY")?;
            Box::new(AnthropicClient::new(
                http.clone(),
                &api_key,
                &spec.model_name,
            ))
        }
    };
    Ok(provider)
}
