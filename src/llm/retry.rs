//! Retry and timeout policy around a single provider.

use crate::error::{PodcastError, Result};
use crate::llm::client::{GenerationClient, GenerationRole};
use crate::llm::provider::{ChatProvider, ProviderError};
use async_trait::async_trait;
use std::time::Duration;

/// How often and how long a provider call may be attempted.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Upper bound for each attempt.
    pub request_timeout: Duration,
    /// Delay before the second attempt; doubled for every further attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: crate::defaults::MAX_RETRIES + 1,
            request_timeout: Duration::from_secs(crate::defaults::REQUEST_TIMEOUT_SECS),
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Policy from the `[providers]` settings: `retries` attempts on top of
    /// the first one.
    pub fn with_retries(retries: u32, request_timeout: Duration) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            request_timeout,
            ..Self::default()
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// `GenerationClient` backed by one provider, with retries and timeouts.
pub struct RetryingClient {
    provider: Box<dyn ChatProvider>,
    policy: RetryPolicy,
    label: String,
}

impl RetryingClient {
    pub fn new(provider: Box<dyn ChatProvider>, policy: RetryPolicy, label: String) -> Self {
        Self {
            provider,
            policy,
            label,
        }
    }
}

#[async_trait]
impl GenerationClient for RetryingClient {
    async fn generate(&self, prompt: &str, role: GenerationRole) -> Result<String> {
        let attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            let call = self.provider.chat(role.system_prompt(), prompt);
            let outcome = match tokio::time::timeout(self.policy.request_timeout, call).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Request(format!(
                    "timed out after {:?}",
                    self.policy.request_timeout
                ))),
            };

            match outcome {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    let delay = self.policy.delay_for(attempt);
                    tracing::warn!(
                        model = %self.label,
                        role = %role,
                        attempt,
                        error = %e,
                        "Generation attempt failed, retrying in {:?}",
                        delay
                    );
                    last_error = e.to_string();
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    last_error = e.to_string();
                    break;
                }
            }
        }

        Err(PodcastError::generation(
            format!("{} via {}", role, self.label),
            last_error,
        ))
    }

    fn model_name(&self) -> &str {
        &self.label
    }
}
