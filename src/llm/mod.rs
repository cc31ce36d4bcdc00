//! LLM access: the role-based generation capability and its providers.

pub mod anthropic;
pub mod client;
pub mod factory;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod retry;

pub use client::{GenerationClient, GenerationRole, MockGenerationClient};
pub use factory::GenerationClients;
pub use provider::{Provider, ProviderSpec};
