use crate::error::{PodcastError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Which part of the podcast a generation call writes.
///
/// Each role carries its own fixed system prompt and, through the model
/// configuration, its own model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationRole {
    TopicGenerator,
    Moderator,
    Host,
    Guest,
    IntroWriter,
    OutroWriter,
    MetadataWriter,
    Translator,
}

impl GenerationRole {
    pub const ALL: [GenerationRole; 8] = [
        GenerationRole::TopicGenerator,
        GenerationRole::Moderator,
        GenerationRole::Host,
        GenerationRole::Guest,
        GenerationRole::IntroWriter,
        GenerationRole::OutroWriter,
        GenerationRole::MetadataWriter,
        GenerationRole::Translator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationRole::TopicGenerator => "topic_generator",
            GenerationRole::Moderator => "moderator",
            GenerationRole::Host => "host",
            GenerationRole::Guest => "guest",
            GenerationRole::IntroWriter => "intro_generator",
            GenerationRole::OutroWriter => "outro_generator",
            GenerationRole::MetadataWriter => "metadata_generator",
            GenerationRole::Translator => "translator",
        }
    }

    /// System prompt sent with every call for this role.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            GenerationRole::TopicGenerator => {
                "You are a creative podcast producer. Given a document, propose specific, \
                 focused discussion topics that invite different perspectives. Write in English. \
                 Answer with a numbered list and nothing else."
            }
            GenerationRole::Moderator => {
                "You're hosting a casual podcast. Write in English. Use 10-15 words, ask ONE \
                 engaging question per turn, react naturally to the previous answer and avoid jargon. \
                 Reply with the spoken line only."
            }
            GenerationRole::Host => {
                "You're the co-host of a casual podcast. Write in English. Use 15-25 words, add \
                 one concrete observation and keep the conversation moving. Reply with the spoken line only."
            }
            GenerationRole::Guest => {
                "You're a guest on a casual podcast. Write in English. Use 20-25 words, make ONE \
                 clear point in simple language and build on what was said. Reply with the spoken line only."
            }
            GenerationRole::IntroWriter => {
                "You are an engaging podcast host writing the episode introduction. Write in English, \
                 greet the listeners, preview each topic in one sentence and end with a transition \
                 to the first topic. Reply with the spoken text only."
            }
            GenerationRole::OutroWriter => {
                "You are a podcast host writing the episode conclusion. Write in English, summarize \
                 each topic in a sentence or two, thank the listeners and invite feedback. \
                 Reply with the spoken text only."
            }
            GenerationRole::MetadataWriter => {
                "You write podcast titles (under 10 words, no clickbait) and descriptions \
                 (one paragraph, under 100 words)."
            }
            GenerationRole::Translator => {
                "You are a professional translator. Keep tone, meaning and punctuation. \
                 Output ONLY the translated text, without notes or explanations."
            }
        }
    }
}

impl fmt::Display for GenerationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text generation capability, polymorphic over provider.
///
/// Implementations apply their own retry policy; an `Err` means the call
/// is exhausted and is fatal for the run.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate text for `prompt` in the voice of `role`.
    async fn generate(&self, prompt: &str, role: GenerationRole) -> Result<String>;

    /// Model identifier for logging.
    fn model_name(&self) -> &str;
}

/// Implement GenerationClient for Arc<T> to share one client across roles.
#[async_trait]
impl<T: GenerationClient + ?Sized> GenerationClient for Arc<T> {
    async fn generate(&self, prompt: &str, role: GenerationRole) -> Result<String> {
        (**self).generate(prompt, role).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

type Responder = dyn Fn(&str, GenerationRole, usize) -> String + Send + Sync;

/// Scripted generation client for tests and offline runs.
///
/// Responses are chosen per role; a responder closure can compute them
/// from the prompt and the per-role call number instead.
pub struct MockGenerationClient {
    model_name: String,
    responses: HashMap<GenerationRole, String>,
    responder: Option<Box<Responder>>,
    failing: Vec<GenerationRole>,
    calls: Mutex<Vec<(GenerationRole, String)>>,
}

impl MockGenerationClient {
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            responses: HashMap::new(),
            responder: None,
            failing: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Return `response` for every call made with `role`.
    pub fn with_response(mut self, role: GenerationRole, response: &str) -> Self {
        self.responses.insert(role, response.to_string());
        self
    }

    /// Compute responses from `(prompt, role, call_number_for_role)`.
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&str, GenerationRole, usize) -> String + Send + Sync + 'static,
    {
        self.responder = Some(Box::new(responder));
        self
    }

    /// Fail every call made with `role`.
    pub fn with_failure(mut self, role: GenerationRole) -> Self {
        self.failing.push(role);
        self
    }

    /// Every `(role, prompt)` received so far, in call order.
    pub fn calls(&self) -> Vec<(GenerationRole, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self, role: GenerationRole) -> usize {
        self.calls().iter().filter(|(r, _)| *r == role).count()
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    async fn generate(&self, prompt: &str, role: GenerationRole) -> Result<String> {
        let call_number = {
            let mut calls = self
                .calls
                .lock()
                .map_err(|_| PodcastError::Other("mock call log poisoned".to_string()))?;
            let n = calls.iter().filter(|(r, _)| *r == role).count();
            calls.push((role, prompt.to_string()));
            n
        };

        if self.failing.contains(&role) {
            return Err(PodcastError::generation(
                role.as_str(),
                "mock generation failure",
            ));
        }

        if let Some(response) = self.responses.get(&role) {
            return Ok(response.clone());
        }
        if let Some(responder) = &self.responder {
            return Ok(responder(prompt, role, call_number));
        }
        Ok(format!("mock {} response {}", role, call_number))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
