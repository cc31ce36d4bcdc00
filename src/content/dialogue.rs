use crate::content::prompts;
use crate::content::text::clean_turn;
use crate::content::types::{Speaker, Topic, Turn};
use crate::error::{PodcastError, Result};
use crate::llm::{GenerationClients, GenerationRole};

/// Generation role that speaks for `speaker`.
pub fn role_for(speaker: Speaker) -> GenerationRole {
    match speaker {
        Speaker::Moderator => GenerationRole::Moderator,
        Speaker::Host => GenerationRole::Host,
        Speaker::Guest => GenerationRole::Guest,
    }
}

/// Writes the dialogue for one topic, turn by turn.
///
/// Holds no conversation state: each turn is generated from an explicit
/// slice of the turns before it, so topics can be generated concurrently.
#[derive(Clone)]
pub struct DialogueGenerator {
    clients: GenerationClients,
}

impl DialogueGenerator {
    pub fn new(clients: GenerationClients) -> Self {
        Self { clients }
    }

    /// Generate exactly `num_turns` turns; speaker `n` is `roles[n % roles.len()]`.
    #[tracing::instrument(skip_all, fields(topic_id = topic.id))]
    pub async fn generate(
        &self,
        topic: &Topic,
        num_turns: usize,
        roles: &[Speaker],
        excerpt: &str,
    ) -> Result<Vec<Turn>> {
        if roles.is_empty() {
            return Err(PodcastError::configuration(
                "content.roles",
                "at least one speaker role is required",
            ));
        }

        let mut turns: Vec<Turn> = Vec::with_capacity(num_turns);
        for turn_index in 0..num_turns {
            let speaker = roles[turn_index % roles.len()];
            let content = self.next_turn(topic, speaker, &turns, excerpt).await?;
            tracing::debug!(turn_index, %speaker, "Generated turn");
            turns.push(Turn {
                topic_id: topic.id,
                speaker,
                content,
                turn_index,
            });
        }
        Ok(turns)
    }

    /// Generate the line `speaker` says after `context`.
    pub async fn next_turn(
        &self,
        topic: &Topic,
        speaker: Speaker,
        context: &[Turn],
        excerpt: &str,
    ) -> Result<String> {
        let role = role_for(speaker);
        let client = self.clients.get(role)?;
        let prompt = prompts::turn(topic, excerpt, speaker, context);
        let raw = client.generate(&prompt, role).await.map_err(|e| match e {
            PodcastError::GenerationFailure { message, .. } => PodcastError::generation(
                format!(
                    "topic {}, turn {}, {}",
                    topic.id + 1,
                    context.len(),
                    speaker
                ),
                message,
            ),
            other => other,
        })?;
        Ok(clean_turn(&raw))
    }
}
