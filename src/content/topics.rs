use crate::content::prompts;
use crate::content::text;
use crate::content::types::Topic;
use crate::error::{PodcastError, Result};
use crate::llm::{GenerationClient, GenerationRole};
use std::sync::Arc;

/// Turns a document into an ordered list of discussion topics.
pub struct TopicExtractor {
    client: Arc<dyn GenerationClient>,
    excerpt_chars: usize,
}

impl TopicExtractor {
    pub fn new(client: Arc<dyn GenerationClient>, excerpt_chars: usize) -> Self {
        Self {
            client,
            excerpt_chars,
        }
    }

    /// Extract at most `num_topics` topics, in the order the model listed them.
    ///
    /// Fewer topics are accepted; none at all is a generation failure.
    #[tracing::instrument(skip_all, fields(num_topics = num_topics))]
    pub async fn extract(&self, document_text: &str, num_topics: usize) -> Result<Vec<Topic>> {
        let excerpt = text::excerpt(document_text, self.excerpt_chars);
        let response = self
            .client
            .generate(
                &prompts::topics(excerpt, num_topics),
                GenerationRole::TopicGenerator,
            )
            .await?;

        let topics: Vec<Topic> = parse_numbered_list(&response)
            .into_iter()
            .take(num_topics)
            .enumerate()
            .map(|(id, text)| Topic { id, text })
            .collect();

        if topics.is_empty() {
            return Err(PodcastError::generation(
                "topic extraction",
                "model response contained no numbered topics",
            ));
        }
        if topics.len() < num_topics {
            tracing::warn!(
                requested = num_topics,
                produced = topics.len(),
                "Model produced fewer topics than requested"
            );
        }
        for topic in &topics {
            tracing::debug!(id = topic.id, topic = %topic.text, "Extracted topic");
        }
        Ok(topics)
    }
}

/// Items of a numbered list (`1. text`, `2) text`), markers and quotes removed.
///
/// Lines that do not start with a number are ignored.
pub fn parse_numbered_list(response: &str) -> Vec<String> {
    response
        .lines()
        .filter_map(|line| {
            let line = line.trim().trim_start_matches(['*', '#']).trim_start();
            let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
            if rest.len() == line.len() {
                return None;
            }
            let rest = rest.strip_prefix(['.', ')', ':'])?;
            let item = rest
                .trim()
                .trim_matches('*')
                .trim()
                .trim_matches(['"', '\u{201c}', '\u{201d}'])
                .trim();
            (!item.is_empty()).then(|| item.to_string())
        })
        .collect()
}
