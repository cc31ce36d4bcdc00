use crate::content::prompts;
use crate::content::text::clean_script_text;
use crate::content::types::{Topic, TopicScript};
use crate::error::Result;
use crate::llm::{GenerationClients, GenerationRole};

/// Title and description of an episode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeMetadata {
    pub title: String,
    pub description: String,
}

/// Writes the narration around the dialogue and the episode metadata.
pub struct IntroOutroGenerator {
    clients: GenerationClients,
}

impl IntroOutroGenerator {
    pub fn new(clients: GenerationClients) -> Self {
        Self { clients }
    }

    pub async fn intro(&self, topics: &[Topic]) -> Result<String> {
        let role = GenerationRole::IntroWriter;
        let raw = self
            .clients
            .get(role)?
            .generate(&prompts::intro(topics), role)
            .await?;
        Ok(clean_script_text(&raw))
    }

    /// Outro summarising the first turns of every topic.
    pub async fn outro(&self, scripts: &[TopicScript]) -> Result<String> {
        let role = GenerationRole::OutroWriter;
        let raw = self
            .clients
            .get(role)?
            .generate(&prompts::outro(scripts), role)
            .await?;
        Ok(clean_script_text(&raw))
    }

    pub async fn metadata(&self, topics: &[Topic], intro: &str) -> Result<EpisodeMetadata> {
        let role = GenerationRole::MetadataWriter;
        let raw = self
            .clients
            .get(role)?
            .generate(&prompts::metadata(topics, intro), role)
            .await?;
        let metadata = parse_metadata(&raw);
        if metadata.title.is_empty() {
            tracing::warn!("Metadata response had no TITLE line");
        }
        Ok(metadata)
    }
}

/// Read `TITLE:` and `DESCRIPTION:` lines; missing fields stay empty.
pub fn parse_metadata(response: &str) -> EpisodeMetadata {
    let mut metadata = EpisodeMetadata::default();
    for line in response.lines() {
        let line = line.trim().trim_start_matches('*');
        if metadata.title.is_empty()
            && let Some(value) = tagged_value(line, "TITLE:")
        {
            metadata.title = value;
        } else if metadata.description.is_empty()
            && let Some(value) = tagged_value(line, "DESCRIPTION:")
        {
            metadata.description = value;
        }
    }
    metadata
}

fn tagged_value(line: &str, tag: &str) -> Option<String> {
    let head = line.get(..tag.len())?;
    if !head.eq_ignore_ascii_case(tag) {
        return None;
    }
    let value = line[tag.len()..]
        .trim()
        .trim_start_matches('*')
        .trim()
        .trim_matches('"');
    Some(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::types::{Speaker, Turn};
    use crate::llm::MockGenerationClient;
    use std::sync::Arc;

    fn topics() -> Vec<Topic> {
        vec![
            Topic {
                id: 0,
                text: "Why batteries age".to_string(),
            },
            Topic {
                id: 1,
                text: "Recycling lithium".to_string(),
            },
        ]
    }

    #[test]
    fn parses_title_and_description() {
        let metadata = parse_metadata(
            "TITLE: Power to the Cells\nDESCRIPTION: A chat about batteries.\nextra",
        );
        assert_eq!(metadata.title, "Power to the Cells");
        assert_eq!(metadata.description, "A chat about batteries.");
    }

    #[test]
    fn parses_bold_and_lowercase_tags() {
        let metadata = parse_metadata("**Title:** \"Cells\"\n**description:** About cells.");
        assert_eq!(metadata.title, "Cells");
        assert_eq!(metadata.description, "About cells.");
    }

    #[test]
    fn missing_tags_leave_fields_empty() {
        assert_eq!(parse_metadata("just a title"), EpisodeMetadata::default());
    }

    #[tokio::test]
    async fn intro_prompt_lists_topics_and_output_is_cleaned() {
        let mock = Arc::new(MockGenerationClient::new("mock").with_response(
            GenerationRole::IntroWriter,
            "Here is the intro: Welcome, everyone!",
        ));
        let generator = IntroOutroGenerator::new(GenerationClients::uniform(mock.clone()));
        let intro = generator.intro(&topics()).await.unwrap();
        assert_eq!(intro, "Welcome, everyone!");
        let calls = mock.calls();
        assert!(calls[0].1.contains("- Why batteries age"));
        assert!(calls[0].1.contains("- Recycling lithium"));
    }

    #[tokio::test]
    async fn outro_uses_outro_role() {
        let mock = Arc::new(
            MockGenerationClient::new("mock")
                .with_response(GenerationRole::OutroWriter, "Thanks for listening."),
        );
        let generator = IntroOutroGenerator::new(GenerationClients::uniform(mock.clone()));
        let script = TopicScript::new(
            topics()[0].clone(),
            vec![Turn {
                topic_id: 0,
                speaker: Speaker::Guest,
                content: "Heat is the enemy.".to_string(),
                turn_index: 0,
            }],
        );
        let outro = generator.outro(&[script]).await.unwrap();
        assert_eq!(outro, "Thanks for listening.");
        assert_eq!(mock.call_count(GenerationRole::OutroWriter), 1);
        assert!(mock.calls()[0].1.contains("Heat is the enemy."));
    }
}
