//! User prompts for each generation step.
//!
//! System prompts live on [`GenerationRole`](crate::llm::GenerationRole);
//! these carry the per-call material.

use crate::content::types::{Speaker, Topic, TopicScript, Turn};

/// Turns per topic quoted in the outro prompt.
const OUTRO_POINTS_PER_TOPIC: usize = 3;

/// Characters of the intro quoted in the metadata prompt.
const METADATA_INTRO_CHARS: usize = 300;

pub fn topics(excerpt: &str, num_topics: usize) -> String {
    format!(
        "Based on this document, generate {num_topics} specific discussion topics that would \
         create an interesting dynamic in a podcast about it. The topics must be mentioned in \
         and related to the document.\n\n\
         Format as a numbered list. Each topic should:\n\
         - Be specific and focused\n\
         - Create potential for contrasting viewpoints\n\
         - Be under 15 words\n\n\
         Document: {excerpt}"
    )
}

pub fn turn(topic: &Topic, excerpt: &str, speaker: Speaker, context: &[Turn]) -> String {
    let mut prompt = format!("Topic: {}\nContext: {}\n", topic.text, excerpt);
    if !context.is_empty() {
        prompt.push_str("\nConversation so far:\n");
        for turn in context {
            prompt.push_str(&format!("{}: {}\n", turn.speaker, turn.content));
        }
    }
    match context.last() {
        None => prompt.push_str(&format!("\nYou are the {speaker}. Open the discussion.")),
        Some(last) => prompt.push_str(&format!(
            "\nYou are the {speaker}. Respond to the {}.",
            last.speaker
        )),
    }
    prompt
}

pub fn intro(topics: &[Topic]) -> String {
    format!(
        "Create an engaging podcast introduction for an episode discussing these topics:\n\n\
         Topics:\n{}\n\n\
         Create a natural, flowing introduction that welcomes listeners and previews these topics.",
        bullet_list(topics.iter().map(|t| t.text.as_str()))
    )
}

pub fn outro(scripts: &[TopicScript]) -> String {
    let summary: Vec<String> = scripts
        .iter()
        .map(|script| {
            let points: Vec<&str> = script
                .turns
                .iter()
                .take(OUTRO_POINTS_PER_TOPIC)
                .map(|t| t.content.as_str())
                .collect();
            format!("Topic: {}\nKey points: {}", script.topic.text, points.join(" "))
        })
        .collect();
    format!(
        "Create an engaging outro for this podcast episode. Here are the topics and key points \
         discussed:\n\n{}\n\n\
         Create a natural conclusion that summarizes these discussions and encourages listener \
         engagement.",
        summary.join("\n")
    )
}

pub fn metadata(topics: &[Topic], intro: &str) -> String {
    format!(
        "Create an engaging podcast title and description based on these topics and introduction:\n\n\
         Topics:\n{}\n\n\
         Introduction:\n{}\n\n\
         Provide the title and description in this format:\n\
         TITLE: [Your title here]\n\
         DESCRIPTION: [Your description here]",
        bullet_list(topics.iter().map(|t| t.text.as_str())),
        super::text::excerpt(intro, METADATA_INTRO_CHARS)
    )
}

pub fn translation(text: &str, language: &str) -> String {
    format!(
        "Translate the following English text to {language}. Keep names, numbers and \
         punctuation. Provide ONLY the translated text, no explanations or notes.\n\n{text}"
    )
}

fn bullet_list<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic() -> Topic {
        Topic {
            id: 0,
            text: "Local inference".to_string(),
        }
    }

    #[test]
    fn first_turn_opens_the_discussion() {
        let prompt = turn(&topic(), "doc", Speaker::Moderator, &[]);
        assert!(prompt.contains("Topic: Local inference"));
        assert!(prompt.contains("Open the discussion"));
        assert!(!prompt.contains("Conversation so far"));
    }

    #[test]
    fn later_turns_quote_the_context_in_order() {
        let context = vec![
            Turn {
                topic_id: 0,
                speaker: Speaker::Moderator,
                content: "Why run models locally?".to_string(),
                turn_index: 0,
            },
            Turn {
                topic_id: 0,
                speaker: Speaker::Guest,
                content: "Privacy, mostly.".to_string(),
                turn_index: 1,
            },
        ];
        let prompt = turn(&topic(), "doc", Speaker::Moderator, &context);
        let first = prompt.find("Moderator: Why run").unwrap();
        let second = prompt.find("Guest: Privacy").unwrap();
        assert!(first < second);
        assert!(prompt.ends_with("Respond to the Guest."));
    }

    #[test]
    fn outro_uses_first_three_turns_per_topic() {
        let turns = (0..5)
            .map(|i| Turn {
                topic_id: 0,
                speaker: Speaker::Guest,
                content: format!("point{i}"),
                turn_index: i,
            })
            .collect();
        let prompt = outro(&[TopicScript::new(topic(), turns)]);
        assert!(prompt.contains("point0 point1 point2"));
        assert!(!prompt.contains("point3"));
    }

    #[test]
    fn metadata_prompt_asks_for_tagged_lines() {
        let prompt = metadata(&[topic()], "Welcome!");
        assert!(prompt.contains("- Local inference"));
        assert!(prompt.contains("TITLE:"));
        assert!(prompt.contains("DESCRIPTION:"));
    }
}
