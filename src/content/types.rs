//! Textual data model produced by the content stages.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Participant in the dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    Moderator,
    Host,
    Guest,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::Moderator => "Moderator",
            Speaker::Host => "Host",
            Speaker::Guest => "Guest",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Speaker {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "moderator" => Ok(Speaker::Moderator),
            "host" => Ok(Speaker::Host),
            "guest" => Ok(Speaker::Guest),
            other => Err(format!(
                "unknown speaker '{other}' (expected Moderator, Host or Guest)"
            )),
        }
    }
}

/// A discussion topic. Immutable once extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: usize,
    pub text: String,
}

/// One utterance by one speaker within a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub topic_id: usize,
    pub speaker: Speaker,
    pub content: String,
    pub turn_index: usize,
}

/// Dialogue for one topic plus the label spoken when it starts.
///
/// `title` starts as the topic text and is what the translator rewrites;
/// `topic` itself never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicScript {
    pub topic: Topic,
    pub title: String,
    pub turns: Vec<Turn>,
}

impl TopicScript {
    pub fn new(topic: Topic, turns: Vec<Turn>) -> Self {
        Self {
            title: topic.text.clone(),
            topic,
            turns,
        }
    }

    /// Spoken announcement for this topic, numbered from 1.
    pub fn announcement(&self) -> String {
        format!("Topic {}: {}", self.topic.id + 1, self.title)
    }
}

/// Everything the content stages produce for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodcastScript {
    pub created_at: DateTime<Local>,
    pub document_path: String,
    pub title: String,
    pub description: String,
    pub intro: String,
    pub outro: String,
    pub topics: Vec<TopicScript>,
    /// Language code the text was translated into; absent while untranslated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl PodcastScript {
    pub fn total_turns(&self) -> usize {
        self.topics.iter().map(|t| t.turns.len()).sum()
    }
}
