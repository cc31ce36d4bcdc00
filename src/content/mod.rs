//! Content stages: topics, dialogue, narration and translation.

pub mod dialogue;
pub mod intro_outro;
pub mod language;
pub mod prompts;
pub mod text;
pub mod topics;
pub mod translation;
pub mod types;

pub use dialogue::DialogueGenerator;
pub use intro_outro::{EpisodeMetadata, IntroOutroGenerator};
pub use topics::TopicExtractor;
pub use translation::Translator;
pub use types::{PodcastScript, Speaker, Topic, TopicScript, Turn};
