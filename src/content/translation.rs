use crate::content::language;
use crate::content::prompts;
use crate::content::text::clean_translation;
use crate::content::types::{PodcastScript, TopicScript, Turn};
use crate::error::{PodcastError, Result};
use crate::llm::{GenerationClient, GenerationRole};
use std::sync::Arc;

/// Rewrites spoken text into the target language.
///
/// Whether translation runs at all is decided by the caller, once per run;
/// see [`language::needs_translation`].
pub struct Translator {
    client: Arc<dyn GenerationClient>,
    target_lang: String,
    language_name: &'static str,
}

impl Translator {
    pub fn new(client: Arc<dyn GenerationClient>, target_lang: &str) -> Result<Self> {
        let language_name = language::language_name(target_lang).ok_or_else(|| {
            PodcastError::configuration(
                "audio.lang",
                format!("unknown language code '{target_lang}'"),
            )
        })?;
        Ok(Self {
            client,
            target_lang: target_lang.to_string(),
            language_name,
        })
    }

    pub fn target_lang(&self) -> &str {
        &self.target_lang
    }

    /// Translate free text. Blank text is returned unchanged without a call.
    pub async fn translate_text(&self, text: &str, context: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }
        let raw = self
            .client
            .generate(
                &prompts::translation(text, self.language_name),
                GenerationRole::Translator,
            )
            .await
            .map_err(|e| match e {
                PodcastError::GenerationFailure { message, .. } => {
                    PodcastError::generation(format!("translating {context}"), message)
                }
                other => other,
            })?;
        let cleaned = clean_translation(&raw);
        if cleaned.is_empty() {
            return Err(PodcastError::generation(
                format!("translating {context}"),
                "translator returned no text",
            ));
        }
        Ok(cleaned)
    }

    /// Same turn with only its content translated.
    pub async fn translate_turn(&self, turn: &Turn) -> Result<Turn> {
        let context = format!("topic {} turn {}", turn.topic_id + 1, turn.turn_index);
        Ok(Turn {
            content: self.translate_text(&turn.content, &context).await?,
            ..turn.clone()
        })
    }

    /// Translate a topic's spoken title and all of its turns.
    ///
    /// The underlying `Topic` is left as extracted.
    #[tracing::instrument(skip_all, fields(topic_id = script.topic.id, lang = %self.target_lang))]
    pub async fn translate_topic(&self, mut script: TopicScript) -> Result<TopicScript> {
        let context = format!("title of topic {}", script.topic.id + 1);
        script.title = self.translate_text(&script.title, &context).await?;
        for turn in &mut script.turns {
            *turn = self.translate_turn(turn).await?;
        }
        Ok(script)
    }

    /// Translate intro and outro of a script in place.
    pub async fn translate_narration(&self, script: &mut PodcastScript) -> Result<()> {
        script.intro = self.translate_text(&script.intro, "intro").await?;
        script.outro = self.translate_text(&script.outro, "outro").await?;
        Ok(())
    }
}
