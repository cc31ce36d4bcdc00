//! Adapter from script text to timeline-ready [`AudioSegment`]s.

use super::backend::SpeechBackend;
use crate::audio::wav;
use crate::content::types::Speaker;
use crate::error::{PodcastError, Result};
use crate::timeline::segment::{AudioSegment, SegmentKind, SegmentRef};
use std::sync::Arc;

/// Chunking and padding applied around every backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisSettings {
    pub sample_rate: u32,
    /// Maximum characters per backend request
    pub chunk_size: usize,
    pub chunk_pause_ms: u32,
    pub lang: String,
}

/// What to speak and where it belongs.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest<'a> {
    pub kind: SegmentKind,
    pub reference: SegmentRef,
    pub speaker: Speaker,
    pub text: &'a str,
    pub voice: &'a str,
    /// Silence appended after the speech
    pub trailing_pause_ms: u32,
}

pub struct SpeechSynthesizer {
    backend: Arc<dyn SpeechBackend>,
    settings: SynthesisSettings,
}

impl SpeechSynthesizer {
    pub fn new(backend: Arc<dyn SpeechBackend>, settings: SynthesisSettings) -> Self {
        Self { backend, settings }
    }

    /// Speak `request.text` as one segment at the pipeline sample rate.
    ///
    /// Long text is split on sentence boundaries into chunks of at most
    /// `chunk_size` characters; chunk audio is joined with a short pause.
    pub async fn synthesize(&self, request: &SpeechRequest<'_>) -> Result<AudioSegment> {
        let context = match request.reference {
            SegmentRef::None => request.kind.to_string(),
            reference => format!("{} ({})", request.kind, reference),
        };
        if request.text.trim().is_empty() {
            return Err(PodcastError::synthesis(context, "text is empty"));
        }

        let chunks = split_into_chunks(request.text, self.settings.chunk_size);
        let mut joined: Vec<f32> = Vec::new();
        let mut rate: Option<u32> = None;

        for (i, chunk) in chunks.iter().enumerate() {
            let audio = self
                .backend
                .speak(chunk, request.voice, &self.settings.lang)
                .await
                .map_err(|e| match e {
                    PodcastError::SynthesisFailure { message, .. } => {
                        PodcastError::synthesis(context.clone(), message)
                    }
                    other => PodcastError::synthesis(context.clone(), other.to_string()),
                })?;

            let chunk_rate = *rate.get_or_insert(audio.sample_rate);
            if i > 0 {
                joined.extend(wav::silence(self.settings.chunk_pause_ms, chunk_rate));
            }
            if audio.sample_rate == chunk_rate {
                joined.extend_from_slice(&audio.samples);
            } else {
                joined.extend(wav::resample(&audio.samples, audio.sample_rate, chunk_rate));
            }
        }

        let backend_rate = rate.unwrap_or(self.settings.sample_rate);
        let mut samples = if backend_rate != self.settings.sample_rate {
            tracing::debug!(
                from = backend_rate,
                to = self.settings.sample_rate,
                "Resampling speech"
            );
            wav::resample(&joined, backend_rate, self.settings.sample_rate)
        } else {
            joined
        };
        samples.extend(wav::silence(
            request.trailing_pause_ms,
            self.settings.sample_rate,
        ));

        tracing::debug!(
            segment = %context,
            chunks = chunks.len(),
            seconds = samples.len() as f64 / self.settings.sample_rate as f64,
            "Synthesized segment"
        );

        Ok(AudioSegment {
            kind: request.kind,
            reference: request.reference,
            speaker: request.speaker,
            text: request.text.to_string(),
            samples,
            sample_rate: self.settings.sample_rate,
        })
    }
}

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Sentences are kept whole where possible; an overlong sentence is split
/// on whitespace, and an overlong word on character boundaries.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();

    let push_piece = |piece: &str, chunks: &mut Vec<String>, current: &mut String| {
        let needed = if current.is_empty() {
            piece.chars().count()
        } else {
            current.chars().count() + 1 + piece.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(piece);
    };

    for sentence in sentences(text) {
        if sentence.chars().count() <= max_chars {
            push_piece(sentence, &mut chunks, &mut current);
            continue;
        }
        for word in sentence.split_whitespace() {
            if word.chars().count() <= max_chars {
                push_piece(word, &mut chunks, &mut current);
            } else {
                let chars: Vec<char> = word.chars().collect();
                for part in chars.chunks(max_chars) {
                    push_piece(&part.iter().collect::<String>(), &mut chunks, &mut current);
                }
            }
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Sentences of `text`, terminal punctuation kept, whitespace trimmed.
fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?' | '…' | '。' | '！' | '？') {
            let at_boundary = matches!(c, '。' | '！' | '？')
                || chars.peek().is_none_or(|(_, next)| next.is_whitespace());
            if at_boundary {
                let end = i + c.len_utf8();
                let sentence = text[start..end].trim();
                if !sentence.is_empty() {
                    out.push(sentence);
                }
                start = end;
            }
        }
    }
    let rest = text[start..].trim();
    if !rest.is_empty() {
        out.push(rest);
    }
    out
}
