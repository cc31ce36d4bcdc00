//! Structured JSON record of the generated conversation.

use crate::content::types::{PodcastScript, Speaker};
use crate::error::Result;
use crate::timeline::assembler::Timeline;
use crate::timeline::segment::{Gap, SegmentKind, SegmentRef, TimedSegment};
use chrono::{DateTime, Local, SecondsFormat, TimeDelta};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub timestamp: String,
    pub document_path: String,
    pub title: String,
    pub description: String,
    pub total_topics: usize,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration_seconds: Option<f64>,
}

/// One spoken turn. Timing fields are absent when no audio was rendered
/// or the turn's synthesis was skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnEntry {
    pub speaker: Speaker,
    pub content: String,
    pub turn: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_end: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub metadata: RecordMetadata,
    pub intro: String,
    /// Spoken topic label → turns, in topic order
    pub conversations: IndexMap<String, Vec<TurnEntry>>,
    pub outro: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gaps: Vec<Gap>,
}

/// Builds and writes [`ConversationRecord`]s for one run.
pub struct ConversationExporter {
    run_started: DateTime<Local>,
    language: String,
}

impl ConversationExporter {
    pub fn new(run_started: DateTime<Local>, language: &str) -> Self {
        Self {
            run_started,
            language: language.to_string(),
        }
    }

    /// Assemble the record. Without a timeline only text is exported.
    pub fn build(&self, script: &PodcastScript, timeline: Option<&Timeline>) -> ConversationRecord {
        let mut conversations: IndexMap<String, Vec<TurnEntry>> = IndexMap::new();

        for topic in &script.topics {
            let entries = topic
                .turns
                .iter()
                .map(|turn| {
                    let timed = timeline.and_then(|t| {
                        find_turn(&t.segments, topic.topic.id, turn.turn_index)
                    });
                    TurnEntry {
                        speaker: turn.speaker,
                        content: turn.content.clone(),
                        turn: turn.turn_index,
                        start_time: timed.map(|s| self.wall_clock(s.start_time)),
                        end_time: timed.map(|s| self.wall_clock(s.end_time)),
                        duration_seconds: timed.map(|s| round_ms(s.duration_seconds())),
                        offset_start: timed.map(|s| round_ms(s.start_time)),
                        offset_end: timed.map(|s| round_ms(s.end_time)),
                    }
                })
                .collect();
            conversations.insert(unique_key(&conversations, &topic.title), entries);
        }

        ConversationRecord {
            metadata: RecordMetadata {
                timestamp: self.run_started.to_rfc3339_opts(SecondsFormat::Secs, false),
                document_path: script.document_path.clone(),
                title: script.title.clone(),
                description: script.description.clone(),
                total_topics: script.topics.len(),
                language: self.language.clone(),
                total_duration_seconds: timeline.map(|t| round_ms(t.total_duration_seconds())),
            },
            intro: script.intro.clone(),
            conversations,
            outro: script.outro.clone(),
            gaps: timeline.map(|t| t.gaps.clone()).unwrap_or_default(),
        }
    }

    /// Write the record under `<output_dir>/exports/` and return its path.
    pub fn write(&self, record: &ConversationRecord, output_dir: &Path) -> Result<PathBuf> {
        let dir = output_dir.join("exports");
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!(
            "podcast_conversation_{}.json",
            self.run_started.format("%Y%m%d_%H%M%S")
        ));
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(&path, json)?;
        tracing::info!(path = %path.display(), "Exported conversation");
        Ok(path)
    }

    /// Run start plus a timeline offset, as ISO-8601.
    fn wall_clock(&self, offset_seconds: f64) -> String {
        let offset = TimeDelta::milliseconds((offset_seconds * 1000.0).round() as i64);
        (self.run_started + offset).to_rfc3339_opts(SecondsFormat::Millis, false)
    }
}

fn find_turn(segments: &[TimedSegment], topic_id: usize, turn_index: usize) -> Option<&TimedSegment> {
    segments.iter().find(|s| {
        s.kind == SegmentKind::Turn
            && s.reference
                == SegmentRef::Turn {
                    topic_id,
                    turn_index,
                }
    })
}

fn unique_key(map: &IndexMap<String, Vec<TurnEntry>>, title: &str) -> String {
    if !map.contains_key(title) {
        return title.to_string();
    }
    (2..)
        .map(|n| format!("{title} ({n})"))
        .find(|candidate| !map.contains_key(candidate))
        .unwrap_or_else(|| title.to_string())
}

fn round_ms(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}
