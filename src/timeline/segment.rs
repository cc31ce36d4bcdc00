//! Audio segments and their placement on the timeline.

use crate::content::types::Speaker;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a segment speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Intro,
    TopicLabel,
    Turn,
    Outro,
}

impl SegmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentKind::Intro => "intro",
            SegmentKind::TopicLabel => "topic_label",
            SegmentKind::Turn => "turn",
            SegmentKind::Outro => "outro",
        }
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which piece of the script a segment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentRef {
    None,
    Topic { topic_id: usize },
    Turn { topic_id: usize, turn_index: usize },
}

impl SegmentRef {
    pub fn topic_id(&self) -> Option<usize> {
        match self {
            SegmentRef::None => None,
            SegmentRef::Topic { topic_id } | SegmentRef::Turn { topic_id, .. } => Some(*topic_id),
        }
    }

    pub fn turn_index(&self) -> Option<usize> {
        match self {
            SegmentRef::Turn { turn_index, .. } => Some(*turn_index),
            _ => None,
        }
    }
}

impl fmt::Display for SegmentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentRef::None => Ok(()),
            SegmentRef::Topic { topic_id } => write!(f, "topic {}", topic_id + 1),
            SegmentRef::Turn {
                topic_id,
                turn_index,
            } => write!(f, "topic {} turn {}", topic_id + 1, turn_index),
        }
    }
}

/// Speech for one piece of the script, ready to be placed.
///
/// Consumed by the assembler; its samples move into the timeline buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSegment {
    pub kind: SegmentKind,
    pub reference: SegmentRef,
    pub speaker: Speaker,
    /// Text that was spoken
    pub text: String,
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioSegment {
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Short description for logs and error messages.
    pub fn describe(&self) -> String {
        match self.reference {
            SegmentRef::None => self.kind.to_string(),
            reference => format!("{} ({})", self.kind, reference),
        }
    }
}

/// A segment's place on the timeline, in seconds from the start.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedSegment {
    pub kind: SegmentKind,
    pub reference: SegmentRef,
    pub speaker: Speaker,
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
    /// First sample in the timeline buffer
    pub start_sample: usize,
    pub sample_count: usize,
}

impl TimedSegment {
    pub fn duration_seconds(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// A segment that was skipped after its synthesis failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub kind: SegmentKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_index: Option<usize>,
    /// Timeline position where the segment would have started
    pub at_seconds: f64,
    pub reason: String,
}
