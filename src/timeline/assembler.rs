//! Sequential placement of speech segments on one timeline.

use crate::error::{PodcastError, Result};
use crate::timeline::segment::{AudioSegment, Gap, SegmentKind, SegmentRef, TimedSegment};

/// Where the assembler is in the episode structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing placed yet
    Start,
    Intro,
    TopicLoop,
    Outro,
    Done,
}

/// Foreground audio with every segment's time range.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub segments: Vec<TimedSegment>,
    pub gaps: Vec<Gap>,
}

impl Timeline {
    pub fn total_duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Sample index where the intro ends (0 without an intro).
    pub fn intro_end_sample(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| s.kind == SegmentKind::Intro)
            .map(|s| s.start_sample + s.sample_count)
            .max()
            .unwrap_or(0)
    }

    /// Sample index where the outro starts (buffer length without an outro).
    pub fn outro_start_sample(&self) -> usize {
        self.segments
            .iter()
            .find(|s| s.kind == SegmentKind::Outro)
            .map(|s| s.start_sample)
            .unwrap_or(self.samples.len())
    }

    /// Timed segments belonging to `topic_id`, in order.
    pub fn topic_segments(&self, topic_id: usize) -> impl Iterator<Item = &TimedSegment> {
        self.segments
            .iter()
            .filter(move |s| s.reference.topic_id() == Some(topic_id))
    }
}

/// Places segments back to back: each one starts where the previous ended.
///
/// Enforces the episode order Intro → (TopicLabel → Turn*)* → Outro and a
/// single sample rate; violations are rejected, never reordered.
#[derive(Debug)]
pub struct TimelineAssembler {
    sample_rate: u32,
    phase: Phase,
    cursor: usize,
    last_topic: Option<usize>,
    last_turn: Option<usize>,
    samples: Vec<f32>,
    segments: Vec<TimedSegment>,
    gaps: Vec<Gap>,
}

impl TimelineAssembler {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            phase: Phase::Start,
            cursor: 0,
            last_topic: None,
            last_turn: None,
            samples: Vec::new(),
            segments: Vec::new(),
            gaps: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current end of the timeline in seconds.
    pub fn cursor_seconds(&self) -> f64 {
        self.cursor as f64 / self.sample_rate as f64
    }

    /// Append `segment` at the cursor and advance the cursor by its duration.
    pub fn push(&mut self, segment: AudioSegment) -> Result<&TimedSegment> {
        if segment.sample_rate != self.sample_rate {
            return Err(PodcastError::Timeline {
                message: format!(
                    "{} has sample rate {} Hz, timeline runs at {} Hz",
                    segment.describe(),
                    segment.sample_rate,
                    self.sample_rate
                ),
            });
        }
        self.check_order(segment.kind, segment.reference)?;
        self.advance(segment.kind, segment.reference);

        let start_sample = self.cursor;
        let sample_count = segment.samples.len();
        let end_sample = start_sample + sample_count;
        let rate = self.sample_rate as f64;

        self.samples.extend_from_slice(&segment.samples);
        self.cursor = end_sample;
        self.segments.push(TimedSegment {
            kind: segment.kind,
            reference: segment.reference,
            speaker: segment.speaker,
            text: segment.text,
            start_time: start_sample as f64 / rate,
            end_time: end_sample as f64 / rate,
            start_sample,
            sample_count,
        });

        let placed = &self.segments[self.segments.len() - 1];
        tracing::debug!(
            kind = %placed.kind,
            start = placed.start_time,
            end = placed.end_time,
            "Placed segment"
        );
        Ok(placed)
    }

    /// Record a skipped segment at the cursor. The cursor does not move.
    pub fn record_gap(
        &mut self,
        kind: SegmentKind,
        reference: SegmentRef,
        reason: impl Into<String>,
    ) -> &Gap {
        let gap = Gap {
            kind,
            topic_id: reference.topic_id(),
            turn_index: reference.turn_index(),
            at_seconds: self.cursor_seconds(),
            reason: reason.into(),
        };
        tracing::warn!(
            kind = %gap.kind,
            at = gap.at_seconds,
            reason = %gap.reason,
            "Segment skipped, gap recorded"
        );
        self.gaps.push(gap);
        &self.gaps[self.gaps.len() - 1]
    }

    pub fn finish(mut self) -> Timeline {
        self.phase = Phase::Done;
        Timeline {
            samples: self.samples,
            sample_rate: self.sample_rate,
            segments: self.segments,
            gaps: self.gaps,
        }
    }

    fn check_order(&self, kind: SegmentKind, reference: SegmentRef) -> Result<()> {
        let reject = |why: &str| {
            Err(PodcastError::Timeline {
                message: format!("{kind} rejected in phase {:?}: {why}", self.phase),
            })
        };

        if matches!(self.phase, Phase::Outro | Phase::Done) {
            return reject("the outro has already been placed");
        }

        match (kind, reference) {
            (SegmentKind::Intro, _) => {
                if self.phase != Phase::Start {
                    return reject("the intro must be the first segment");
                }
            }
            (SegmentKind::TopicLabel, SegmentRef::Topic { topic_id }) => {
                if self.last_topic.is_some_and(|last| topic_id <= last) {
                    return reject("topics must appear in increasing order");
                }
            }
            (SegmentKind::Turn, SegmentRef::Turn {
                topic_id,
                turn_index,
            }) => match self.last_topic {
                Some(last) if topic_id < last => {
                    return reject("turn belongs to an earlier topic");
                }
                Some(last) if topic_id == last => {
                    if self.last_turn.is_some_and(|t| turn_index <= t) {
                        return reject("turns must appear in increasing order");
                    }
                }
                _ => {}
            },
            (SegmentKind::Outro, _) => {}
            _ => return reject("segment reference does not match its kind"),
        }
        Ok(())
    }

    fn advance(&mut self, kind: SegmentKind, reference: SegmentRef) {
        match kind {
            SegmentKind::Intro => self.phase = Phase::Intro,
            SegmentKind::TopicLabel | SegmentKind::Turn => {
                self.phase = Phase::TopicLoop;
                if let Some(topic_id) = reference.topic_id()
                    && self.last_topic != Some(topic_id)
                {
                    self.last_topic = Some(topic_id);
                    self.last_turn = None;
                }
                if let Some(turn_index) = reference.turn_index() {
                    self.last_turn = Some(turn_index);
                }
            }
            SegmentKind::Outro => self.phase = Phase::Outro,
        }
    }
}
