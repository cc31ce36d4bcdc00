//! SRT and WebVTT cues derived from the timeline.

use crate::error::{PodcastError, Result};
use crate::timeline::segment::{SegmentKind, TimedSegment};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subtitle file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    Srt,
    Vtt,
}

impl SubtitleFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SubtitleFormat::Srt => "srt",
            SubtitleFormat::Vtt => "vtt",
        }
    }

    fn millis_separator(&self) -> char {
        match self {
            SubtitleFormat::Srt => ',',
            SubtitleFormat::Vtt => '.',
        }
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for SubtitleFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "srt" => Ok(SubtitleFormat::Srt),
            "vtt" | "webvtt" => Ok(SubtitleFormat::Vtt),
            other => Err(format!("unknown subtitle format '{other}' (expected srt or vtt)")),
        }
    }
}

/// One parsed cue, times in whole milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

/// Text shown for a segment.
pub fn cue_text(segment: &TimedSegment) -> String {
    let body = segment.text.split_whitespace().collect::<Vec<_>>().join(" ");
    match segment.kind {
        SegmentKind::TopicLabel => format!("Topic: {}", strip_topic_number(&body)),
        SegmentKind::Intro | SegmentKind::Outro | SegmentKind::Turn => {
            format!("{}: {body}", segment.speaker)
        }
    }
}

/// `Topic 2: Solar prices` → `Solar prices`; other text unchanged.
fn strip_topic_number(label: &str) -> &str {
    let Some(rest) = label.strip_prefix("Topic ") else {
        return label;
    };
    let digits = rest.chars().take_while(char::is_ascii_digit).count();
    match rest[digits..].strip_prefix(':') {
        Some(title) if digits > 0 => title.trim_start(),
        _ => label,
    }
}

/// Render one cue per segment, in timeline order.
pub fn emit(segments: &[TimedSegment], format: SubtitleFormat) -> String {
    let mut out = String::new();
    if format == SubtitleFormat::Vtt {
        out.push_str("WEBVTT\n\n");
    }
    for (n, segment) in segments.iter().enumerate() {
        if format == SubtitleFormat::Srt {
            out.push_str(&format!("{}\n", n + 1));
        }
        out.push_str(&format!(
            "{} --> {}\n{}\n\n",
            format_timestamp(segment.start_time, format),
            format_timestamp(segment.end_time, format),
            cue_text(segment)
        ));
    }
    out
}

/// `HH:MM:SS,mmm` (SRT) or `HH:MM:SS.mmm` (VTT).
///
/// Rounds on the total millisecond count so a carry rolls into seconds.
pub fn format_timestamp(seconds: f64, format: SubtitleFormat) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    format!(
        "{:02}:{:02}:{:02}{}{:03}",
        total_secs / 3600,
        (total_secs / 60) % 60,
        total_secs % 60,
        format.millis_separator(),
        ms
    )
}

/// Parse SRT or VTT text back into cues.
pub fn parse_cues(text: &str) -> Result<Vec<Cue>> {
    let mut cues = Vec::new();
    let normalized = text.replace("\r\n", "\n");

    for block in normalized.split("\n\n") {
        let mut lines = block.lines().filter(|l| !l.trim().is_empty()).peekable();
        let Some(first) = lines.peek() else {
            continue;
        };
        if first.trim_start().starts_with("WEBVTT") {
            continue;
        }

        let timing = loop {
            match lines.next() {
                Some(line) if line.contains("-->") => break line,
                Some(_) => continue,
                None => {
                    return Err(subtitle_error(format!("cue without timing line: {block:?}")));
                }
            }
        };
        let (start, end) = timing
            .split_once("-->")
            .ok_or_else(|| subtitle_error(format!("bad timing line: {timing}")))?;

        cues.push(Cue {
            start_ms: parse_timestamp(start.trim())?,
            end_ms: parse_timestamp(end.trim())?,
            text: lines.collect::<Vec<_>>().join("\n"),
        });
    }
    Ok(cues)
}

fn parse_timestamp(value: &str) -> Result<u64> {
    let value = value.split_whitespace().next().unwrap_or_default();
    let (clock, millis) = value
        .rsplit_once(|c: char| c == ',' || c == '.')
        .ok_or_else(|| subtitle_error(format!("timestamp without milliseconds: {value}")))?;
    let number = |s: &str| {
        s.parse::<u64>()
            .map_err(|_| subtitle_error(format!("bad timestamp: {value}")))
    };

    let parts: Vec<&str> = clock.split(':').collect();
    let (h, m, s) = match parts.as_slice() {
        [h, m, s] => (number(h)?, number(m)?, number(s)?),
        [m, s] => (0, number(m)?, number(s)?),
        _ => return Err(subtitle_error(format!("bad timestamp: {value}"))),
    };
    Ok(((h * 60 + m) * 60 + s) * 1000 + number(millis)?)
}

fn subtitle_error(message: String) -> PodcastError {
    PodcastError::Other(format!("subtitle parse error: {message}"))
}
