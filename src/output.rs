//! Terminal rendering for CLI runs: the generated dialogue in verbose mode,
//! a synthesis progress bar, and the end-of-run summary.

use crate::content::types::{Speaker, TopicScript};
use crate::pipeline::{RunObserver, RunReport, Stage};
use crate::timeline::segment::{Gap, TimedSegment};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::sync::Mutex;
use std::time::Duration;

/// Speaker label coloured per role.
pub fn speaker_label(speaker: Speaker) -> String {
    let label = format!("{speaker}:");
    match speaker {
        Speaker::Moderator => label.cyan().bold().to_string(),
        Speaker::Host => label.green().bold().to_string(),
        Speaker::Guest => label.magenta().bold().to_string(),
    }
}

/// The dialogue of one topic as display lines.
pub fn topic_lines(script: &TopicScript) -> Vec<String> {
    let mut lines = vec![script.announcement().bold().underline().to_string()];
    lines.extend(
        script
            .turns
            .iter()
            .map(|turn| format!("{} {}", speaker_label(turn.speaker), turn.content.trim())),
    );
    lines
}

/// Observer that writes to stderr.
pub struct ConsoleObserver {
    verbose: bool,
    progress: bool,
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleObserver {
    /// `verbose` prints the dialogue; `progress` shows a bar during synthesis.
    pub fn new(verbose: bool, progress: bool) -> Self {
        Self {
            verbose,
            progress,
            bar: Mutex::new(None),
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock()
            && let Some(bar) = guard.as_ref()
        {
            f(bar);
        }
    }

    /// Print above the bar if one is showing.
    fn println(&self, line: String) {
        let mut printed = false;
        self.with_bar(|bar| {
            bar.println(&line);
            printed = true;
        });
        if !printed {
            eprintln!("{line}");
        }
    }
}

impl RunObserver for ConsoleObserver {
    fn stage_started(&self, stage: Stage) {
        if self.verbose {
            self.println(format!("{} {}", "▶".dimmed(), stage.dimmed()));
        }
    }

    fn topic_ready(&self, script: &TopicScript) {
        if !self.verbose {
            return;
        }
        eprintln!();
        for line in topic_lines(script) {
            eprintln!("{line}");
        }
    }

    fn synthesis_started(&self, total: usize) {
        if !self.progress {
            return;
        }
        let bar = ProgressBar::new(total as u64);
        match ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} segments {msg} ({eta})")
        {
            Ok(style) => bar.set_style(style.progress_chars("#>-")),
            Err(e) => tracing::debug!(error = %e, "Using default progress style"),
        }
        bar.enable_steady_tick(Duration::from_millis(120));
        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(bar);
        }
    }

    fn segment_placed(&self, segment: &TimedSegment) {
        self.with_bar(|bar| {
            bar.set_message(segment.kind.to_string());
            bar.inc(1);
        });
    }

    fn segment_skipped(&self, gap: &Gap) {
        self.println(format!(
            "{} {} at {:.1}s: {}",
            "skipped".yellow(),
            gap.kind,
            gap.at_seconds,
            gap.reason
        ));
        self.with_bar(|bar| bar.inc(1));
    }

    fn synthesis_finished(&self) {
        if let Ok(mut slot) = self.bar.lock()
            && let Some(bar) = slot.take()
        {
            bar.finish_and_clear();
        }
    }
}

/// Lines describing what a run produced.
pub fn summary_lines(report: &RunReport) -> Vec<String> {
    let mut lines = Vec::new();
    if !report.script.title.is_empty() {
        lines.push(format!("{} {}", "Title:".dimmed(), report.script.title.bold()));
    }
    lines.push(format!(
        "{} {} topics, {} turns{}",
        "Script:".dimmed(),
        report.script.topics.len(),
        report.script.total_turns(),
        if report.translated { " (translated)" } else { "" }
    ));

    let outputs = [
        ("Audio:", &report.audio_path),
        ("Subtitles:", &report.subtitle_path),
        ("Export:", &report.export_path),
        ("Script file:", &report.script_path),
        ("Translation:", &report.translated_script_path),
    ];
    for (label, path) in outputs {
        if let Some(path) = path {
            lines.push(format!("{} {}", label.dimmed(), path.display()));
        }
    }

    if let Some(seconds) = report.total_duration_seconds {
        lines.push(format!("{} {}", "Duration:".dimmed(), format_duration(seconds)));
    }
    if !report.gaps.is_empty() {
        lines.push(format!(
            "{}",
            format!("{} segment(s) skipped after synthesis failures", report.gaps.len()).yellow()
        ));
    }
    lines.push(format!("{} {}", "Timing:".dimmed(), report.timings.summary()));
    lines
}

pub fn print_summary(report: &RunReport) {
    eprintln!("{}", "Podcast ready".green().bold());
    for line in summary_lines(report) {
        eprintln!("  {line}");
    }
}

/// `754.2` → `12:34`
fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::types::{PodcastScript, Topic, Turn};
    use crate::pipeline::StageTimings;
    use chrono::Local;
    use std::path::PathBuf;

    fn script() -> TopicScript {
        TopicScript::new(
            Topic {
                id: 1,
                text: "Storage".to_string(),
            },
            vec![Turn {
                topic_id: 1,
                speaker: Speaker::Guest,
                content: " Batteries are cheaper. ".to_string(),
                turn_index: 0,
            }],
        )
    }

    #[test]
    fn topic_lines_show_announcement_and_turns() {
        let lines = topic_lines(&script());
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Topic 2: Storage"));
        assert!(lines[1].contains("Guest:"));
        assert!(lines[1].ends_with("Batteries are cheaper."));
    }

    #[test]
    fn duration_formats_as_minutes() {
        assert_eq!(format_duration(754.2), "12:34");
        assert_eq!(format_duration(5.0), "0:05");
    }

    #[test]
    fn summary_lists_written_files_and_gaps() {
        let report = RunReport {
            script: PodcastScript {
                created_at: Local::now(),
                document_path: "doc.txt".to_string(),
                title: "Cheap Sun".to_string(),
                description: String::new(),
                intro: String::new(),
                outro: String::new(),
                topics: vec![script()],
                language: None,
            },
            translated: false,
            script_path: None,
            translated_script_path: None,
            audio_path: Some(PathBuf::from("out/podcast.wav")),
            subtitle_path: None,
            export_path: None,
            total_duration_seconds: Some(34.0),
            gaps: vec![Gap {
                kind: crate::timeline::SegmentKind::Turn,
                topic_id: Some(1),
                turn_index: Some(0),
                at_seconds: 3.0,
                reason: "boom".to_string(),
            }],
            timings: StageTimings::default(),
        };
        let text = summary_lines(&report).join("\n");
        assert!(text.contains("Cheap Sun"));
        assert!(text.contains("out/podcast.wav"));
        assert!(text.contains("0:34"));
        assert!(text.contains("1 segment(s) skipped"));
        assert!(!text.contains("Subtitles:"));
    }

    #[test]
    fn observer_without_bar_ignores_segments() {
        let observer = ConsoleObserver::new(false, false);
        observer.synthesis_started(3);
        observer.synthesis_finished();
        assert!(observer.bar.lock().unwrap().is_none());
    }
}
