//! Stage selection, run cancellation and stage timing.

use crate::content::types::TopicScript;
use crate::error::{PodcastError, Result};
use crate::timeline::segment::{AudioSegment, Gap, SegmentKind, SegmentRef, TimedSegment};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// How often a guarded call re-checks the cancel flag.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Stages the user asked to skip. Read once by the driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageFlags {
    /// Reuse the saved script instead of calling the generators
    pub skip_content: bool,
    pub skip_translation: bool,
    /// Stop after the text stages; no audio, subtitles or timings
    pub skip_audio: bool,
}

/// Named pipeline stages, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Document,
    Content,
    Translation,
    Synthesis,
    Mixing,
    Export,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Document => "document",
            Stage::Content => "content",
            Stage::Translation => "translation",
            Stage::Synthesis => "synthesis",
            Stage::Mixing => "mixing",
            Stage::Export => "export",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run-wide cancellation: an external flag (Ctrl-C) plus an optional
/// deadline (`--timeout`). Clones share the same flag.
#[derive(Debug, Clone)]
pub struct RunControl {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

impl RunControl {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: None,
        }
    }

    /// Cancel the run once `timeout` has elapsed from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Flag shared with signal handlers.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Why the run must stop, if it must.
    fn stop_reason(&self) -> Option<String> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Some("interrupted".to_string());
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some("timeout reached".to_string()),
            _ => None,
        }
    }

    /// Fail with `Cancelled` if the run has been stopped.
    pub fn check(&self) -> Result<()> {
        match self.stop_reason() {
            Some(reason) => Err(PodcastError::Cancelled { reason }),
            None => Ok(()),
        }
    }

    /// Run `work` unless the run is stopped first; in-flight work is
    /// dropped on cancellation.
    pub async fn guard<T, F>(&self, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;
        tokio::select! {
            biased;
            reason = self.stopped() => Err(PodcastError::Cancelled { reason }),
            result = work => result,
        }
    }

    async fn stopped(&self) -> String {
        loop {
            if let Some(reason) = self.stop_reason() {
                return reason;
            }
            let mut wait = CANCEL_POLL_INTERVAL;
            if let Some(deadline) = self.deadline {
                wait = wait.min(deadline.saturating_duration_since(Instant::now()));
            }
            tokio::time::sleep(wait).await;
        }
    }
}

/// Wall time spent per stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageTimings {
    entries: Vec<(Stage, Duration)>,
}

impl StageTimings {
    pub fn record(&mut self, stage: Stage, elapsed: Duration) {
        self.entries.push((stage, elapsed));
    }

    pub fn get(&self, stage: Stage) -> Option<Duration> {
        self.entries
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, d)| *d)
    }

    pub fn entries(&self) -> &[(Stage, Duration)] {
        &self.entries
    }

    pub fn total(&self) -> Duration {
        self.entries.iter().map(|(_, d)| *d).sum()
    }

    /// One-line summary such as `content 12.3s, synthesis 40.1s (total 52.4s)`.
    pub fn summary(&self) -> String {
        if self.entries.is_empty() {
            return "no stages ran".to_string();
        }
        let parts: Vec<String> = self
            .entries
            .iter()
            .map(|(stage, d)| format!("{stage} {:.1}s", d.as_secs_f64()))
            .collect();
        format!("{} (total {:.1}s)", parts.join(", "), self.total().as_secs_f64())
    }
}

/// Result of trying to synthesize one segment.
#[derive(Debug)]
pub enum SegmentOutcome {
    Rendered(AudioSegment),
    /// Synthesis failed and the run continues without this segment
    Skipped {
        kind: SegmentKind,
        reference: SegmentRef,
        reason: String,
    },
}

/// Progress callbacks from a running pipeline. All methods default to
/// doing nothing.
pub trait RunObserver: Send + Sync {
    fn stage_started(&self, _stage: Stage) {}

    fn stage_finished(&self, _stage: Stage, _elapsed: Duration) {}

    /// A topic's dialogue is final (generated, loaded or translated).
    fn topic_ready(&self, _script: &TopicScript) {}

    /// Synthesis is about to produce `total` segments.
    fn synthesis_started(&self, _total: usize) {}

    fn segment_placed(&self, _segment: &TimedSegment) {}

    fn segment_skipped(&self, _gap: &Gap) {}

    fn synthesis_finished(&self) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timings_summary_lists_stages_in_order() {
        let mut timings = StageTimings::default();
        timings.record(Stage::Content, Duration::from_millis(1500));
        timings.record(Stage::Synthesis, Duration::from_millis(2500));
        assert_eq!(
            timings.summary(),
            "content 1.5s, synthesis 2.5s (total 4.0s)"
        );
        assert_eq!(timings.get(Stage::Synthesis), Some(Duration::from_millis(2500)));
        assert_eq!(timings.get(Stage::Mixing), None);
    }

    #[test]
    fn empty_timings_summary() {
        assert_eq!(StageTimings::default().summary(), "no stages ran");
    }

    #[test]
    fn cancel_flag_is_shared_between_clones() {
        let control = RunControl::new();
        let clone = control.clone();
        assert!(control.check().is_ok());

        clone.cancel_flag().store(true, Ordering::SeqCst);
        let err = control.check().unwrap_err();
        assert!(matches!(err, PodcastError::Cancelled { ref reason } if reason == "interrupted"));
    }

    #[tokio::test]
    async fn guard_passes_through_result() {
        let control = RunControl::new();
        let value = control.guard(async { Ok(42) }).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn guard_drops_work_after_deadline() {
        let control = RunControl::new().with_timeout(Duration::from_millis(50));
        let started = std::time::Instant::now();
        let err = control
            .guard(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PodcastError::Cancelled { ref reason } if reason == "timeout reached"));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn guard_stops_on_external_cancel() {
        let control = RunControl::new();
        let flag = control.cancel_flag();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            flag.store(true, Ordering::SeqCst);
        });
        let err = control
            .guard(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PodcastError::Cancelled { .. }));
    }

    #[tokio::test]
    async fn guard_refuses_to_start_when_cancelled() {
        let control = RunControl::new();
        control.cancel();
        let ran = AtomicBool::new(false);
        let result = control
            .guard(async {
                ran.store(true, Ordering::SeqCst);
                Ok(())
            })
            .await;
        assert!(result.is_err());
        assert!(!ran.load(Ordering::SeqCst));
    }
}
