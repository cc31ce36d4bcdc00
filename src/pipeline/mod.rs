//! Podcast generation pipeline.
//!
//! Sequences the content, translation, synthesis, mixing and export stages,
//! and owns the decision whether a failure aborts the run.

pub mod orchestrator;
pub mod script_file;
pub mod stages;

pub use orchestrator::{PodcastPipeline, RunReport};
pub use stages::{
    NoopObserver, RunControl, RunObserver, SegmentOutcome, Stage, StageFlags, StageTimings,
};
