//! Audio timeline: segment placement, background mixing and the outputs
//! derived from segment timing.

pub mod assembler;
pub mod export;
pub mod mixer;
pub mod segment;
pub mod subtitles;

pub use assembler::{Timeline, TimelineAssembler};
pub use export::{ConversationExporter, ConversationRecord};
pub use mixer::{BackgroundTrack, MixSettings, PhaseVolumes};
pub use segment::{AudioSegment, Gap, SegmentKind, SegmentRef, TimedSegment};
pub use subtitles::SubtitleFormat;
