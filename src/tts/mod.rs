//! Speech synthesis: backends and the segment-producing adapter.

pub mod backend;
pub mod http;
pub mod synthesizer;

pub use backend::{SilentBackend, SpeechBackend};
pub use http::HttpSpeechBackend;
pub use synthesizer::{SpeechRequest, SpeechSynthesizer, SynthesisSettings};
