//! Sample-level audio helpers shared by speech synthesis and mixing.

pub mod gain;
pub mod wav;

pub use wav::MonoAudio;
