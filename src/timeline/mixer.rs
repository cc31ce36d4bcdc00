//! Background music under the foreground timeline.

use crate::audio::gain::{apply_fades, apply_gain, db_to_gain, hard_clamp};
use crate::audio::wav;
use crate::error::{PodcastError, Result};
use crate::timeline::assembler::Timeline;
use std::path::Path;

/// Background level per episode phase, in dB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseVolumes {
    pub intro_db: f32,
    pub content_db: f32,
    pub outro_db: f32,
}

/// Background music, decoded and resampled once.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundTrack {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub volumes: PhaseVolumes,
}

impl BackgroundTrack {
    /// Load a WAV file and resample it to `sample_rate`.
    ///
    /// Any problem with the file is a `Mixing` error; callers fall back to
    /// a vocal-only render.
    pub fn load(path: &Path, sample_rate: u32, volumes: PhaseVolumes) -> Result<Self> {
        let is_wav = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
        if !is_wav {
            return Err(PodcastError::Mixing {
                message: format!(
                    "unsupported background format for {} (only WAV is supported)",
                    path.display()
                ),
            });
        }

        let audio = wav::read_file(path).map_err(|e| PodcastError::Mixing {
            message: e.to_string(),
        })?;
        Self::from_samples(audio.samples, audio.sample_rate, sample_rate, volumes)
    }

    /// Build from decoded samples, resampling from `source_rate`.
    pub fn from_samples(
        samples: Vec<f32>,
        source_rate: u32,
        sample_rate: u32,
        volumes: PhaseVolumes,
    ) -> Result<Self> {
        if samples.is_empty() {
            return Err(PodcastError::Mixing {
                message: "background track is empty".to_string(),
            });
        }
        let samples = if source_rate != sample_rate {
            tracing::debug!(from = source_rate, to = sample_rate, "Resampling background");
            wav::resample(&samples, source_rate, sample_rate)
        } else {
            samples
        };
        Ok(Self {
            samples,
            sample_rate,
            volumes,
        })
    }

    /// Sample at `index`, looping when the track is shorter than the episode.
    fn looped(&self, index: usize) -> f32 {
        self.samples[index % self.samples.len()]
    }
}

/// Levels applied when rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixSettings {
    pub vocal_volume_db: f32,
    pub crossfade_ms: u32,
    pub fade_ms: u32,
}

/// Per-sample background gain with linear crossfades centred on the
/// intro/content and content/outro boundaries.
///
/// A content phase shorter than the crossfade narrows both ramps to half
/// its length, so they meet at its midpoint instead of overlapping.
struct Envelope {
    intro_gain: f32,
    content_gain: f32,
    outro_gain: f32,
    intro_end: Option<usize>,
    outro_start: Option<usize>,
    half_crossfade: usize,
    boundary_half: usize,
}

impl Envelope {
    fn new(timeline: &Timeline, volumes: PhaseVolumes, crossfade_samples: usize) -> Self {
        let total = timeline.samples.len();
        let intro_end = timeline.intro_end_sample();
        let outro_start = timeline.outro_start_sample();
        let intro_end = (intro_end > 0).then_some(intro_end);
        let outro_start = (outro_start < total).then_some(outro_start);

        let half_crossfade = crossfade_samples / 2;
        let boundary_half = match (intro_end, outro_start) {
            (Some(end), Some(start)) => half_crossfade.min(start.saturating_sub(end) / 2),
            _ => half_crossfade,
        };
        Self {
            intro_gain: db_to_gain(volumes.intro_db),
            content_gain: db_to_gain(volumes.content_db),
            outro_gain: db_to_gain(volumes.outro_db),
            intro_end,
            outro_start,
            half_crossfade,
            boundary_half,
        }
    }

    fn gain_at(&self, i: usize) -> f32 {
        // Outro straight after the intro: one ramp between the two
        if let (Some(end), Some(start)) = (self.intro_end, self.outro_start)
            && end == start
        {
            return Self::crossfade(i, end, self.half_crossfade, self.intro_gain, self.outro_gain)
                .unwrap_or(if i < end { self.intro_gain } else { self.outro_gain });
        }

        let half = self.boundary_half;
        if let Some(boundary) = self.intro_end
            && let Some(gain) =
                Self::crossfade(i, boundary, half, self.intro_gain, self.content_gain)
        {
            return gain;
        }
        if let Some(boundary) = self.outro_start
            && let Some(gain) =
                Self::crossfade(i, boundary, half, self.content_gain, self.outro_gain)
        {
            return gain;
        }

        if self.intro_end.is_some_and(|end| i < end) {
            self.intro_gain
        } else if self.outro_start.is_some_and(|start| i >= start) {
            self.outro_gain
        } else {
            self.content_gain
        }
    }

    fn crossfade(i: usize, boundary: usize, half: usize, from: f32, to: f32) -> Option<f32> {
        if half == 0 {
            return None;
        }
        let lo = boundary.saturating_sub(half);
        let hi = boundary + half;
        if i < lo || i >= hi {
            return None;
        }
        let t = (i - lo) as f32 / (hi - lo) as f32;
        Some(from + (to - from) * t)
    }
}

/// Render the final mix.
///
/// Foreground is scaled by the vocal volume; the background, when present,
/// is enveloped per phase and added under it. The result is clamped to
/// `[-1, 1]`, faded in and out, and has exactly the foreground's length.
pub fn render(
    timeline: &Timeline,
    background: Option<&BackgroundTrack>,
    settings: &MixSettings,
) -> Result<Vec<f32>> {
    let mut mix = timeline.samples.clone();
    apply_gain(&mut mix, db_to_gain(settings.vocal_volume_db));

    if let Some(track) = background {
        if track.sample_rate != timeline.sample_rate {
            return Err(PodcastError::Mixing {
                message: format!(
                    "background runs at {} Hz, timeline at {} Hz",
                    track.sample_rate, timeline.sample_rate
                ),
            });
        }
        if track.samples.is_empty() {
            return Err(PodcastError::Mixing {
                message: "background track is empty".to_string(),
            });
        }

        let crossfade = wav::samples_for_ms(settings.crossfade_ms, timeline.sample_rate);
        let envelope = Envelope::new(timeline, track.volumes, crossfade);
        for (i, sample) in mix.iter_mut().enumerate() {
            *sample += track.looped(i) * envelope.gain_at(i);
        }
    }

    hard_clamp(&mut mix);
    apply_fades(
        &mut mix,
        wav::samples_for_ms(settings.fade_ms, timeline.sample_rate),
    );
    Ok(mix)
}
