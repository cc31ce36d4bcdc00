//! Level and envelope helpers.

/// Linear amplitude factor for a level in decibels: `10^(dB/20)`.
pub fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Scale every sample by `gain`.
pub fn apply_gain(samples: &mut [f32], gain: f32) {
    if (gain - 1.0).abs() < f32::EPSILON {
        return;
    }
    for sample in samples.iter_mut() {
        *sample *= gain;
    }
}

/// Clamp every sample to `[-1, 1]`.
pub fn hard_clamp(samples: &mut [f32]) {
    for sample in samples.iter_mut() {
        *sample = sample.clamp(-1.0, 1.0);
    }
}

/// Linear fade-in over the first `fade_len` samples and fade-out over the
/// last `fade_len`. Length is unchanged; short buffers fade over half each.
pub fn apply_fades(samples: &mut [f32], fade_len: usize) {
    let fade_len = fade_len.min(samples.len() / 2);
    if fade_len == 0 {
        return;
    }
    let total = samples.len();
    for i in 0..fade_len {
        let factor = i as f32 / fade_len as f32;
        samples[i] *= factor;
        samples[total - 1 - i] *= factor;
    }
}
