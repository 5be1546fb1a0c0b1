//! RMS loudness calculation shared by every audio path.
//!
//! The RMS -> dB -> percent formula lives here and only here, so the
//! real-time analyzer and any fallback path agree on thresholds.

/// RMS floor below which a frame is treated as room noise and reported
/// as zero loudness.
pub const DEFAULT_NOISE_FLOOR_RMS: f32 = 0.002;

/// Bottom of the dB range mapped onto the 0-100 percent scale.
const MIN_DB: f32 = -60.0;

/// Convert an RMS amplitude (samples normalized to [-1, 1]) into a
/// loudness percentage in [0, 100].
///
/// The amplitude is mapped through `20 * log10(rms)` and the [-60 dB, 0 dB]
/// range is scaled linearly to [0, 100], clamped at both ends. Anything at
/// or below `threshold_rms` is forced to zero so low-level room noise never
/// registers as loudness. Non-finite or negative input yields zero.
pub fn volume_percent(rms: f32, threshold_rms: f32) -> f32 {
    if !rms.is_finite() || rms < 0.0 {
        return 0.0;
    }
    if rms <= threshold_rms {
        return 0.0;
    }
    // 1e-8 floor keeps log10 finite for an all-zero frame.
    let db = 20.0 * rms.max(1e-8).log10();
    (((db - MIN_DB) / -MIN_DB) * 100.0).clamp(0.0, 100.0)
}

/// RMS of a frame of normalized f32 samples.
pub fn frame_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sq_sum: f32 = samples.iter().map(|&s| s * s).sum();
    (sq_sum / samples.len() as f32).sqrt()
}

/// RMS of a PCM16 frame, normalized to the [-1, 1] scale.
pub fn pcm16_rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sq_sum: f64 = samples
        .iter()
        .map(|&s| {
            let normalized = f64::from(s) / f64::from(i16::MAX);
            normalized * normalized
        })
        .sum();
    (sq_sum / samples.len() as f64).sqrt() as f32
}

/// RMS energy of a PCM16 frame on the raw 16-bit scale.
///
/// Used by the frame-local energy fallback, whose threshold (default 500)
/// is expressed on this scale rather than the normalized one.
pub fn pcm16_energy(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sq_sum: f64 = samples
        .iter()
        .map(|&s| f64::from(s) * f64::from(s))
        .sum();
    (sq_sum / samples.len() as f64).sqrt() as f32
}
