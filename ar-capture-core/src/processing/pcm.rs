//! 16-bit PCM helpers for the microphone → AAC path.

/// Serialize interleaved 16-bit samples to little-endian bytes, the layout
/// hardware AAC encoders accept as raw PCM input.
pub fn samples_to_le_bytes(samples: &[i16]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        data.extend_from_slice(&sample.to_le_bytes());
    }
    data
}

/// Playback duration of `samples` interleaved samples, in microseconds.
pub fn duration_us(samples: usize, sample_rate: u32, channels: u16) -> i64 {
    if sample_rate == 0 || channels == 0 {
        return 0;
    }
    let frames = samples as i64 / channels as i64;
    frames * 1_000_000 / sample_rate as i64
}

/// Peak absolute level of a buffer, normalized to 0.0–1.0.
pub fn peak_level(samples: &[i16]) -> f32 {
    samples
        .iter()
        .map(|s| (*s as i32).unsigned_abs())
        .max()
        .map(|peak| peak as f32 / 32768.0)
        .unwrap_or(0.0)
}
