use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::RecordError;
use super::media::{AacProfile, AudioFormat, ColorSource, VideoFormat, MIME_AAC, MIME_AVC};

/// Encoder and pacing parameters shared by every session.
///
/// Defaults produce H.264 at 6 Mbps / 30 fps with a 2 s keyframe interval and
/// AAC-LC mono at 44.1 kHz / 128 kbps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    pub video_bit_rate: u32,
    pub frame_rate: u32,
    pub i_frame_interval_secs: u32,
    pub audio_sample_rate: u32,
    pub audio_channels: u16,
    pub audio_bit_rate: u32,
    /// PCM samples (per channel) read from the microphone per buffer.
    pub audio_samples_per_buffer: usize,
    /// Timeout for every encoder dequeue and microphone read.
    pub drain_timeout: Duration,
    /// Consecutive empty polls tolerated while draining to end of stream.
    pub max_eos_polls: u32,
    /// How long `stop` waits for the audio thread before tearing down anyway.
    /// Must cover [`EncoderSettings::audio_flush_budget`].
    pub audio_join_timeout: Duration,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            video_bit_rate: 6_000_000,
            frame_rate: 30,
            i_frame_interval_secs: 2,
            audio_sample_rate: 44_100,
            audio_channels: 1,
            audio_bit_rate: 128_000,
            audio_samples_per_buffer: 1024,
            drain_timeout: Duration::from_millis(10),
            max_eos_polls: 20,
            audio_join_timeout: Duration::from_millis(500),
        }
    }
}

impl EncoderSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.video_bit_rate == 0 {
            return Err("video bit rate must be positive".into());
        }
        if self.frame_rate == 0 {
            return Err("frame rate must be positive".into());
        }
        if self.audio_sample_rate == 0 {
            return Err("audio sample rate must be positive".into());
        }
        if ![1, 2].contains(&self.audio_channels) {
            return Err(format!("unsupported channel count: {}", self.audio_channels));
        }
        if self.audio_samples_per_buffer == 0 {
            return Err("audio buffer must hold at least one sample".into());
        }
        if self.audio_join_timeout < self.audio_flush_budget() {
            return Err(format!(
                "audio join timeout {:?} is shorter than the audio flush ({:?})",
                self.audio_join_timeout,
                self.audio_flush_budget()
            ));
        }
        Ok(())
    }

    /// Worst case for the audio thread to exit once asked to stop: the read in
    /// progress, then up to `max_eos_polls` waits to queue end of stream and as
    /// many again to drain it.
    pub fn audio_flush_budget(&self) -> Duration {
        self.drain_timeout
            .saturating_mul(self.max_eos_polls.saturating_mul(2).saturating_add(1))
    }

    pub fn video_format(&self, width: u32, height: u32) -> VideoFormat {
        VideoFormat {
            mime: MIME_AVC,
            width,
            height,
            bit_rate: self.video_bit_rate,
            frame_rate: self.frame_rate,
            i_frame_interval_secs: self.i_frame_interval_secs,
            color_source: ColorSource::Surface,
            codec_specific: Vec::new(),
        }
    }

    pub fn audio_format(&self) -> AudioFormat {
        AudioFormat {
            mime: MIME_AAC,
            sample_rate: self.audio_sample_rate,
            channel_count: self.audio_channels,
            bit_rate: self.audio_bit_rate,
            profile: AacProfile::Lc,
            max_input_size: self.audio_buffer_bytes(),
            codec_specific: Vec::new(),
        }
    }

    /// Size in bytes of one 16-bit PCM microphone buffer.
    pub fn audio_buffer_bytes(&self) -> usize {
        self.audio_samples_per_buffer * self.audio_channels as usize * 2
    }
}

/// Per-session recording request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingConfig {
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub audio_enabled: bool,
    /// Write `<output>.metadata.json` next to the recording on stop. This also
    /// hashes the finished file, so `stop` takes longer for long recordings.
    #[serde(default)]
    pub write_metadata: bool,
    #[serde(default)]
    pub encoder: EncoderSettings,
}

impl RecordingConfig {
    pub fn new(output_path: impl Into<PathBuf>, width: u32, height: u32, audio_enabled: bool) -> Self {
        Self {
            output_path: output_path.into(),
            width,
            height,
            audio_enabled,
            write_metadata: false,
            encoder: EncoderSettings::default(),
        }
    }

    /// Dimensions floored to even values, as H.264 requires.
    pub fn even_dimensions(&self) -> Result<(u32, u32), RecordError> {
        let width = self.width & !1;
        let height = self.height & !1;
        if width == 0 || height == 0 {
            return Err(RecordError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok((width, height))
    }

    pub fn validate(&self) -> Result<(u32, u32), RecordError> {
        self.encoder.validate().map_err(RecordError::InvalidConfig)?;
        if self.output_path.as_os_str().is_empty() {
            return Err(RecordError::InvalidConfig("output path is empty".into()));
        }
        self.even_dimensions()
    }
}
