use bitflags::bitflags;
use serde::{Deserialize, Serialize};

pub const MIME_AVC: &str = "video/avc";
pub const MIME_AAC: &str = "audio/mp4a-latm";

/// Kind of elementary stream carried by a container track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
}

/// AAC object type requested from the audio encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AacProfile {
    /// AAC Low Complexity (object type 2).
    Lc,
}

/// How the video encoder receives frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSource {
    /// Frames arrive through the encoder's input window (GPU surface).
    Surface,
}

/// Requested or reported H.264 stream format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFormat {
    pub mime: &'static str,
    pub width: u32,
    pub height: u32,
    pub bit_rate: u32,
    pub frame_rate: u32,
    pub i_frame_interval_secs: u32,
    pub color_source: ColorSource,
    /// Codec-specific data (SPS/PPS) once the encoder reports it.
    pub codec_specific: Vec<Vec<u8>>,
}

/// Requested or reported AAC stream format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFormat {
    pub mime: &'static str,
    pub sample_rate: u32,
    pub channel_count: u16,
    pub bit_rate: u32,
    pub profile: AacProfile,
    /// Largest PCM input buffer the encoder must accept, in bytes.
    pub max_input_size: usize,
    /// Codec-specific data (AudioSpecificConfig) once the encoder reports it.
    pub codec_specific: Vec<Vec<u8>>,
}

/// Output format of one encoder, handed to the container when the track is added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaFormat {
    Video(VideoFormat),
    Audio(AudioFormat),
}

impl MediaFormat {
    pub fn kind(&self) -> TrackKind {
        match self {
            Self::Video(_) => TrackKind::Video,
            Self::Audio(_) => TrackKind::Audio,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Video(v) => v.mime,
            Self::Audio(a) => a.mime,
        }
    }
}

bitflags! {
    /// Per-buffer flags reported by an encoder alongside each output buffer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BufferFlags: u32 {
        const KEY_FRAME = 0b0001;
        /// Payload holds codec configuration only (already carried by the format).
        const CODEC_CONFIG = 0b0010;
        const END_OF_STREAM = 0b0100;
    }
}

/// Metadata of one encoded access unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferInfo {
    pub offset: usize,
    pub size: usize,
    pub presentation_time_us: i64,
    pub flags: BufferFlags,
}

impl BufferInfo {
    pub fn is_end_of_stream(&self) -> bool {
        self.flags.contains(BufferFlags::END_OF_STREAM)
    }

    pub fn is_codec_config(&self) -> bool {
        self.flags.contains(BufferFlags::CODEC_CONFIG)
    }
}

/// An output buffer dequeued from an encoder. `index` must be handed back
/// through `release_output` once the payload has been consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBuffer {
    pub index: usize,
    pub data: Vec<u8>,
    pub info: BufferInfo,
}

impl EncodedBuffer {
    /// The payload window described by `info`, clamped to the backing data.
    pub fn payload(&self) -> &[u8] {
        let start = self.info.offset.min(self.data.len());
        let end = self.info.offset.saturating_add(self.info.size).min(self.data.len());
        &self.data[start..end]
    }
}

/// Result of one non-blocking output dequeue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DequeueOutput {
    /// Nothing available within the timeout.
    TryAgainLater,
    /// The encoder now knows its output format. Reported once per encoder.
    FormatChanged(MediaFormat),
    Buffer(EncodedBuffer),
}
