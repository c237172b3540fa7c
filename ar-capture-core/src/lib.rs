//! # ar-capture-core
//!
//! Platform-agnostic core of an AR compositing and capture pipeline.
//!
//! Each render tick pulls a tracking frame, draws the camera background and a
//! video overlay per tracked anchor, and while recording draws the same scene
//! a second time into a hardware encoder's input surface. Microphone audio is
//! encoded on its own thread. Both tracks meet in a single container through
//! the [`MuxSynchronizer`].
//!
//! Platform backends (tracking, EGL, codecs, microphone, container, GL
//! drawing) implement the traits in [`traits`] and are injected into
//! [`Recorder`] and [`FrameDriver`].
//!
//! ## Architecture
//!
//! ```text
//! ar-capture-core (this crate)
//! ├── traits/       ← TrackingProvider, EglApi, SceneRenderer, VideoSource, codecs, Microphone, RecorderDelegate
//! ├── models/       ← errors, RecordingConfig/EncoderSettings, media formats, tracking frames, states
//! ├── processing/   ← presentation/audio clocks, PCM helpers
//! ├── encode/       ← encoder drain loop, video track, audio capture thread
//! ├── mux/          ← MuxSynchronizer
//! ├── session/      ← FrameDriver, EncoderSurfaceBridge, Recorder
//! └── storage/      ← checksum, metadata sidecar
//! ```

pub mod encode;
pub mod models;
pub mod mux;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types at crate root for convenience.
pub use encode::audio_track::{AudioCapture, AudioCaptureReport};
pub use encode::drain::{DrainOutcome, TrackWriter};
pub use encode::video_track::VideoTrack;
pub use models::config::{EncoderSettings, RecordingConfig};
pub use models::error::{CodecError, GraphicsError, RecordError, TrackingError};
pub use models::frame::{Pose, TextureId, TrackedAnchor, TrackingFrame, TrackingState};
pub use models::media::{
    AudioFormat, BufferFlags, BufferInfo, DequeueOutput, EncodedBuffer, MediaFormat, TrackKind, VideoFormat,
};
pub use models::recording_result::{RecordingMetadata, RecordingResult};
pub use models::state::{DriverState, RecorderState};
pub use mux::synchronizer::{MuxStats, MuxSynchronizer};
pub use processing::clock::{AudioClock, PresentationClock};
pub use session::frame_driver::{FrameDriver, FrameSignal, TickOutcome};
pub use session::recorder::{Recorder, RecordingStatus};
pub use session::surface_bridge::{ConfigSource, EncoderSurfaceBridge};
pub use traits::codec::{AudioEncoder, ContainerWriter, EncoderOutput, MediaPlatform, VideoEncoder};
pub use traits::graphics::{EglApi, SceneRenderer, SceneTextures, VideoSource};
pub use traits::microphone::Microphone;
pub use traits::recorder_delegate::RecorderDelegate;
pub use traits::tracking::TrackingProvider;
