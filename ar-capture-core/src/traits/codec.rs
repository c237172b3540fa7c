use std::path::Path;
use std::time::Duration;

use crate::models::error::CodecError;
use crate::models::media::{AudioFormat, BufferInfo, DequeueOutput, MediaFormat, VideoFormat};
use crate::traits::graphics::NativeWindowHandle;
use crate::traits::microphone::Microphone;

/// Output side of an asynchronous hardware encoder.
pub trait EncoderOutput: Send {
    /// Dequeue one output event, waiting at most `timeout`.
    fn dequeue_output(&mut self, timeout: Duration) -> Result<DequeueOutput, CodecError>;

    /// Return a dequeued output buffer to the codec.
    fn release_output(&mut self, index: usize) -> Result<(), CodecError>;

    fn stop(&mut self) -> Result<(), CodecError>;

    /// Free the codec. Must be safe after a failed `stop`.
    fn release(&mut self);
}

/// Hardware H.264 encoder fed through its input window.
pub trait VideoEncoder: EncoderOutput {
    /// Window to create the encoder's EGL surface on.
    fn input_window(&self) -> NativeWindowHandle;

    /// No more frames will be swapped into the input window.
    fn signal_end_of_input(&mut self) -> Result<(), CodecError>;
}

/// Hardware AAC encoder fed with PCM buffers.
pub trait AudioEncoder: EncoderOutput {
    /// Index of a free input buffer, or `None` if none frees up within `timeout`.
    fn dequeue_input(&mut self, timeout: Duration) -> Result<Option<usize>, CodecError>;

    /// Submit PCM bytes into input buffer `index`. An empty `data` with
    /// `end_of_stream` set terminates the stream.
    fn queue_input(
        &mut self,
        index: usize,
        data: &[u8],
        presentation_time_us: i64,
        end_of_stream: bool,
    ) -> Result<(), CodecError>;
}

/// MP4 container writer.
pub trait ContainerWriter: Send {
    fn add_track(&mut self, format: &MediaFormat) -> Result<usize, CodecError>;

    fn start(&mut self) -> Result<(), CodecError>;

    fn write_sample(&mut self, track: usize, data: &[u8], info: &BufferInfo) -> Result<(), CodecError>;

    fn stop(&mut self) -> Result<(), CodecError>;

    fn release(&mut self);
}

/// Factory for the platform codec layer, injected into the recorder.
pub trait MediaPlatform: Send + Sync {
    /// Create and start a configured H.264 encoder with a surface input.
    fn create_video_encoder(&self, format: &VideoFormat) -> Result<Box<dyn VideoEncoder>, CodecError>;

    /// Create and start a configured AAC encoder.
    fn create_audio_encoder(&self, format: &AudioFormat) -> Result<Box<dyn AudioEncoder>, CodecError>;

    /// Open the microphone. Only called for audio-enabled sessions.
    fn open_microphone(&self, format: &AudioFormat) -> Result<Box<dyn Microphone>, CodecError>;

    fn create_container(&self, path: &Path) -> Result<Box<dyn ContainerWriter>, CodecError>;

    /// Raise the calling thread to audio priority. Called from the audio thread.
    fn raise_audio_thread_priority(&self) {}
}
