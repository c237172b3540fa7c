use std::time::Duration;

use crate::models::error::CodecError;

/// A platform microphone delivering 16-bit PCM.
///
/// Opened by the recorder on the caller's thread, then moved to and used
/// exclusively from the audio thread.
pub trait Microphone: Send {
    /// Start delivering audio. Called once from the audio thread.
    fn start(&mut self) -> Result<(), CodecError>;

    /// Read up to `buf.len()` interleaved samples, waiting at most `timeout`.
    ///
    /// Returns the number of samples read; `Ok(0)` means no audio arrived in
    /// time and is not an error.
    fn read(&mut self, buf: &mut [i16], timeout: Duration) -> Result<usize, CodecError>;

    /// Stop capture.
    fn stop(&mut self) -> Result<(), CodecError>;

    /// Release the device. Must be safe after `stop` or without `start`.
    fn release(&mut self);
}
