use std::sync::Arc;
use std::time::Duration;

use crate::encode::drain::{DrainOutcome, TrackWriter};
use crate::models::config::EncoderSettings;
use crate::models::media::TrackKind;
use crate::mux::synchronizer::MuxSynchronizer;
use crate::traits::codec::VideoEncoder;
use crate::traits::graphics::NativeWindowHandle;

/// H.264 track fed through the encoder's input surface and drained on the
/// render thread after every recorded frame.
pub struct VideoTrack {
    encoder: Box<dyn VideoEncoder>,
    writer: TrackWriter,
    timeout: Duration,
    max_eos_polls: u32,
    released: bool,
}

impl VideoTrack {
    pub fn new(encoder: Box<dyn VideoEncoder>, mux: Arc<MuxSynchronizer>, settings: &EncoderSettings) -> Self {
        Self {
            encoder,
            writer: TrackWriter::new(TrackKind::Video, mux),
            timeout: settings.drain_timeout,
            max_eos_polls: settings.max_eos_polls,
            released: false,
        }
    }

    pub fn input_window(&self) -> NativeWindowHandle {
        self.encoder.input_window()
    }

    /// Non-blocking drain. Errors are logged and the drain is retried on the
    /// next frame.
    pub fn drain(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self
            .writer
            .drain(self.encoder.as_mut(), false, self.timeout, self.max_eos_polls)
        {
            log::warn!("Video drain failed, retrying next frame: {}", e);
        }
    }

    /// Signal end of input and drain everything the encoder still holds.
    pub fn finish(&mut self) -> DrainOutcome {
        if self.released {
            return DrainOutcome::Pending;
        }
        if self.writer.is_end_of_stream() {
            return DrainOutcome::EndOfStream;
        }
        if let Err(e) = self.encoder.signal_end_of_input() {
            log::error!("Failed to signal end of video input: {}", e);
        }
        match self
            .writer
            .drain(self.encoder.as_mut(), true, self.timeout, self.max_eos_polls)
        {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("Final video drain failed: {}", e);
                DrainOutcome::Pending
            }
        }
    }

    /// Stop and free the encoder. Idempotent.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.encoder.stop() {
            log::error!("Failed to stop video encoder: {}", e);
        }
        self.encoder.release();
        self.released = true;
    }

    pub fn track_index(&self) -> Option<usize> {
        self.writer.track_index()
    }

    pub fn samples_written(&self) -> u64 {
        self.writer.samples_written()
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.writer.is_end_of_stream()
    }
}
