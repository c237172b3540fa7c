use std::sync::Arc;
use std::time::Duration;

use crate::models::error::CodecError;
use crate::models::media::{DequeueOutput, EncodedBuffer, TrackKind};
use crate::mux::synchronizer::MuxSynchronizer;
use crate::traits::codec::EncoderOutput;

/// How a drain pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// The encoder has nothing more for now.
    Pending,
    /// The end-of-stream buffer was consumed.
    EndOfStream,
}

/// Moves one encoder's output into its container track.
///
/// Owns the track's container index (absent until the encoder reports its
/// format) and its end-of-stream flag.
pub struct TrackWriter {
    kind: TrackKind,
    mux: Arc<MuxSynchronizer>,
    track_index: Option<usize>,
    registration_failed: bool,
    end_of_stream: bool,
    samples_written: u64,
    samples_dropped: u64,
}

impl TrackWriter {
    pub fn new(kind: TrackKind, mux: Arc<MuxSynchronizer>) -> Self {
        Self {
            kind,
            mux,
            track_index: None,
            registration_failed: false,
            end_of_stream: false,
            samples_written: 0,
            samples_dropped: 0,
        }
    }

    /// Pull output until the encoder runs dry.
    ///
    /// With `until_eos` set, empty polls are retried (up to `max_empty_polls`)
    /// until the end-of-stream buffer arrives.
    pub fn drain(
        &mut self,
        encoder: &mut dyn EncoderOutput,
        until_eos: bool,
        timeout: Duration,
        max_empty_polls: u32,
    ) -> Result<DrainOutcome, CodecError> {
        if self.end_of_stream {
            return Ok(DrainOutcome::EndOfStream);
        }

        let mut empty_polls = 0;
        loop {
            match encoder.dequeue_output(timeout)? {
                DequeueOutput::TryAgainLater => {
                    if !until_eos {
                        return Ok(DrainOutcome::Pending);
                    }
                    empty_polls += 1;
                    if empty_polls >= max_empty_polls {
                        log::warn!(
                            "{:?} encoder did not reach end of stream after {} polls",
                            self.kind,
                            empty_polls
                        );
                        return Ok(DrainOutcome::Pending);
                    }
                }
                DequeueOutput::FormatChanged(format) => {
                    if self.track_index.is_some() || self.registration_failed {
                        log::warn!("{:?} encoder reported its format twice; ignoring", self.kind);
                        continue;
                    }
                    match self.mux.register_track(&format) {
                        Ok(index) => self.track_index = Some(index),
                        Err(e) => {
                            self.registration_failed = true;
                            return Err(e);
                        }
                    }
                }
                DequeueOutput::Buffer(mut buffer) => {
                    if buffer.info.is_codec_config() {
                        // Already carried by the track format.
                        buffer.info.size = 0;
                    }
                    let written = self.write(&buffer);
                    encoder.release_output(buffer.index)?;
                    written?;

                    if buffer.info.is_end_of_stream() {
                        self.end_of_stream = true;
                        log::debug!("{:?} track reached end of stream", self.kind);
                        return Ok(DrainOutcome::EndOfStream);
                    }
                }
            }
        }
    }

    fn write(&mut self, buffer: &EncodedBuffer) -> Result<(), CodecError> {
        if buffer.info.size == 0 {
            return Ok(());
        }
        let Some(index) = self.track_index else {
            if self.registration_failed {
                log::trace!("{:?} buffer dropped: track was never added", self.kind);
            } else {
                log::warn!("{:?} buffer arrived before its format; dropped", self.kind);
            }
            self.samples_dropped += 1;
            return Ok(());
        };

        if self.mux.write_sample(index, buffer.payload(), &buffer.info)? {
            self.samples_written += 1;
        } else {
            self.samples_dropped += 1;
        }
        Ok(())
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn track_index(&self) -> Option<usize> {
        self.track_index
    }

    /// Whether adding this track (or starting the container with it) failed.
    pub fn registration_failed(&self) -> bool {
        self.registration_failed
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.end_of_stream
    }

    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    /// Samples that never reached the container (before start or without a track).
    pub fn samples_dropped(&self) -> u64 {
        self.samples_dropped
    }

    pub fn mux(&self) -> &Arc<MuxSynchronizer> {
        &self.mux
    }
}
