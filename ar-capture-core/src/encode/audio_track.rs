use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::encode::drain::{DrainOutcome, TrackWriter};
use crate::models::config::EncoderSettings;
use crate::models::error::CodecError;
use crate::models::media::TrackKind;
use crate::mux::synchronizer::MuxSynchronizer;
use crate::processing::clock::AudioClock;
use crate::processing::pcm;
use crate::traits::codec::{AudioEncoder, MediaPlatform};
use crate::traits::microphone::Microphone;

/// What the audio thread did before it exited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioCaptureReport {
    pub buffers_read: u64,
    pub buffers_queued: u64,
    /// Audio read from the microphone, by sample count.
    pub captured_us: i64,
    pub samples_written: u64,
    pub end_of_stream: bool,
    pub microphone_failed: bool,
    pub peak_level: f32,
}

/// Set by the audio thread on exit so `stop` can wait with a deadline.
#[derive(Default)]
struct Completion {
    done: Mutex<bool>,
    signal: Condvar,
}

impl Completion {
    fn mark_done(&self) {
        *self.done.lock() = true;
        self.signal.notify_all();
    }

    fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut done = self.done.lock();
        while !*done {
            if self.signal.wait_until(&mut done, deadline).timed_out() {
                break;
            }
        }
        *done
    }
}

/// Marks completion even if the capture loop panics.
struct CompletionGuard(Arc<Completion>);

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.0.mark_done();
    }
}

/// Handle to the dedicated microphone → AAC thread.
///
/// The thread reads PCM with bounded timeouts, stamps each buffer with
/// wall-clock time since thread start, feeds the encoder and drains it into
/// the shared [`MuxSynchronizer`].
pub struct AudioCapture {
    running: Arc<AtomicBool>,
    completion: Arc<Completion>,
    handle: Option<thread::JoinHandle<AudioCaptureReport>>,
}

impl AudioCapture {
    pub fn spawn(
        microphone: Box<dyn Microphone>,
        encoder: Box<dyn AudioEncoder>,
        mux: Arc<MuxSynchronizer>,
        platform: Arc<dyn MediaPlatform>,
        settings: &EncoderSettings,
    ) -> Result<Self, CodecError> {
        let running = Arc::new(AtomicBool::new(true));
        let completion = Arc::new(Completion::default());

        let audio_loop = AudioLoop {
            microphone,
            encoder,
            writer: TrackWriter::new(TrackKind::Audio, mux),
            platform,
            running: Arc::clone(&running),
            timeout: settings.drain_timeout,
            max_eos_polls: settings.max_eos_polls,
            buffer_samples: settings.audio_samples_per_buffer * settings.audio_channels as usize,
            sample_rate: settings.audio_sample_rate,
            channels: settings.audio_channels,
            last_pts_us: 0,
            report: AudioCaptureReport::default(),
        };

        let guard = CompletionGuard(Arc::clone(&completion));
        let handle = thread::Builder::new()
            .name("ar-audio-capture".into())
            .spawn(move || {
                let _guard = guard;
                audio_loop.run()
            })
            .map_err(|e| CodecError::MicrophoneUnavailable(format!("failed to spawn audio thread: {}", e)))?;

        Ok(Self {
            running,
            completion,
            handle: Some(handle),
        })
    }

    /// Ask the thread to stop reading; it then flushes the encoder and exits.
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether the thread is still inside its capture loop.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst) && !*self.completion.done.lock()
    }

    /// Wait up to `timeout` for the thread to exit.
    ///
    /// On timeout the thread is detached and `None` is returned; teardown may
    /// then proceed with a possibly truncated final audio buffer.
    pub fn join(mut self, timeout: Duration) -> Option<AudioCaptureReport> {
        self.request_stop();
        let handle = self.handle.take()?;

        if !self.completion.wait(timeout) {
            log::warn!(
                "Audio thread did not finish within {:?}; continuing teardown",
                timeout
            );
            return None;
        }

        match handle.join() {
            Ok(report) => Some(report),
            Err(_) => {
                log::error!("Audio thread panicked");
                None
            }
        }
    }
}

struct AudioLoop {
    microphone: Box<dyn Microphone>,
    encoder: Box<dyn AudioEncoder>,
    writer: TrackWriter,
    platform: Arc<dyn MediaPlatform>,
    running: Arc<AtomicBool>,
    timeout: Duration,
    max_eos_polls: u32,
    buffer_samples: usize,
    sample_rate: u32,
    channels: u16,
    last_pts_us: i64,
    report: AudioCaptureReport,
}

impl AudioLoop {
    fn run(mut self) -> AudioCaptureReport {
        self.platform.raise_audio_thread_priority();
        log::info!("Audio capture thread started");

        match self.microphone.start() {
            Ok(()) => self.capture(),
            Err(e) => {
                log::error!("Microphone failed to start, recording video only: {}", e);
                self.report.microphone_failed = true;
            }
        }

        if let Err(e) = self.microphone.stop() {
            log::warn!("Failed to stop microphone: {}", e);
        }

        self.finish_stream();

        if self.writer.track_index().is_none() {
            // The format never arrived; let the container start without audio.
            self.writer.mux().abandon_track();
        }

        if let Err(e) = self.encoder.stop() {
            log::error!("Failed to stop audio encoder: {}", e);
        }
        self.encoder.release();
        self.microphone.release();

        self.report.samples_written = self.writer.samples_written();
        self.report.end_of_stream = self.writer.is_end_of_stream();
        log::info!(
            "Audio capture thread exiting: {} buffers read, {} samples written",
            self.report.buffers_read,
            self.report.samples_written
        );
        self.report
    }

    fn capture(&mut self) {
        let mut clock = AudioClock::start();
        let mut samples = vec![0i16; self.buffer_samples];

        while self.running.load(Ordering::SeqCst) {
            match self.microphone.read(&mut samples, self.timeout) {
                Ok(0) => {}
                Ok(read) => {
                    let read = read.min(samples.len());
                    self.report.buffers_read += 1;
                    self.report.captured_us += pcm::duration_us(read, self.sample_rate, self.channels);
                    self.report.peak_level = self.report.peak_level.max(pcm::peak_level(&samples[..read]));
                    let pts = clock.now_us();
                    self.last_pts_us = pts;
                    let data = pcm::samples_to_le_bytes(&samples[..read]);
                    if let Err(e) = self.feed(&data, pts, false) {
                        log::warn!("Dropped audio buffer: {}", e);
                    }
                }
                Err(e) => {
                    log::error!("Microphone read failed, recording video only: {}", e);
                    self.report.microphone_failed = true;
                    break;
                }
            }

            if let Err(e) = self
                .writer
                .drain(self.encoder.as_mut(), false, self.timeout, self.max_eos_polls)
            {
                log::warn!("Audio drain failed, retrying: {}", e);
            }
        }
    }

    /// Queue `data` into a free input buffer. Returns whether it was queued.
    fn feed(&mut self, data: &[u8], presentation_time_us: i64, end_of_stream: bool) -> Result<bool, CodecError> {
        match self.encoder.dequeue_input(self.timeout)? {
            Some(index) => {
                self.encoder
                    .queue_input(index, data, presentation_time_us, end_of_stream)?;
                self.report.buffers_queued += 1;
                Ok(true)
            }
            None => {
                log::debug!("No free audio input buffer within {:?}", self.timeout);
                Ok(false)
            }
        }
    }

    /// Queue one empty end-of-stream buffer and drain to completion.
    fn finish_stream(&mut self) {
        // The end-of-stream buffer carries no audio, so it reuses the last timestamp.
        let eos_pts = self.last_pts_us;
        let mut queued = false;
        for _ in 0..self.max_eos_polls {
            match self.feed(&[], eos_pts, true) {
                Ok(true) => {
                    queued = true;
                    break;
                }
                Ok(false) => {}
                Err(e) => {
                    log::error!("Failed to queue audio end of stream: {}", e);
                    break;
                }
            }
        }
        if !queued {
            log::warn!("Audio end of stream was not queued");
            return;
        }

        match self
            .writer
            .drain(self.encoder.as_mut(), true, self.timeout, self.max_eos_polls)
        {
            Ok(DrainOutcome::EndOfStream) => {}
            Ok(DrainOutcome::Pending) => log::warn!("Audio encoder did not flush completely"),
            Err(e) => log::error!("Final audio drain failed: {}", e),
        }
    }
}
