use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::encode::audio_track::{AudioCapture, AudioCaptureReport};
use crate::encode::video_track::VideoTrack;
use crate::models::config::RecordingConfig;
use crate::models::error::RecordError;
use crate::models::media::TrackKind;
use crate::models::recording_result::{RecordingMetadata, RecordingResult};
use crate::models::state::RecorderState;
use crate::mux::synchronizer::MuxSynchronizer;
use crate::session::surface_bridge::EncoderSurfaceBridge;
use crate::storage::checksum::sha256_file;
use crate::storage::metadata::write_metadata;
use crate::traits::codec::{AudioEncoder, ContainerWriter, MediaPlatform, VideoEncoder};
use crate::traits::graphics::EglApi;
use crate::traits::microphone::Microphone;
use crate::traits::recorder_delegate::RecorderDelegate;

/// Read-only view of the recorder's `is_recording` flag.
///
/// Only the recorder writes it; the render loop polls it every frame without
/// taking the recorder lock.
#[derive(Debug, Clone)]
pub struct RecordingStatus(Arc<AtomicBool>);

impl RecordingStatus {
    pub fn is_recording(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything a running session owns.
struct ActiveSession {
    config: RecordingConfig,
    width: u32,
    height: u32,
    mux: Arc<MuxSynchronizer>,
    bridge: EncoderSurfaceBridge,
    video: VideoTrack,
    audio: Option<AudioCapture>,
    frames_recorded: u64,
    frames_failed: u64,
}

/// Resources created so far by `prepare`. Whatever is still held when this
/// drops is released, so an early `?` return leaks nothing.
#[derive(Default)]
struct PendingResources {
    video_encoder: Option<Box<dyn VideoEncoder>>,
    audio_encoder: Option<Box<dyn AudioEncoder>>,
    microphone: Option<Box<dyn Microphone>>,
    bridge: Option<EncoderSurfaceBridge>,
    container: Option<Box<dyn ContainerWriter>>,
}

impl Drop for PendingResources {
    fn drop(&mut self) {
        if let Some(mut bridge) = self.bridge.take() {
            bridge.release();
        }
        if let Some(mut encoder) = self.video_encoder.take() {
            if let Err(e) = encoder.stop() {
                log::error!("Failed to stop video encoder: {}", e);
            }
            encoder.release();
        }
        if let Some(mut encoder) = self.audio_encoder.take() {
            if let Err(e) = encoder.stop() {
                log::error!("Failed to stop audio encoder: {}", e);
            }
            encoder.release();
        }
        if let Some(mut microphone) = self.microphone.take() {
            microphone.release();
        }
        if let Some(mut container) = self.container.take() {
            container.release();
        }
    }
}

/// Recording session controller.
///
/// Owns one optional active session: a video encoder fed through an
/// [`EncoderSurfaceBridge`], an optional audio thread, and the
/// [`MuxSynchronizer`] both write through. Lives on the render thread; the
/// graphics calls in `prepare`, `record_frame` and `stop` must happen there.
///
/// ```text
/// idle → preparing → recording → stopping → idle
///            ↓ (prepare failed)
///           idle
/// ```
pub struct Recorder {
    platform: Arc<dyn MediaPlatform>,
    egl: Arc<dyn EglApi>,
    state: RecorderState,
    recording: Arc<AtomicBool>,
    session: Option<ActiveSession>,
    delegate: Option<Arc<dyn RecorderDelegate>>,
    last_result: Option<RecordingResult>,
}

impl Recorder {
    pub fn new(platform: Arc<dyn MediaPlatform>, egl: Arc<dyn EglApi>) -> Self {
        Self {
            platform,
            egl,
            state: RecorderState::Idle,
            recording: Arc::new(AtomicBool::new(false)),
            session: None,
            delegate: None,
            last_result: None,
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn RecorderDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> RecordingStatus {
        RecordingStatus(Arc::clone(&self.recording))
    }

    /// Encoder dimensions of the active session.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.session.as_ref().map(|s| (s.width, s.height))
    }

    /// Frames submitted to the encoder in the active session.
    pub fn frames_recorded(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.frames_recorded)
    }

    pub fn last_result(&self) -> Option<&RecordingResult> {
        self.last_result.as_ref()
    }

    /// Set up encoders, the encoder surface and the container, then start
    /// recording. Transitions: idle → preparing → recording.
    ///
    /// Must run on the render thread with the display context current. On
    /// failure every partially created resource is released, the delegate is
    /// told, and the recorder returns to idle.
    pub fn prepare(&mut self, config: RecordingConfig) -> Result<(), RecordError> {
        if !self.state.is_idle() {
            return Err(RecordError::AlreadyRecording);
        }
        self.set_state(RecorderState::Preparing);

        match self.build_session(config) {
            Ok(session) => {
                log::info!(
                    "Recording started: {} ({}x{}, {} track(s))",
                    session.config.output_path.display(),
                    session.width,
                    session.height,
                    session.mux.tracks_expected()
                );
                self.session = Some(session);
                self.recording.store(true, Ordering::SeqCst);
                self.set_state(RecorderState::Recording);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to prepare recording: {}", e);
                self.set_state(RecorderState::Idle);
                if let Some(ref delegate) = self.delegate {
                    delegate.on_error(&e);
                }
                Err(e)
            }
        }
    }

    fn build_session(&self, config: RecordingConfig) -> Result<ActiveSession, RecordError> {
        let (width, height) = config.validate()?;
        if (width, height) != (config.width, config.height) {
            log::info!(
                "Recording size {}x{} floored to {}x{}",
                config.width,
                config.height,
                width,
                height
            );
        }
        let settings = &config.encoder;
        let mut pending = PendingResources::default();

        let video_encoder = self.platform.create_video_encoder(&settings.video_format(width, height))?;
        let window = video_encoder.input_window();
        pending.video_encoder = Some(video_encoder);

        if config.audio_enabled {
            let audio_format = settings.audio_format();
            pending.audio_encoder = Some(self.platform.create_audio_encoder(&audio_format)?);
            match self.platform.open_microphone(&audio_format) {
                Ok(microphone) => pending.microphone = Some(microphone),
                Err(e) => {
                    log::warn!("Microphone unavailable, recording video only: {}", e);
                    if let Some(mut encoder) = pending.audio_encoder.take() {
                        if let Err(e) = encoder.stop() {
                            log::error!("Failed to stop audio encoder: {}", e);
                        }
                        encoder.release();
                    }
                }
            }
        }

        pending.bridge = Some(EncoderSurfaceBridge::prepare(
            Arc::clone(&self.egl),
            window,
            width,
            height,
        )?);
        pending.container = Some(self.platform.create_container(&config.output_path)?);

        let with_audio = pending.microphone.is_some();
        let (Some(video_encoder), Some(bridge), Some(container)) = (
            pending.video_encoder.take(),
            pending.bridge.take(),
            pending.container.take(),
        ) else {
            return Err(RecordError::InvalidConfig("recording resources incomplete".into()));
        };

        let mux = Arc::new(MuxSynchronizer::new(container, if with_audio { 2 } else { 1 }));
        let mut video = VideoTrack::new(video_encoder, Arc::clone(&mux), settings);

        let audio = match (pending.microphone.take(), pending.audio_encoder.take()) {
            (Some(microphone), Some(encoder)) => {
                match AudioCapture::spawn(
                    microphone,
                    encoder,
                    Arc::clone(&mux),
                    Arc::clone(&self.platform),
                    settings,
                ) {
                    Ok(capture) => Some(capture),
                    Err(e) => {
                        let mut bridge = bridge;
                        bridge.release();
                        video.release();
                        mux.finish();
                        return Err(e.into());
                    }
                }
            }
            _ => None,
        };

        Ok(ActiveSession {
            config,
            width,
            height,
            mux,
            bridge,
            video,
            audio,
            frames_recorded: 0,
            frames_failed: 0,
        })
    }

    /// Render one frame into the encoder surface.
    ///
    /// `draw` is called with the encoder dimensions while the encoder surface
    /// is current. Returns whether a frame was submitted.
    pub fn record_frame<F>(&mut self, timestamp_ns: i64, draw: F) -> bool
    where
        F: FnOnce(u32, u32),
    {
        if !self.state.is_recording() {
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        if let Err(e) = session.bridge.begin_frame() {
            log::warn!("Skipping recorded frame: {}", e);
            session.frames_failed += 1;
            return false;
        }
        draw(session.width, session.height);
        let submitted = session.bridge.end_frame(timestamp_ns);
        session.video.drain();

        match submitted {
            Ok(presentation_ns) => {
                session.frames_recorded += 1;
                log::trace!("Recorded frame at {} ns", presentation_ns);
                true
            }
            Err(e) => {
                log::warn!("Failed to submit recorded frame: {}", e);
                session.frames_failed += 1;
                false
            }
        }
    }

    /// Finish the recording and return its output path.
    ///
    /// Returns `None` when nothing was recording. Never fails: every teardown
    /// step is attempted and its errors logged.
    pub fn stop(&mut self) -> Option<PathBuf> {
        let mut session = self.session.take()?;
        self.recording.store(false, Ordering::SeqCst);
        self.set_state(RecorderState::Stopping);

        let audio_report = session.audio.take().and_then(|audio| {
            audio.request_stop();
            audio.join(session.config.encoder.audio_join_timeout)
        });

        session.video.finish();
        session.bridge.release();
        session.video.release();
        session.mux.finish();

        let result = Self::build_result(&session, audio_report.as_ref());
        log::info!(
            "Recording stopped: {} ({:.2}s, {} frames, tracks {:?})",
            result.file_path.display(),
            result.duration_secs,
            session.frames_recorded,
            result.metadata.tracks
        );
        if let Some(ref delegate) = self.delegate {
            delegate.on_recording_finished(&result);
        }
        self.last_result = Some(result);
        self.set_state(RecorderState::Idle);

        Some(session.config.output_path)
    }

    fn build_result(session: &ActiveSession, audio: Option<&AudioCaptureReport>) -> RecordingResult {
        let path = &session.config.output_path;
        let duration_secs = session.bridge.clock().last_ns() as f64 / 1_000_000_000.0;
        let stats = session.mux.stats();

        // Hashing reads the whole file, so it only runs when a sidecar is wanted.
        let checksum = if session.config.write_metadata {
            match sha256_file(path) {
                Ok(sum) => Some(sum),
                Err(e) => {
                    log::warn!("No checksum for recording: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let mut metadata = RecordingMetadata::new(&path.to_string_lossy(), duration_secs, session.width, session.height);
        metadata.tracks = stats.track_kinds();
        metadata.video_samples = stats.samples_for(TrackKind::Video);
        metadata.audio_samples = stats.samples_for(TrackKind::Audio);
        metadata.checksum = checksum.clone();

        if let Some(report) = audio {
            if report.microphone_failed {
                log::warn!("Microphone failed during recording; audio may be incomplete");
            }
            log::debug!(
                "Audio thread read {} buffers (peak {:.3})",
                report.buffers_read,
                report.peak_level
            );
        }
        if session.frames_failed > 0 {
            log::warn!("{} frames could not be recorded", session.frames_failed);
        }

        if session.config.write_metadata {
            if let Err(e) = write_metadata(&metadata, path) {
                log::error!("Failed to write recording metadata: {}", e);
            }
        }

        RecordingResult {
            file_path: path.clone(),
            duration_secs,
            metadata,
            checksum,
        }
    }

    fn set_state(&mut self, state: RecorderState) {
        self.state = state;
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(state);
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if self.session.is_some() {
            log::warn!("Recorder dropped while recording; stopping");
            self.stop();
        }
    }
}
