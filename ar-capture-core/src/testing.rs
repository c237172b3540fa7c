//! Fakes for every platform seam, shared by the unit tests.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use nalgebra::Matrix4;
use parking_lot::{Condvar, Mutex};

use crate::models::config::EncoderSettings;
use crate::models::error::{CodecError, GraphicsError, RecordError, TrackingError};
use crate::models::frame::{Pose, TextureId, TrackedAnchor, TrackingFrame, TrackingState};
use crate::models::media::{
    AudioFormat, BufferFlags, BufferInfo, DequeueOutput, EncodedBuffer, MediaFormat, TrackKind, VideoFormat,
};
use crate::models::recording_result::RecordingResult;
use crate::models::state::RecorderState;
use crate::traits::codec::{AudioEncoder, ContainerWriter, EncoderOutput, MediaPlatform, VideoEncoder};
use crate::traits::graphics::{
    ConfigHandle, ConfigRequest, ContextHandle, CurrentBinding, DisplayHandle, EglApi, NativeWindowHandle,
    SceneRenderer, SceneTextures, SurfaceHandle, VideoSource,
};
use crate::traits::microphone::Microphone;
use crate::traits::recorder_delegate::RecorderDelegate;
use crate::traits::tracking::TrackingProvider;

pub fn video_format() -> MediaFormat {
    let mut format = EncoderSettings::default().video_format(640, 480);
    format.codec_specific = vec![vec![0, 0, 0, 1, 0x67], vec![0, 0, 0, 1, 0x68]];
    MediaFormat::Video(format)
}

pub fn audio_format() -> MediaFormat {
    let mut format = EncoderSettings::default().audio_format();
    format.codec_specific = vec![vec![0x12, 0x08]];
    MediaFormat::Audio(format)
}

// --- Container ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MuxEvent {
    AddTrack(TrackKind),
    Start,
    Write { track: usize, size: usize, pts: i64 },
    Stop,
    Release,
}

#[derive(Default)]
struct ContainerState {
    events: Vec<MuxEvent>,
    payloads: Vec<(usize, Vec<u8>)>,
    fail_start: bool,
}

/// Shared view of what a [`CountingContainer`] was asked to do.
#[derive(Clone, Default)]
pub struct ContainerLog(Arc<Mutex<ContainerState>>);

impl ContainerLog {
    pub fn events(&self) -> Vec<MuxEvent> {
        self.0.lock().events.clone()
    }

    pub fn track_count(&self) -> usize {
        self.count(|e| matches!(e, MuxEvent::AddTrack(_)))
    }

    pub fn start_count(&self) -> usize {
        self.count(|e| *e == MuxEvent::Start)
    }

    pub fn bytes_written(&self) -> usize {
        self.0
            .lock()
            .events
            .iter()
            .map(|e| match e {
                MuxEvent::Write { size, .. } => *size,
                _ => 0,
            })
            .sum()
    }

    pub fn samples_for_track(&self, track: usize) -> usize {
        self.count(|e| matches!(e, MuxEvent::Write { track: t, .. } if *t == track))
    }

    pub fn pts_for_track(&self, track: usize) -> Vec<i64> {
        self.0
            .lock()
            .events
            .iter()
            .filter_map(|e| match e {
                MuxEvent::Write { track: t, pts, .. } if *t == track => Some(*pts),
                _ => None,
            })
            .collect()
    }

    /// Whether every written payload consists of its own track index.
    pub fn payloads_match_track(&self) -> bool {
        self.0
            .lock()
            .payloads
            .iter()
            .all(|(track, data)| data.iter().all(|b| *b as usize == *track))
    }

    fn count(&self, predicate: impl Fn(&MuxEvent) -> bool) -> usize {
        self.0.lock().events.iter().filter(|e| predicate(*e)).count()
    }
}

/// Container stub that records calls instead of writing a file.
pub struct CountingContainer {
    log: ContainerLog,
    next_track: usize,
}

impl CountingContainer {
    pub fn new() -> (Self, ContainerLog) {
        Self::numbered_from(0)
    }

    /// Assigns track indices starting at `first`.
    pub fn numbered_from(first: usize) -> (Self, ContainerLog) {
        let log = ContainerLog::default();
        (
            Self {
                log: log.clone(),
                next_track: first,
            },
            log,
        )
    }

    pub fn failing_start() -> (Self, ContainerLog) {
        let (container, log) = Self::new();
        log.0.lock().fail_start = true;
        (container, log)
    }
}

impl ContainerWriter for CountingContainer {
    fn add_track(&mut self, format: &MediaFormat) -> Result<usize, CodecError> {
        self.log.0.lock().events.push(MuxEvent::AddTrack(format.kind()));
        self.next_track += 1;
        Ok(self.next_track - 1)
    }

    fn start(&mut self) -> Result<(), CodecError> {
        let mut state = self.log.0.lock();
        if state.fail_start {
            return Err(CodecError::Container("start refused".into()));
        }
        state.events.push(MuxEvent::Start);
        Ok(())
    }

    fn write_sample(&mut self, track: usize, data: &[u8], info: &BufferInfo) -> Result<(), CodecError> {
        let mut state = self.log.0.lock();
        state.events.push(MuxEvent::Write {
            track,
            size: data.len(),
            pts: info.presentation_time_us,
        });
        state.payloads.push((track, data.to_vec()));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CodecError> {
        self.log.0.lock().events.push(MuxEvent::Stop);
        Ok(())
    }

    fn release(&mut self) {
        self.log.0.lock().events.push(MuxEvent::Release);
    }
}

// --- Encoders ---

/// Encoder that replays a fixed list of dequeue results, then reports
/// "try again later" forever.
pub struct ScriptedEncoder {
    script: VecDeque<Result<DequeueOutput, CodecError>>,
    released: Vec<usize>,
    dequeues: usize,
}

impl ScriptedEncoder {
    pub fn new(script: Vec<Result<DequeueOutput, CodecError>>) -> Self {
        Self {
            script: script.into(),
            released: Vec::new(),
            dequeues: 0,
        }
    }

    pub fn released(&self) -> Vec<usize> {
        self.released.clone()
    }

    pub fn dequeues(&self) -> usize {
        self.dequeues
    }
}

impl EncoderOutput for ScriptedEncoder {
    fn dequeue_output(&mut self, _timeout: Duration) -> Result<DequeueOutput, CodecError> {
        self.dequeues += 1;
        self.script.pop_front().unwrap_or(Ok(DequeueOutput::TryAgainLater))
    }

    fn release_output(&mut self, index: usize) -> Result<(), CodecError> {
        self.released.push(index);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CodecError> {
        Ok(())
    }

    fn release(&mut self) {}
}

#[derive(Default)]
struct SurfaceQueueState {
    pending: Vec<i64>,
    consumed: usize,
    fail_next_dequeue: bool,
    encoder_releases: usize,
}

/// Frames swapped into the encoder input surface, shared between
/// [`FakeEgl`] and [`FakeVideoEncoder`].
#[derive(Clone, Default)]
pub struct SurfaceQueue(Arc<Mutex<SurfaceQueueState>>);

impl SurfaceQueue {
    /// A frame with presentation time `pts_ns` reached the encoder.
    pub fn push_frame(&self, pts_ns: i64) {
        self.0.lock().pending.push(pts_ns);
    }

    /// Every presentation time swapped so far.
    pub fn pending(&self) -> Vec<i64> {
        self.0.lock().pending.clone()
    }

    pub fn fail_next_dequeue(&self) {
        self.0.lock().fail_next_dequeue = true;
    }

    pub fn encoder_releases(&self) -> usize {
        self.0.lock().encoder_releases
    }

    fn next_frame(&self) -> Option<i64> {
        let mut state = self.0.lock();
        let frame = state.pending.get(state.consumed).copied()?;
        state.consumed += 1;
        Some(frame)
    }
}

/// H.264 encoder stand-in: reports its format, one codec-config buffer, then
/// one sample per swapped frame.
pub struct FakeVideoEncoder {
    queue: SurfaceQueue,
    width: u32,
    height: u32,
    format_sent: bool,
    config_sent: bool,
    end_of_input: bool,
    eos_sent: bool,
    next_index: usize,
}

impl FakeVideoEncoder {
    pub fn new(queue: SurfaceQueue, width: u32, height: u32) -> Self {
        Self {
            queue,
            width,
            height,
            format_sent: false,
            config_sent: false,
            end_of_input: false,
            eos_sent: false,
            next_index: 0,
        }
    }

    fn buffer(&mut self, size: usize, pts_us: i64, flags: BufferFlags) -> DequeueOutput {
        let index = self.next_index;
        self.next_index = (self.next_index + 1) % 8;
        DequeueOutput::Buffer(EncodedBuffer {
            index,
            data: vec![0; size],
            info: BufferInfo {
                offset: 0,
                size,
                presentation_time_us: pts_us,
                flags,
            },
        })
    }
}

impl EncoderOutput for FakeVideoEncoder {
    fn dequeue_output(&mut self, _timeout: Duration) -> Result<DequeueOutput, CodecError> {
        {
            let mut state = self.queue.0.lock();
            if state.fail_next_dequeue {
                state.fail_next_dequeue = false;
                return Err(CodecError::Dequeue("transient".into()));
            }
        }
        if !self.format_sent {
            self.format_sent = true;
            let mut format = EncoderSettings::default().video_format(self.width, self.height);
            format.codec_specific = vec![vec![0, 0, 0, 1, 0x67], vec![0, 0, 0, 1, 0x68]];
            return Ok(DequeueOutput::FormatChanged(MediaFormat::Video(format)));
        }
        if !self.config_sent {
            self.config_sent = true;
            return Ok(self.buffer(24, 0, BufferFlags::CODEC_CONFIG));
        }
        if let Some(pts_ns) = self.queue.next_frame() {
            let flags = if pts_ns == 0 {
                BufferFlags::KEY_FRAME
            } else {
                BufferFlags::empty()
            };
            return Ok(self.buffer(64, pts_ns / 1_000, flags));
        }
        if self.end_of_input && !self.eos_sent {
            self.eos_sent = true;
            return Ok(self.buffer(0, 0, BufferFlags::END_OF_STREAM));
        }
        Ok(DequeueOutput::TryAgainLater)
    }

    fn release_output(&mut self, _index: usize) -> Result<(), CodecError> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CodecError> {
        Ok(())
    }

    fn release(&mut self) {
        self.queue.0.lock().encoder_releases += 1;
    }
}

impl VideoEncoder for FakeVideoEncoder {
    fn input_window(&self) -> NativeWindowHandle {
        NativeWindowHandle(42)
    }

    fn signal_end_of_input(&mut self) -> Result<(), CodecError> {
        self.end_of_input = true;
        Ok(())
    }
}

#[derive(Default)]
struct AudioEncoderState {
    queued_pts: Vec<i64>,
    eos_queued: bool,
    stopped: bool,
    released: bool,
}

#[derive(Clone, Default)]
pub struct AudioEncoderLog(Arc<Mutex<AudioEncoderState>>);

impl AudioEncoderLog {
    pub fn eos_queued(&self) -> bool {
        self.0.lock().eos_queued
    }

    pub fn released(&self) -> bool {
        self.0.lock().released
    }

    pub fn stopped(&self) -> bool {
        self.0.lock().stopped
    }

    pub fn pts_are_monotonic(&self) -> bool {
        self.0.lock().queued_pts.windows(2).all(|w| w[0] <= w[1])
    }
}

/// AAC encoder stand-in producing one output per queued input buffer.
///
/// The format is reported once the first non-empty input was queued. A silent
/// encoder accepts input but never reports a format or output.
pub struct FakeAudioEncoder {
    log: AudioEncoderLog,
    silent: bool,
    has_input: bool,
    format_sent: bool,
    outputs: VecDeque<DequeueOutput>,
    next_input: usize,
}

impl FakeAudioEncoder {
    pub fn new() -> (Self, AudioEncoderLog) {
        Self::build(false)
    }

    pub fn silent() -> (Self, AudioEncoderLog) {
        Self::build(true)
    }

    fn build(silent: bool) -> (Self, AudioEncoderLog) {
        let log = AudioEncoderLog::default();
        (
            Self {
                log: log.clone(),
                silent,
                has_input: false,
                format_sent: false,
                outputs: VecDeque::new(),
                next_input: 0,
            },
            log,
        )
    }
}

impl EncoderOutput for FakeAudioEncoder {
    fn dequeue_output(&mut self, timeout: Duration) -> Result<DequeueOutput, CodecError> {
        if self.silent {
            thread::sleep(timeout.min(Duration::from_millis(1)));
            return Ok(DequeueOutput::TryAgainLater);
        }
        if self.has_input && !self.format_sent {
            self.format_sent = true;
            return Ok(DequeueOutput::FormatChanged(audio_format()));
        }
        Ok(self.outputs.pop_front().unwrap_or(DequeueOutput::TryAgainLater))
    }

    fn release_output(&mut self, _index: usize) -> Result<(), CodecError> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CodecError> {
        self.log.0.lock().stopped = true;
        Ok(())
    }

    fn release(&mut self) {
        self.log.0.lock().released = true;
    }
}

impl AudioEncoder for FakeAudioEncoder {
    fn dequeue_input(&mut self, _timeout: Duration) -> Result<Option<usize>, CodecError> {
        let index = self.next_input;
        self.next_input = (self.next_input + 1) % 4;
        Ok(Some(index))
    }

    fn queue_input(
        &mut self,
        index: usize,
        data: &[u8],
        presentation_time_us: i64,
        end_of_stream: bool,
    ) -> Result<(), CodecError> {
        {
            let mut state = self.log.0.lock();
            state.queued_pts.push(presentation_time_us);
            state.eos_queued |= end_of_stream;
            self.has_input |= !data.is_empty();
        }
        if self.silent {
            return Ok(());
        }
        let (size, flags) = if end_of_stream {
            (0, BufferFlags::END_OF_STREAM)
        } else {
            ((data.len() / 8).max(1), BufferFlags::empty())
        };
        self.outputs.push_back(DequeueOutput::Buffer(EncodedBuffer {
            index,
            data: vec![1; size],
            info: BufferInfo {
                offset: 0,
                size,
                presentation_time_us,
                flags,
            },
        }));
        Ok(())
    }
}

// --- Microphone ---

enum MicBehavior {
    Buffers { remaining: usize, samples: usize },
    FailingRead,
    Blocking(Duration),
}

#[derive(Default)]
struct MicState {
    served: usize,
    drained: bool,
    reading: bool,
    broken: bool,
    read_failed: bool,
    started: bool,
    stopped: bool,
    released: bool,
}

#[derive(Clone, Default)]
pub struct MicrophoneLog(Arc<(Mutex<MicState>, Condvar)>);

impl MicrophoneLog {
    pub fn started(&self) -> bool {
        self.0 .0.lock().started
    }

    pub fn stopped(&self) -> bool {
        self.0 .0.lock().stopped
    }

    pub fn released(&self) -> bool {
        self.0 .0.lock().released
    }

    pub fn served(&self) -> usize {
        self.0 .0.lock().served
    }

    /// Wait until every scripted buffer was handed out.
    pub fn wait_until_drained(&self, timeout: Duration) -> bool {
        self.wait(timeout, |s| s.drained)
    }

    /// Wait until a read returned an error.
    pub fn wait_until_read_failed(&self, timeout: Duration) -> bool {
        self.wait(timeout, |s| s.read_failed)
    }

    /// Wait until a read call is in progress.
    pub fn wait_until_reading(&self, timeout: Duration) -> bool {
        self.wait(timeout, |s| s.reading)
    }

    fn wait(&self, timeout: Duration, done: impl Fn(&MicState) -> bool) -> bool {
        let (lock, signal) = &*self.0;
        let deadline = Instant::now() + timeout;
        let mut state = lock.lock();
        while !done(&*state) {
            if signal.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        done(&*state)
    }

    fn update(&self, f: impl FnOnce(&mut MicState)) {
        let (lock, signal) = &*self.0;
        f(&mut *lock.lock());
        signal.notify_all();
    }
}

pub struct ScriptedMicrophone {
    behavior: MicBehavior,
    log: MicrophoneLog,
}

impl ScriptedMicrophone {
    /// Hands out `count` buffers of `samples` samples, then nothing.
    pub fn with_buffers(count: usize, samples: usize) -> (Self, MicrophoneLog) {
        let log = MicrophoneLog::default();
        if count == 0 {
            log.update(|s| s.drained = true);
        }
        (
            Self {
                behavior: MicBehavior::Buffers {
                    remaining: count,
                    samples,
                },
                log: log.clone(),
            },
            log,
        )
    }

    pub fn failing_read() -> (Self, MicrophoneLog) {
        let log = MicrophoneLog::default();
        (
            Self {
                behavior: MicBehavior::FailingRead,
                log: log.clone(),
            },
            log,
        )
    }

    /// Every read ignores its timeout and blocks for `duration`.
    pub fn blocking(duration: Duration) -> (Self, MicrophoneLog) {
        let log = MicrophoneLog::default();
        (
            Self {
                behavior: MicBehavior::Blocking(duration),
                log: log.clone(),
            },
            log,
        )
    }
}

impl Microphone for ScriptedMicrophone {
    fn start(&mut self) -> Result<(), CodecError> {
        self.log.update(|s| s.started = true);
        Ok(())
    }

    fn read(&mut self, buf: &mut [i16], timeout: Duration) -> Result<usize, CodecError> {
        if self.log.0 .0.lock().broken {
            self.behavior = MicBehavior::FailingRead;
        }
        match &mut self.behavior {
            MicBehavior::Buffers { remaining, samples } => {
                if *remaining == 0 {
                    thread::sleep(timeout);
                    return Ok(0);
                }
                *remaining -= 1;
                let n = (*samples).min(buf.len());
                for (i, sample) in buf[..n].iter_mut().enumerate() {
                    *sample = ((i % 64) as i16 - 32) * 256;
                }
                let drained = *remaining == 0;
                self.log.update(|s| {
                    s.served += 1;
                    s.drained = drained;
                });
                Ok(n)
            }
            MicBehavior::FailingRead => {
                self.log.update(|s| s.read_failed = true);
                Err(CodecError::MicrophoneRead("device lost".into()))
            }
            MicBehavior::Blocking(duration) => {
                let duration = *duration;
                self.log.update(|s| s.reading = true);
                thread::sleep(duration);
                Ok(0)
            }
        }
    }

    fn stop(&mut self) -> Result<(), CodecError> {
        self.log.update(|s| s.stopped = true);
        Ok(())
    }

    fn release(&mut self) {
        self.log.update(|s| s.released = true);
    }
}

// --- Platform ---

#[derive(Default)]
struct PlatformState {
    fail_video_encoder: bool,
    fail_audio_encoder: bool,
    fail_microphone: bool,
    fail_container: bool,
    microphone_buffers: usize,
    video_formats: Vec<VideoFormat>,
    audio_encoders: Vec<AudioEncoderLog>,
    microphones: Vec<MicrophoneLog>,
    containers: Vec<ContainerLog>,
    priority_raises: usize,
}

/// Media factory handing out the fakes above and remembering their logs.
#[derive(Default)]
pub struct FakePlatform {
    queue: SurfaceQueue,
    state: Mutex<PlatformState>,
}

impl FakePlatform {
    pub fn queue(&self) -> SurfaceQueue {
        self.queue.clone()
    }

    pub fn fail_video_encoder(&self) {
        self.state.lock().fail_video_encoder = true;
    }

    pub fn fail_audio_encoder(&self) {
        self.state.lock().fail_audio_encoder = true;
    }

    pub fn fail_microphone(&self) {
        self.state.lock().fail_microphone = true;
    }

    /// Make every further read of the last opened microphone fail.
    pub fn break_microphone(&self) {
        if let Some(log) = self.state.lock().microphones.last() {
            log.update(|s| s.broken = true);
        }
    }

    /// Wait until the last opened microphone reported a read error.
    pub fn wait_for_microphone_failure(&self, timeout: Duration) -> bool {
        let log = self.state.lock().microphones.last().cloned();
        log.is_some_and(|log| log.wait_until_read_failed(timeout))
    }

    pub fn fail_container(&self) {
        self.state.lock().fail_container = true;
    }

    pub fn allow_container(&self) {
        self.state.lock().fail_container = false;
    }

    /// Buffers each opened microphone will deliver.
    pub fn set_microphone_buffers(&self, count: usize) {
        self.state.lock().microphone_buffers = count;
    }

    /// Wait until the last opened microphone delivered all its buffers.
    pub fn wait_for_microphone(&self, timeout: Duration) -> bool {
        let log = self.state.lock().microphones.last().cloned();
        log.is_some_and(|log| log.wait_until_drained(timeout))
    }

    pub fn video_formats(&self) -> Vec<VideoFormat> {
        self.state.lock().video_formats.clone()
    }

    pub fn last_container(&self) -> Option<ContainerLog> {
        self.state.lock().containers.last().cloned()
    }

    pub fn containers_created(&self) -> usize {
        self.state.lock().containers.len()
    }

    pub fn audio_encoders_created(&self) -> usize {
        self.state.lock().audio_encoders.len()
    }

    pub fn audio_encoders_released(&self) -> usize {
        self.state.lock().audio_encoders.iter().filter(|l| l.released()).count()
    }

    pub fn microphones_opened(&self) -> usize {
        self.state.lock().microphones.len()
    }

    pub fn microphones_released(&self) -> usize {
        self.state.lock().microphones.iter().filter(|l| l.released()).count()
    }

    pub fn priority_raises(&self) -> usize {
        self.state.lock().priority_raises
    }
}

impl MediaPlatform for FakePlatform {
    fn create_video_encoder(&self, format: &VideoFormat) -> Result<Box<dyn VideoEncoder>, CodecError> {
        let mut state = self.state.lock();
        if state.fail_video_encoder {
            return Err(CodecError::EncoderCreation("no H.264 encoder".into()));
        }
        state.video_formats.push(format.clone());
        Ok(Box::new(FakeVideoEncoder::new(self.queue.clone(), format.width, format.height)))
    }

    fn create_audio_encoder(&self, _format: &AudioFormat) -> Result<Box<dyn AudioEncoder>, CodecError> {
        let mut state = self.state.lock();
        if state.fail_audio_encoder {
            return Err(CodecError::EncoderCreation("no AAC encoder".into()));
        }
        let (encoder, log) = FakeAudioEncoder::new();
        state.audio_encoders.push(log);
        Ok(Box::new(encoder))
    }

    fn open_microphone(&self, _format: &AudioFormat) -> Result<Box<dyn Microphone>, CodecError> {
        let mut state = self.state.lock();
        if state.fail_microphone {
            return Err(CodecError::MicrophoneUnavailable("permission denied".into()));
        }
        let (microphone, log) = ScriptedMicrophone::with_buffers(state.microphone_buffers, 1024);
        state.microphones.push(log);
        Ok(Box::new(microphone))
    }

    fn create_container(&self, path: &Path) -> Result<Box<dyn ContainerWriter>, CodecError> {
        let mut state = self.state.lock();
        if state.fail_container {
            return Err(CodecError::Container(format!("cannot create {}", path.display())));
        }
        let (container, log) = CountingContainer::new();
        state.containers.push(log);
        Ok(Box::new(container))
    }

    fn raise_audio_thread_priority(&self) {
        self.state.lock().priority_raises += 1;
    }
}

// --- EGL ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EglCall {
    ConfigOfContext,
    ChooseConfig,
    CreateSurface(ConfigHandle),
    MakeCurrent(SurfaceHandle),
    SetPresentationTime(i64),
    SwapBuffers(SurfaceHandle),
    DestroySurface,
}

const DISPLAY: DisplayHandle = DisplayHandle(1);
const CONTEXT: ContextHandle = ContextHandle(2);
const DISPLAY_SURFACE: SurfaceHandle = SurfaceHandle(10);

struct EglState {
    current: Option<CurrentBinding>,
    calls: Vec<EglCall>,
    fail_config_of_context: bool,
    fail_choose_config: bool,
    fail_next_swap: bool,
    last_request: Option<ConfigRequest>,
    next_surface: usize,
    presentation_ns: i64,
}

/// EGL stand-in with one display context. Swapping any surface other than
/// the display surface hands the frame to the shared [`SurfaceQueue`].
pub struct FakeEgl {
    queue: SurfaceQueue,
    state: Mutex<EglState>,
}

impl FakeEgl {
    pub fn new(queue: SurfaceQueue) -> Self {
        Self {
            queue,
            state: Mutex::new(EglState {
                current: Some(CurrentBinding {
                    display: DISPLAY,
                    context: CONTEXT,
                    draw: DISPLAY_SURFACE,
                    read: DISPLAY_SURFACE,
                }),
                calls: Vec::new(),
                fail_config_of_context: false,
                fail_choose_config: false,
                fail_next_swap: false,
                last_request: None,
                next_surface: 100,
                presentation_ns: 0,
            }),
        }
    }

    pub fn calls(&self) -> Vec<EglCall> {
        self.state.lock().calls.clone()
    }

    pub fn fail_config_of_context(&self) {
        self.state.lock().fail_config_of_context = true;
    }

    pub fn fail_choose_config(&self) {
        self.state.lock().fail_choose_config = true;
    }

    pub fn fail_next_swap(&self) {
        self.state.lock().fail_next_swap = true;
    }

    pub fn clear_current(&self) {
        self.state.lock().current = None;
    }

    pub fn last_request(&self) -> Option<ConfigRequest> {
        self.state.lock().last_request
    }

    pub fn surfaces_destroyed(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| **c == EglCall::DestroySurface)
            .count()
    }

    /// Whether a recordable config was requested after config reuse was tried.
    pub fn attempted_fallback_after_reuse(&self) -> bool {
        let calls = self.calls();
        let reuse = calls.iter().position(|c| *c == EglCall::ConfigOfContext);
        let fallback = calls.iter().position(|c| *c == EglCall::ChooseConfig);
        matches!((reuse, fallback), (Some(r), Some(f)) if r < f)
    }
}

impl EglApi for FakeEgl {
    fn current(&self) -> Option<CurrentBinding> {
        self.state.lock().current
    }

    fn config_of_context(&self, _display: DisplayHandle, _context: ContextHandle) -> Result<ConfigHandle, GraphicsError> {
        let mut state = self.state.lock();
        state.calls.push(EglCall::ConfigOfContext);
        if state.fail_config_of_context {
            return Err(GraphicsError::SurfaceCreation("context config is not recordable".into()));
        }
        Ok(ConfigHandle(1))
    }

    fn choose_config(
        &self,
        _display: DisplayHandle,
        request: &ConfigRequest,
    ) -> Result<Option<ConfigHandle>, GraphicsError> {
        let mut state = self.state.lock();
        state.calls.push(EglCall::ChooseConfig);
        state.last_request = Some(*request);
        if state.fail_choose_config {
            return Ok(None);
        }
        Ok(Some(ConfigHandle(2)))
    }

    fn create_window_surface(
        &self,
        _display: DisplayHandle,
        config: ConfigHandle,
        _window: NativeWindowHandle,
    ) -> Result<SurfaceHandle, GraphicsError> {
        let mut state = self.state.lock();
        state.calls.push(EglCall::CreateSurface(config));
        state.next_surface += 1;
        Ok(SurfaceHandle(state.next_surface))
    }

    fn make_current(
        &self,
        display: DisplayHandle,
        draw: SurfaceHandle,
        read: SurfaceHandle,
        context: ContextHandle,
    ) -> Result<(), GraphicsError> {
        let mut state = self.state.lock();
        state.calls.push(EglCall::MakeCurrent(draw));
        state.current = Some(CurrentBinding {
            display,
            context,
            draw,
            read,
        });
        Ok(())
    }

    fn set_presentation_time(
        &self,
        _display: DisplayHandle,
        _surface: SurfaceHandle,
        time_ns: i64,
    ) -> Result<(), GraphicsError> {
        let mut state = self.state.lock();
        state.calls.push(EglCall::SetPresentationTime(time_ns));
        state.presentation_ns = time_ns;
        Ok(())
    }

    fn swap_buffers(&self, _display: DisplayHandle, surface: SurfaceHandle) -> Result<(), GraphicsError> {
        let mut state = self.state.lock();
        state.calls.push(EglCall::SwapBuffers(surface));
        if state.fail_next_swap {
            state.fail_next_swap = false;
            return Err(GraphicsError::SwapBuffers("surface abandoned".into()));
        }
        if surface != DISPLAY_SURFACE {
            self.queue.push_frame(state.presentation_ns);
        }
        Ok(())
    }

    fn destroy_surface(&self, _display: DisplayHandle, _surface: SurfaceHandle) -> Result<(), GraphicsError> {
        self.state.lock().calls.push(EglCall::DestroySurface);
        Ok(())
    }
}

// --- Scene ---

pub fn anchor(index: u32, state: TrackingState) -> TrackedAnchor {
    TrackedAnchor {
        index,
        state,
        pose: Pose::from_translation(index as f32 * 0.3, 0.0, -1.0),
        extent_x: 0.2,
        extent_z: 0.3,
    }
}

pub fn tracking_frame(timestamp_ns: i64, anchors: Vec<TrackedAnchor>) -> TrackingFrame {
    TrackingFrame {
        timestamp_ns,
        camera_texture: TextureId(1),
        view: Matrix4::identity(),
        projection: Matrix4::identity(),
        anchors,
        display_uvs: None,
    }
}

/// Tracking provider replaying scripted results, then reporting no frame.
pub struct FakeTracking {
    script: VecDeque<Result<Option<TrackingFrame>, TrackingError>>,
    camera_texture: Option<TextureId>,
    display_geometry: Option<(u32, u32)>,
    advances: usize,
}

impl FakeTracking {
    pub fn scripted(script: Vec<Result<Option<TrackingFrame>, TrackingError>>) -> Self {
        Self {
            script: script.into(),
            camera_texture: None,
            display_geometry: None,
            advances: 0,
        }
    }

    pub fn camera_texture(&self) -> Option<TextureId> {
        self.camera_texture
    }

    pub fn display_geometry(&self) -> Option<(u32, u32)> {
        self.display_geometry
    }

    pub fn advances(&self) -> usize {
        self.advances
    }
}

impl TrackingProvider for FakeTracking {
    fn set_camera_texture(&mut self, texture: TextureId) {
        self.camera_texture = Some(texture);
    }

    fn set_display_geometry(&mut self, width: u32, height: u32) {
        self.display_geometry = Some((width, height));
    }

    fn advance(&mut self) -> Result<Option<TrackingFrame>, TrackingError> {
        self.advances += 1;
        self.script.pop_front().unwrap_or(Ok(None))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    SurfaceCreated,
    Viewport(u32, u32),
    Clear,
    Background { timestamp_ns: i64, zoom: f32 },
    Overlay(u32),
}

/// Scene renderer that only records what it was asked to draw.
#[derive(Default)]
pub struct RecordingRenderer {
    calls: Vec<RenderCall>,
    fail_init: bool,
}

impl RecordingRenderer {
    pub fn failing_init() -> Self {
        Self {
            calls: Vec::new(),
            fail_init: true,
        }
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.clone()
    }
}

impl SceneRenderer for RecordingRenderer {
    fn on_surface_created(&mut self) -> Result<SceneTextures, GraphicsError> {
        if self.fail_init {
            return Err(GraphicsError::ShaderCompile {
                stage: "fragment",
                log: "syntax error".into(),
            });
        }
        self.calls.push(RenderCall::SurfaceCreated);
        Ok(SceneTextures {
            camera: TextureId(1),
            video: TextureId(2),
        })
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.calls.push(RenderCall::Viewport(width, height));
    }

    fn clear(&mut self) {
        self.calls.push(RenderCall::Clear);
    }

    fn draw_background(&mut self, frame: &TrackingFrame, zoom: f32) {
        self.calls.push(RenderCall::Background {
            timestamp_ns: frame.timestamp_ns,
            zoom,
        });
    }

    fn draw_overlay(&mut self, anchor: &TrackedAnchor, _view: &Matrix4<f32>, _projection: &Matrix4<f32>) {
        self.calls.push(RenderCall::Overlay(anchor.index));
    }
}

#[derive(Default)]
pub struct CountingVideoSource {
    attached: Option<TextureId>,
    updates: usize,
}

impl CountingVideoSource {
    pub fn attached(&self) -> Option<TextureId> {
        self.attached
    }

    pub fn updates(&self) -> usize {
        self.updates
    }
}

impl VideoSource for CountingVideoSource {
    fn attach(&mut self, texture: TextureId) -> Result<(), GraphicsError> {
        self.attached = Some(texture);
        Ok(())
    }

    fn update_texture(&mut self) -> Result<(), GraphicsError> {
        self.updates += 1;
        Ok(())
    }
}

// --- Delegate ---

#[derive(Default)]
pub struct RecordingDelegate {
    states: Mutex<Vec<RecorderState>>,
    errors: Mutex<Vec<RecordError>>,
    finished: Mutex<Vec<RecordingResult>>,
}

impl RecordingDelegate {
    pub fn states(&self) -> Vec<RecorderState> {
        self.states.lock().clone()
    }

    pub fn errors(&self) -> Vec<RecordError> {
        self.errors.lock().clone()
    }

    pub fn finished(&self) -> usize {
        self.finished.lock().len()
    }
}

impl RecorderDelegate for RecordingDelegate {
    fn on_state_changed(&self, state: RecorderState) {
        self.states.lock().push(state);
    }

    fn on_error(&self, error: &RecordError) {
        self.errors.lock().push(error.clone());
    }

    fn on_recording_finished(&self, result: &RecordingResult) {
        self.finished.lock().push(result.clone());
    }
}
