use parking_lot::Mutex;

use crate::models::error::CodecError;
use crate::models::media::{BufferInfo, MediaFormat, TrackKind};
use crate::traits::codec::ContainerWriter;

/// Per-track write counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackStats {
    /// Index the container assigned to the track.
    pub track: usize,
    pub kind: TrackKind,
    pub samples: u64,
    pub bytes: u64,
}

/// Snapshot of the synchronizer's counters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MuxStats {
    pub tracks_expected: usize,
    pub tracks_registered: usize,
    pub started: bool,
    /// In registration order.
    pub tracks: Vec<TrackStats>,
    /// Samples offered before the container started (or after it stopped).
    pub dropped_samples: u64,
}

impl MuxStats {
    pub fn samples_for(&self, kind: TrackKind) -> u64 {
        self.tracks
            .iter()
            .filter(|t| t.kind == kind)
            .map(|t| t.samples)
            .sum()
    }

    pub fn track_kinds(&self) -> Vec<TrackKind> {
        self.tracks.iter().map(|t| t.kind).collect()
    }
}

struct MuxState {
    container: Box<dyn ContainerWriter>,
    tracks_expected: usize,
    tracks_registered: usize,
    started: bool,
    start_failed: bool,
    stopped: bool,
    released: bool,
    tracks: Vec<TrackStats>,
    dropped_samples: u64,
}

impl MuxState {
    /// Starts the container the first time every expected track is present.
    fn start_if_complete(&mut self) -> Result<(), CodecError> {
        if self.started || self.start_failed || self.stopped || self.tracks_expected == 0 {
            return Ok(());
        }
        if self.tracks_registered < self.tracks_expected {
            return Ok(());
        }
        if let Err(e) = self.container.start() {
            // A container that refused to start is never retried.
            self.start_failed = true;
            return Err(e);
        }
        self.started = true;
        log::info!(
            "Container started with {} track(s)",
            self.tracks_registered
        );
        Ok(())
    }
}

/// Coordination point between the video drain (render thread) and the audio
/// drain (audio thread).
///
/// Track formats become known asynchronously per encoder; samples become safe
/// to write only once every expected track has been added and the container
/// has started. One lock serializes registration, start and every write.
pub struct MuxSynchronizer {
    state: Mutex<MuxState>,
}

impl MuxSynchronizer {
    pub fn new(container: Box<dyn ContainerWriter>, tracks_expected: usize) -> Self {
        Self {
            state: Mutex::new(MuxState {
                container,
                tracks_expected,
                tracks_registered: 0,
                started: false,
                start_failed: false,
                stopped: false,
                released: false,
                tracks: Vec::with_capacity(tracks_expected),
                dropped_samples: 0,
            }),
        }
    }

    /// Add a track for a newly reported encoder format and return the index
    /// the container assigned to it.
    ///
    /// Starts the container when this registration completes the expected set.
    /// If that start fails the error is returned, the synchronizer stays
    /// unstarted for good and every later write is dropped.
    pub fn register_track(&self, format: &MediaFormat) -> Result<usize, CodecError> {
        let mut state = self.state.lock();
        if state.start_failed {
            return Err(CodecError::Container(format!(
                "cannot add {} track: the container failed to start",
                format.mime()
            )));
        }
        if state.started || state.stopped {
            return Err(CodecError::Container(format!(
                "cannot add {} track after the container started",
                format.mime()
            )));
        }
        if state.tracks_registered >= state.tracks_expected {
            return Err(CodecError::Container(format!(
                "unexpected extra {} track",
                format.mime()
            )));
        }

        let index = state.container.add_track(format)?;
        state.tracks_registered += 1;
        state.tracks.push(TrackStats {
            track: index,
            kind: format.kind(),
            samples: 0,
            bytes: 0,
        });
        log::info!(
            "Registered {:?} track {} ({}/{})",
            format.kind(),
            index,
            state.tracks_registered,
            state.tracks_expected
        );

        state.start_if_complete()?;
        Ok(index)
    }

    /// Withdraw one expected track whose producer will never register.
    ///
    /// If the remaining tracks are already registered the container starts now.
    pub fn abandon_track(&self) {
        let mut state = self.state.lock();
        if state.started || state.tracks_expected <= state.tracks_registered {
            return;
        }
        state.tracks_expected -= 1;
        log::warn!(
            "Track withdrawn; container now expects {} track(s)",
            state.tracks_expected
        );
        if let Err(e) = state.start_if_complete() {
            log::error!("Failed to start container after track withdrawal: {}", e);
        }
    }

    /// Write one encoded sample.
    ///
    /// Returns `Ok(false)` without touching the container while it has not
    /// started yet, after it stopped, or for an empty payload.
    pub fn write_sample(&self, track: usize, data: &[u8], info: &BufferInfo) -> Result<bool, CodecError> {
        let mut state = self.state.lock();
        if !state.started || state.stopped {
            state.dropped_samples += 1;
            return Ok(false);
        }
        if data.is_empty() {
            return Ok(false);
        }
        let Some(position) = state.tracks.iter().position(|t| t.track == track) else {
            return Err(CodecError::Container(format!("unknown track index {}", track)));
        };

        state.container.write_sample(track, data, info)?;
        let stats = &mut state.tracks[position];
        stats.samples += 1;
        stats.bytes += data.len() as u64;
        Ok(true)
    }

    /// Stop the container (only if it started) and release it. Idempotent.
    ///
    /// Any later registration or write is rejected or dropped.
    pub fn finish(&self) {
        let mut state = self.state.lock();
        if state.released {
            return;
        }
        if state.started && !state.stopped {
            if let Err(e) = state.container.stop() {
                log::error!("Failed to stop container: {}", e);
            }
        }
        state.stopped = true;
        state.container.release();
        state.released = true;
        log::info!("Container released");
    }

    pub fn is_started(&self) -> bool {
        self.state.lock().started
    }

    /// Whether the container refused to start once every track registered.
    pub fn start_failed(&self) -> bool {
        self.state.lock().start_failed
    }

    pub fn tracks_registered(&self) -> usize {
        self.state.lock().tracks_registered
    }

    pub fn tracks_expected(&self) -> usize {
        self.state.lock().tracks_expected
    }

    pub fn stats(&self) -> MuxStats {
        let state = self.state.lock();
        MuxStats {
            tracks_expected: state.tracks_expected,
            tracks_registered: state.tracks_registered,
            started: state.started,
            tracks: state.tracks.clone(),
            dropped_samples: state.dropped_samples,
        }
    }
}
