use std::time::Instant;

/// Zero-based, non-decreasing presentation clock for the video track.
///
/// The first stamped camera timestamp defines zero. Later timestamps map to
/// `t - t0`; a timestamp that would move backwards is held at the previous
/// value.
#[derive(Debug, Clone, Default)]
pub struct PresentationClock {
    start_ns: Option<i64>,
    last_ns: i64,
    stamped: u64,
}

impl PresentationClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Presentation time in nanoseconds for a frame captured at `timestamp_ns`.
    pub fn stamp(&mut self, timestamp_ns: i64) -> i64 {
        let start = *self.start_ns.get_or_insert(timestamp_ns);
        let pts = timestamp_ns.saturating_sub(start).max(self.last_ns);
        self.last_ns = pts;
        self.stamped += 1;
        pts
    }

    /// Camera timestamp that defines zero, once the first frame was stamped.
    pub fn start_ns(&self) -> Option<i64> {
        self.start_ns
    }

    /// Presentation time of the most recent frame.
    pub fn last_ns(&self) -> i64 {
        self.last_ns
    }

    pub fn frames_stamped(&self) -> u64 {
        self.stamped
    }
}

/// Wall-clock presentation time for microphone buffers, in microseconds since
/// the clock was created. Never decreases.
#[derive(Debug, Clone)]
pub struct AudioClock {
    origin: Instant,
    last_us: i64,
}

impl AudioClock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
            last_us: 0,
        }
    }

    pub fn now_us(&mut self) -> i64 {
        let elapsed = i64::try_from(self.origin.elapsed().as_micros()).unwrap_or(i64::MAX);
        self.last_us = elapsed.max(self.last_us);
        self.last_us
    }

    pub fn last_us(&self) -> i64 {
        self.last_us
    }
}
