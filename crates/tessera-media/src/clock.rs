//! Playback clock.
//!
//! Three interchangeable time sources report the engine's internal tick
//! unit: audio position (bytes actually consumed by the audio backend,
//! corrected for skipped blocks), an external interrupt counter, and the
//! wall clock. All three apply a calibration offset so pause, resume, and
//! seek can present an arbitrary "now" without disturbing the underlying
//! counters.
//!
//! The raw counters are the one piece of state mutated concurrently: audio
//! and interrupt callbacks write them from outside the playback loop, so
//! they are atomics. Single writer, single reader, monotonic values —
//! relaxed ordering is sufficient.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Engine ticks per second, shared by all three time sources.
pub const TICK_RATE: u32 = 60;

/// The tick at which a frame is due for presentation.
pub fn frame_ticks(frame: u32, frame_rate: u8) -> i64 {
    frame as i64 * TICK_RATE as i64 / frame_rate as i64
}

/// Audio progress counters written by the audio backend's callback.
#[derive(Debug, Default)]
pub struct AudioCounters {
    bytes_played: AtomicU64,
    bytes_skipped: AtomicU64,
}

impl AudioCounters {
    /// Credit bytes the hardware has consumed.
    pub fn add_played(&self, bytes: u64) {
        self.bytes_played.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Credit bytes that were dropped rather than played.
    pub fn add_skipped(&self, bytes: u64) {
        self.bytes_skipped.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Net bytes heard so far.
    pub fn effective_bytes(&self) -> u64 {
        let played = self.bytes_played.load(Ordering::Relaxed);
        let skipped = self.bytes_skipped.load(Ordering::Relaxed);
        played.saturating_sub(skipped)
    }

    /// Zero both counters.
    pub fn reset(&self) {
        self.bytes_played.store(0, Ordering::Relaxed);
        self.bytes_skipped.store(0, Ordering::Relaxed);
    }
}

/// Which raw counter the clock derives ticks from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMethod {
    /// Ticks from audio bytes consumed; valid only while audio plays.
    AudioPosition,
    /// Ticks from an external periodic counter.
    InterruptTick,
    /// System time scaled to tick resolution; always available.
    WallClock,
}

/// Calibrated playback time source.
pub struct Clock {
    method: ClockMethod,
    offset: i64,
    audio: Arc<AudioCounters>,
    audio_byte_rate: u32,
    interrupt: Option<Arc<AtomicU64>>,
    epoch: Instant,
}

impl Clock {
    /// Create a clock backed by the given counters.
    ///
    /// `audio_byte_rate` is bytes per second of audio data (zero disables
    /// the audio method); `interrupt` is an externally incremented tick
    /// counter, when one exists. The initial method is wall clock until
    /// [`Clock::reselect`] runs.
    pub fn new(
        audio: Arc<AudioCounters>,
        audio_byte_rate: u32,
        interrupt: Option<Arc<AtomicU64>>,
    ) -> Self {
        Self {
            method: ClockMethod::WallClock,
            offset: 0,
            audio,
            audio_byte_rate,
            interrupt,
            epoch: Instant::now(),
        }
    }

    /// The currently selected method.
    pub fn method(&self) -> ClockMethod {
        self.method
    }

    fn raw_now(&self) -> i64 {
        match self.method {
            ClockMethod::AudioPosition => {
                let bytes = self.audio.effective_bytes();
                (bytes as i64 * TICK_RATE as i64) / self.audio_byte_rate as i64
            }
            ClockMethod::InterruptTick => self
                .interrupt
                .as_ref()
                .map(|c| c.load(Ordering::Relaxed) as i64)
                .unwrap_or(0),
            ClockMethod::WallClock => {
                (self.epoch.elapsed().as_micros() as i64 * TICK_RATE as i64) / 1_000_000
            }
        }
    }

    /// Current calibrated time in ticks.
    pub fn now(&self) -> i64 {
        self.raw_now() + self.offset
    }

    /// Calibrate so that `now()` reports `target` from this instant.
    pub fn set_timer(&mut self, target: i64) {
        self.offset = target - self.raw_now();
    }

    /// Re-select the time source after audio starts or stops.
    ///
    /// Preserves the presented time across the switch.
    pub fn reselect(&mut self, audio_active: bool) {
        let now = self.now();
        self.method = if audio_active && self.audio_byte_rate > 0 {
            ClockMethod::AudioPosition
        } else if self.interrupt.is_some() {
            ClockMethod::InterruptTick
        } else {
            ClockMethod::WallClock
        };
        self.set_timer(now);
    }
}
