//! Playback clocks
//!
//! [`ClockState`] reconciles the wall clock accumulated from host ticks with
//! the audio and video presentation times. The position selector is set by
//! `advance`/`seek` and consumed by exactly one position query.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::time::MediaTime;

// ============================================================================
// Tick sources
// ============================================================================

/// Host time used to bound work done inside a single call
pub trait TickSource: Send {
  /// Time elapsed since an arbitrary fixed origin
  fn now(&self) -> Duration;
}

/// Wall-clock ticks from `Instant`
#[derive(Debug, Clone, Copy)]
pub struct MonotonicTicks {
  origin: Instant,
}

impl MonotonicTicks {
  pub fn new() -> Self {
    Self {
      origin: Instant::now(),
    }
  }
}

impl Default for MonotonicTicks {
  fn default() -> Self {
    Self::new()
  }
}

impl TickSource for MonotonicTicks {
  fn now(&self) -> Duration {
    self.origin.elapsed()
  }
}

/// Manually advanced ticks shared between clones
#[derive(Clone, Default)]
pub struct ManualTicks {
  nanos: Arc<AtomicU64>,
}

impl ManualTicks {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn advance(&self, by: Duration) {
    let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
    self.nanos.fetch_add(nanos, Ordering::Relaxed);
  }

  pub fn set(&self, at: Duration) {
    let nanos = u64::try_from(at.as_nanos()).unwrap_or(u64::MAX);
    self.nanos.store(nanos, Ordering::Relaxed);
  }
}

impl TickSource for ManualTicks {
  fn now(&self) -> Duration {
    Duration::from_nanos(self.nanos.load(Ordering::Relaxed))
  }
}

impl fmt::Debug for ManualTicks {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("ManualTicks").field(&self.now()).finish()
  }
}

// ============================================================================
// Clock state
// ============================================================================

/// Which clock the next position query reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionSource {
  VideoPts,
  AudioTime,
  WallTime,
}

#[derive(Debug, Clone)]
pub struct ClockState {
  /// Wall accumulator
  pub time: MediaTime,
  /// Presentation time of the audio being played; `None` until synced
  pub audio_time: Option<MediaTime>,
  /// One tick's worth of slack
  pub diff_tolerance: MediaTime,
  pub seek_time: MediaTime,
  /// Ticks with a positive delta since the last seek or open
  pub ticks_since_seek: u32,
  /// Timestamp of the last accepted video frame
  pub video_pts: Option<MediaTime>,
  selector: PositionSource,
}

impl Default for ClockState {
  fn default() -> Self {
    Self {
      time: MediaTime::ZERO,
      audio_time: None,
      diff_tolerance: MediaTime::ZERO,
      seek_time: MediaTime::ZERO,
      ticks_since_seek: 0,
      video_pts: None,
      selector: PositionSource::WallTime,
    }
  }
}

impl ClockState {
  /// Apply one host tick
  pub fn advance(&mut self, delta: MediaTime) {
    let delta = if delta.is_negative() {
      MediaTime::ZERO
    } else {
      delta
    };
    self.time += delta;
    if let Some(audio_time) = self.audio_time.as_mut() {
      *audio_time += delta;
    }
    self.diff_tolerance = delta;
    self.selector = PositionSource::VideoPts;
    if delta.is_positive() {
      self.ticks_since_seek = self.ticks_since_seek.saturating_add(1);
    }
  }

  /// Consume the selector and report the current position
  pub fn position(&mut self, fudge: MediaTime) -> MediaTime {
    match std::mem::replace(&mut self.selector, PositionSource::WallTime) {
      PositionSource::VideoPts => match self.video_pts {
        Some(pts) => pts,
        None => self.time - fudge,
      },
      PositionSource::AudioTime => self.audio_time.unwrap_or(self.time),
      PositionSource::WallTime => self.time,
    }
  }

  pub fn selector(&self) -> PositionSource {
    self.selector
  }

  pub fn set_selector(&mut self, selector: PositionSource) {
    self.selector = selector;
  }

  /// Frames older than this are stale
  pub fn stale_threshold(&self) -> MediaTime {
    self.time - self.diff_tolerance
  }

  pub fn in_grace(&self, grace_ticks: u32) -> bool {
    self.ticks_since_seek < grace_ticks
  }

  /// Audio has not caught up with the wall clock yet
  pub fn audio_reset(&self) -> bool {
    match self.audio_time {
      None => true,
      Some(audio_time) => audio_time > self.stale_threshold(),
    }
  }

  /// Re-arm after a successful seek
  pub fn rearm(&mut self, target: MediaTime) {
    self.time = target;
    self.seek_time = target;
    self.ticks_since_seek = 0;
    self.video_pts = None;
    self.audio_time = None;
    self.selector = PositionSource::AudioTime;
    tracing::debug!(target: "tickplay::clock", "Clock re-armed at {}", target);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const FUDGE: MediaTime = MediaTime::from_millis(10);

  #[test]
  fn test_selector_consumed_once() {
    let mut clock = ClockState::default();
    clock.advance(MediaTime::from_millis(40));
    assert_eq!(clock.selector(), PositionSource::VideoPts);
    // no video frame yet: wall time minus the fudge
    assert_eq!(clock.position(FUDGE), MediaTime::from_millis(30));
    assert_eq!(clock.selector(), PositionSource::WallTime);
    assert_eq!(clock.position(FUDGE), MediaTime::from_millis(40));
  }

  #[test]
  fn test_video_pts_preferred_after_tick() {
    let mut clock = ClockState::default();
    clock.video_pts = Some(MediaTime::from_millis(33));
    clock.advance(MediaTime::from_millis(40));
    assert_eq!(clock.position(FUDGE), MediaTime::from_millis(33));
    assert_eq!(clock.position(FUDGE), MediaTime::from_millis(40));
  }

  #[test]
  fn test_rearm_reports_seek_target() {
    let mut clock = ClockState::default();
    clock.audio_time = Some(MediaTime::from_secs(2));
    clock.rearm(MediaTime::from_secs(5));
    assert_eq!(clock.position(FUDGE), MediaTime::from_secs(5));
    assert!(clock.in_grace(2));

    clock.audio_time = Some(MediaTime::from_millis(4_900));
    clock.set_selector(PositionSource::AudioTime);
    assert_eq!(clock.position(FUDGE), MediaTime::from_millis(4_900));
  }

  #[test]
  fn test_advance_zero_and_negative() {
    let mut clock = ClockState::default();
    clock.audio_time = Some(MediaTime::from_millis(5));
    clock.advance(MediaTime::from_millis(20));
    clock.advance(MediaTime::ZERO);
    clock.advance(MediaTime::from_millis(-50));
    assert_eq!(clock.time, MediaTime::from_millis(20));
    assert_eq!(clock.audio_time, Some(MediaTime::from_millis(25)));
    assert_eq!(clock.diff_tolerance, MediaTime::ZERO);
    assert_eq!(clock.ticks_since_seek, 1);
  }

  #[test]
  fn test_audio_reset_state() {
    let mut clock = ClockState::default();
    assert!(clock.audio_reset());
    clock.advance(MediaTime::from_millis(100));
    clock.audio_time = Some(MediaTime::ZERO);
    assert!(!clock.audio_reset());
    clock.audio_time = Some(MediaTime::from_millis(1));
    assert!(clock.audio_reset());
  }

  #[test]
  fn test_manual_ticks_shared() {
    let ticks = ManualTicks::new();
    let clone = ticks.clone();
    clone.advance(Duration::from_millis(3));
    assert_eq!(ticks.now(), Duration::from_millis(3));
    ticks.set(Duration::ZERO);
    assert_eq!(clone.now(), Duration::ZERO);
  }
}
