//! Playback tuning

use std::time::Duration;

use crate::time::MediaTime;

/// Upper bound on decoder threads picked automatically
const MAX_AUTO_DECODER_THREADS: usize = 16;

/// Session configuration
#[derive(Debug, Clone)]
pub struct PlayerConfig {
  /// Minimum number of buffered video units the demuxer keeps
  pub read_ahead_depth: usize,
  /// Video queue size at which an audio refill stops reading
  pub max_queued_units: usize,
  /// Wall time a single frame request may spend dropping late frames
  pub drop_budget: Duration,
  /// Maximum frames dropped by a single frame request
  pub drop_floor: usize,
  /// Ticks after a seek during which no frame is dropped
  pub post_seek_grace_ticks: u32,
  /// Sample rate of the interleaved f32 output
  pub output_sample_rate: u32,
  /// Keyframe search window on either side of a seek target
  pub seek_window: Duration,
  /// Amount subtracted from the wall clock while a tick has no video pts yet
  pub position_fudge: Duration,
  /// Decoder threads (0 lets the engine decide)
  pub decoder_threads: u32,
  /// Probe prefix / custom I/O buffer size in bytes
  pub io_buffer_size: usize,
  /// Frames per audio mix chunk in the playback driver
  pub aux_buffer_frames: usize,
}

impl Default for PlayerConfig {
  fn default() -> Self {
    Self {
      read_ahead_depth: 24,
      max_queued_units: 1024,
      drop_budget: Duration::from_millis(5),
      drop_floor: 5,
      post_seek_grace_ticks: 2,
      output_sample_rate: 22_050,
      seek_window: Duration::from_secs(10),
      position_fudge: Duration::from_millis(10),
      decoder_threads: num_cpus::get().min(MAX_AUTO_DECODER_THREADS) as u32,
      io_buffer_size: 512 * 1024,
      aux_buffer_frames: 1024,
    }
  }
}

impl PlayerConfig {
  pub fn with_read_ahead_depth(mut self, depth: usize) -> Self {
    self.read_ahead_depth = depth.max(1);
    self
  }

  pub fn with_drop_budget(mut self, budget: Duration) -> Self {
    self.drop_budget = budget;
    self
  }

  pub fn with_drop_floor(mut self, floor: usize) -> Self {
    self.drop_floor = floor;
    self
  }

  pub fn with_output_sample_rate(mut self, rate: u32) -> Self {
    self.output_sample_rate = rate;
    self
  }

  pub fn with_decoder_threads(mut self, threads: u32) -> Self {
    self.decoder_threads = threads;
    self
  }

  pub(crate) fn seek_window_time(&self) -> MediaTime {
    MediaTime::from_duration(self.seek_window)
  }

  pub(crate) fn position_fudge_time(&self) -> MediaTime {
    MediaTime::from_duration(self.position_fudge)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = PlayerConfig::default();
    assert_eq!(config.read_ahead_depth, 24);
    assert_eq!(config.drop_budget, Duration::from_millis(5));
    assert_eq!(config.drop_floor, 5);
    assert_eq!(config.output_sample_rate, 22_050);
    assert_eq!(config.io_buffer_size, 512 * 1024);
    assert!(config.decoder_threads >= 1);
    assert!(config.decoder_threads as usize <= MAX_AUTO_DECODER_THREADS);
  }

  #[test]
  fn test_read_ahead_never_zero() {
    let config = PlayerConfig::default().with_read_ahead_depth(0);
    assert_eq!(config.read_ahead_depth, 1);
  }
}
