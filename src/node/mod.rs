//! Node.js surface
//!
//! Exposes a single `VideoPlayback` class through NAPI-RS. Opening a
//! container runs on the blocking pool; every per-tick call is synchronous
//! and cheap.
//!
//! ```javascript
//! const playback = new VideoPlayback({ outputSampleRate: 48000 });
//! await playback.load('./movie.mp4');
//! const [width, height] = playback.frameSize;
//!
//! function tick(delta) {
//!   playback.advance(delta);
//!   const rgba = playback.getVideoFrame();
//!   if (rgba) upload(rgba, width, height);
//!   queueAudio(playback.fillAudio(1024));
//! }
//! ```

use crate::config::PlayerConfig;
use crate::engine::FfmpegEngine;
use crate::error::PlayerError;
use crate::player::{PlaybackStats, Session};
use crate::source::{BufferSource, MediaSource};
use napi::bindgen_prelude::*;
use napi_derive::napi;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Uint8Array input
// ============================================================================

impl BufferSource for Uint8Array {
  fn buffer_data(&self) -> &[u8] {
    self.as_ref()
  }
}

// ============================================================================
// Lock helper
// ============================================================================

macro_rules! lock_session {
  ($self:expr) => {
    $self
      .inner
      .lock()
      .map_err(|_| Error::new(Status::GenericFailure, "Lock poisoned"))?
  };
}

fn player_error(err: PlayerError) -> Error {
  let status = match err {
    PlayerError::NotOpen => Status::InvalidArg,
    _ => Status::GenericFailure,
  };
  Error::new(status, err.to_string())
}

// ============================================================================
// JavaScript-facing types
// ============================================================================

/// Playback tuning, every field optional
#[napi(object)]
#[derive(Debug, Clone, Default)]
pub struct VideoPlaybackOptions {
  /// Video units buffered ahead of the decoder
  pub read_ahead_depth: Option<u32>,
  /// Video queue size at which audio refills stop reading
  pub max_queued_units: Option<u32>,
  /// Milliseconds a single frame request may spend dropping late frames
  pub drop_budget_ms: Option<f64>,
  /// Frames a single frame request may drop regardless of budget
  pub drop_floor: Option<u32>,
  /// Sample rate of `fillAudio` output
  pub output_sample_rate: Option<u32>,
  /// Keyframe search window around seek targets, in seconds
  pub seek_window_secs: Option<f64>,
  /// Decoder threads, 0 for automatic
  pub decoder_threads: Option<u32>,
  /// Probe and I/O buffer size in bytes
  pub io_buffer_size: Option<u32>,
}

impl VideoPlaybackOptions {
  fn into_config(self) -> Result<PlayerConfig> {
    let mut config = PlayerConfig::default();
    if let Some(depth) = self.read_ahead_depth {
      config = config.with_read_ahead_depth(depth as usize);
    }
    if let Some(max) = self.max_queued_units {
      config.max_queued_units = max as usize;
    }
    if let Some(ms) = self.drop_budget_ms {
      config = config.with_drop_budget(duration_from_secs(ms / 1000.0, "dropBudgetMs")?);
    }
    if let Some(floor) = self.drop_floor {
      config = config.with_drop_floor(floor as usize);
    }
    if let Some(rate) = self.output_sample_rate {
      if rate == 0 {
        return Err(Error::new(Status::InvalidArg, "outputSampleRate must be positive"));
      }
      config = config.with_output_sample_rate(rate);
    }
    if let Some(secs) = self.seek_window_secs {
      config.seek_window = duration_from_secs(secs, "seekWindowSecs")?;
    }
    if let Some(threads) = self.decoder_threads {
      config = config.with_decoder_threads(threads);
    }
    if let Some(size) = self.io_buffer_size {
      config.io_buffer_size = size as usize;
    }
    Ok(config)
  }
}

fn duration_from_secs(secs: f64, field: &str) -> Result<Duration> {
  Duration::try_from_secs_f64(secs)
    .map_err(|_| Error::new(Status::InvalidArg, format!("{} must be a finite, non-negative number", field)))
}

/// Drop counters of the open media
#[napi(object)]
#[derive(Debug, Clone)]
pub struct VideoPlaybackStats {
  pub dropped_frames: i64,
  pub total_frames: i64,
  /// Queued video units
  pub queued_video: u32,
  /// Queued audio units
  pub queued_audio: u32,
}

impl VideoPlaybackStats {
  fn new(stats: PlaybackStats, queued: (usize, usize)) -> Self {
    Self {
      dropped_frames: stats.dropped_frames.min(i64::MAX as u64) as i64,
      total_frames: stats.total_frames.min(i64::MAX as u64) as i64,
      queued_video: queued.0.min(u32::MAX as usize) as u32,
      queued_audio: queued.1.min(u32::MAX as usize) as u32,
    }
  }
}

// ============================================================================
// VideoPlayback
// ============================================================================

/// Tick-driven audio/video playback of one container
#[napi]
pub struct VideoPlayback {
  inner: Arc<Mutex<Session<FfmpegEngine>>>,
}

#[napi]
impl VideoPlayback {
  #[napi(constructor)]
  pub fn new(options: Option<VideoPlaybackOptions>) -> Result<Self> {
    let config = options.unwrap_or_default().into_config()?;
    Ok(Self {
      inner: Arc::new(Mutex::new(Session::new(config))),
    })
  }

  async fn open(&self, source: MediaSource) -> Result<()> {
    let inner = self.inner.clone();

    tokio::task::spawn_blocking(move || {
      let mut guard = inner
        .lock()
        .map_err(|_| Error::new(Status::GenericFailure, "Lock poisoned"))?;
      guard.try_open(&FfmpegEngine, source).map_err(|err| {
        tracing::error!(target: "tickplay::node", "Load failed: {}", err);
        player_error(err)
      })
    })
    .await
    .map_err(|e| Error::new(Status::GenericFailure, format!("Task error: {}", e)))?
  }

  /// Open a container file, replacing anything open
  #[napi]
  pub async fn load(&self, path: String) -> Result<()> {
    tracing::debug!(target: "tickplay::node", "Loading {}", path);
    self.open(MediaSource::path(path)).await
  }

  /// Open an in-memory container without copying it
  #[napi]
  pub async fn load_buffer(&self, data: Uint8Array) -> Result<()> {
    tracing::debug!(target: "tickplay::node", "Loading {} byte buffer", data.len());
    self.open(MediaSource::buffer(data)).await
  }

  /// Advance the playback clock by `delta` seconds and decode ahead
  #[napi]
  pub fn advance(&self, delta: f64) -> Result<()> {
    let mut guard = lock_session!(self);
    guard.advance(delta);
    Ok(())
  }

  /// RGBA pixels (`width * height * 4` bytes) of the frame due now, or
  /// null when nothing new is due
  #[napi]
  pub fn get_video_frame(&self) -> Result<Option<Buffer>> {
    let mut guard = lock_session!(self);
    Ok(guard.get_video_frame().map(|frame| Buffer::from(frame.data.to_vec())))
  }

  /// Up to `frames` interleaved f32 frames; shorter when the ring runs dry
  #[napi]
  pub fn fill_audio(&self, frames: u32) -> Result<Float32Array> {
    let mut guard = lock_session!(self);
    let channels = guard.get_channels() as usize;
    let mut samples = vec![0.0f32; frames as usize * channels];
    let filled = guard.fill_audio(&mut samples);
    samples.truncate(filled * channels);
    Ok(Float32Array::new(samples))
  }

  /// Presentation position in seconds
  #[napi(getter)]
  pub fn position(&self) -> Result<f64> {
    let mut guard = lock_session!(self);
    Ok(guard.get_position())
  }

  /// Media length in seconds, 0 when nothing is open
  #[napi(getter)]
  pub fn length(&self) -> Result<f64> {
    let guard = lock_session!(self);
    Ok(guard.get_length())
  }

  /// Seek to `seconds`; a negative value seeks to the end
  #[napi]
  pub fn seek(&self, seconds: f64) -> Result<()> {
    let mut guard = lock_session!(self);
    guard.seek(seconds).map_err(player_error)
  }

  #[napi(getter)]
  pub fn channels(&self) -> Result<u32> {
    let guard = lock_session!(self);
    Ok(guard.get_channels() as u32)
  }

  #[napi(getter)]
  pub fn sample_rate(&self) -> Result<u32> {
    let guard = lock_session!(self);
    Ok(guard.get_sample_rate())
  }

  /// `[width, height]` of the video stream
  #[napi(getter)]
  pub fn frame_size(&self) -> Result<Vec<u32>> {
    let guard = lock_session!(self);
    let (width, height) = guard.get_frame_size();
    Ok(vec![width, height])
  }

  #[napi(getter)]
  pub fn stats(&self) -> Result<VideoPlaybackStats> {
    let guard = lock_session!(self);
    Ok(VideoPlaybackStats::new(guard.stats(), guard.queued_units()))
  }

  /// Release the open media
  #[napi]
  pub fn close(&self) -> Result<()> {
    let mut guard = lock_session!(self);
    guard.close();
    Ok(())
  }
}
