//! Demux/decode engine seam
//!
//! The player core never talks to a codec library directly. It drives an
//! [`Engine`] that probes and opens a container, a [`Container`] that yields
//! compressed units and seeks, and per-stream decoders that follow the
//! send/receive protocol.

use std::fmt::Debug;
use std::io;

use crate::source::ByteSource;
use crate::time::{MediaTime, TimeBase};

// Deterministic in-memory engine for tests and demos
#[cfg(any(test, feature = "synthetic"))]
pub mod synthetic;

#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;

#[cfg(any(test, feature = "synthetic"))]
pub use synthetic::{SyntheticEngine, SyntheticSpec};

#[cfg(feature = "ffmpeg")]
pub use ffmpeg::FfmpegEngine;

// ============================================================================
// Errors
// ============================================================================

/// Engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
  #[error("I/O error: {0}")]
  Io(#[from] io::Error),

  #[error("Invalid data: {0}")]
  InvalidData(String),

  #[error("Decoder not found: {0}")]
  DecoderNotFound(String),

  #[error("Decode error: {0}")]
  Decode(String),

  #[error("No keyframe inside the seek window")]
  SeekRejected,

  #[error("Failed to allocate {0}")]
  Allocation(&'static str),

  #[cfg(feature = "ffmpeg")]
  #[error("FFmpeg error: {0}")]
  Ffmpeg(#[from] crate::ffi::FFmpegError),
}

pub type EngineResult<T> = Result<T, EngineError>;

// ============================================================================
// Stream description
// ============================================================================

/// Elementary stream kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
  Video,
  Audio,
  Other,
}

/// Stream information reported by a container
#[derive(Debug, Clone)]
pub struct StreamInfo {
  /// Stream index inside the container
  pub index: usize,
  pub kind: MediaKind,
  /// Unit of the stream's timestamps
  pub time_base: TimeBase,
  /// Duration in `time_base` units
  pub duration: Option<i64>,
  pub width: Option<u32>,
  pub height: Option<u32>,
  pub sample_rate: Option<u32>,
  pub channels: Option<u32>,
}

impl StreamInfo {
  /// Stream duration as media time
  pub fn duration_time(&self) -> Option<MediaTime> {
    self
      .duration
      .filter(|d| *d > 0)
      .map(|d| self.time_base.to_media_time(d))
  }
}

/// Options passed to `Engine::open_input`
#[derive(Debug, Clone)]
pub struct OpenOptions {
  /// Size of the custom I/O buffer
  pub io_buffer_size: usize,
}

/// Options passed when opening a stream decoder
#[derive(Debug, Clone)]
pub struct DecoderOptions {
  /// Number of decode threads (0 for auto)
  pub thread_count: u32,
  /// Sample rate of resampled audio output
  pub output_sample_rate: u32,
}

/// Keyframe search window for a container seek
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekWindow {
  pub min: MediaTime,
  pub target: MediaTime,
  pub max: MediaTime,
}

impl SeekWindow {
  /// Window reaching `window` before the target only
  pub fn backward(target: MediaTime, window: MediaTime) -> Self {
    Self {
      min: target - window,
      target,
      max: target,
    }
  }

  /// Window reaching `window` on both sides of the target
  pub fn around(target: MediaTime, window: MediaTime) -> Self {
    Self {
      min: target - window,
      target,
      max: target + window,
    }
  }
}

// ============================================================================
// Frames
// ============================================================================

/// Timestamps of a decoded frame, in stream time-base units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameTiming {
  pub pts: Option<i64>,
  pub dts: Option<i64>,
}

impl FrameTiming {
  /// Presentation timestamp, falling back to the decode timestamp
  #[inline]
  pub fn effective(&self) -> Option<i64> {
    self.pts.or(self.dts)
  }
}

/// Result of asking a decoder for output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receive {
  /// A frame is ready and is now the decoder's current frame
  Frame(FrameTiming),
  /// The decoder wants another unit
  NeedsInput,
  /// The decoder was drained and has nothing left
  Drained,
}

/// Borrowed RGBA pixels of the current video frame
#[derive(Debug, Clone, Copy)]
pub struct RgbaView<'a> {
  pub data: &'a [u8],
  /// Bytes per source row (at least `width * 4`)
  pub stride: usize,
  pub width: u32,
  pub height: u32,
}

// ============================================================================
// Traits
// ============================================================================

/// One demuxed, still-compressed packet
pub trait CompressedUnit {
  fn stream_index(&self) -> usize;
  /// Payload size in bytes
  fn size(&self) -> usize;
  /// Presentation timestamp in stream time-base units
  fn pts(&self) -> Option<i64>;
}

/// Shared send/receive protocol of stream decoders
pub trait Decoder {
  type Unit: CompressedUnit;

  /// Submit a unit, or `None` to signal end of stream
  fn send_unit(&mut self, unit: Option<Self::Unit>) -> EngineResult<()>;

  /// Pull the next decoded frame
  fn receive(&mut self) -> EngineResult<Receive>;

  /// Drop all internal state (after a seek)
  fn reset(&mut self);
}

pub trait VideoDecoder: Decoder {
  /// Coded dimensions of the stream
  fn dimensions(&self) -> (u32, u32);

  /// Convert the current frame to RGBA
  fn rgba_view(&mut self) -> EngineResult<RgbaView<'_>>;
}

pub trait AudioDecoder: Decoder {
  /// Output channel count
  fn channels(&self) -> u16;

  /// Resample the current frame into interleaved f32 samples at the output
  /// rate, replacing the contents of `out`. Returns the number of frames.
  fn resample_into(&mut self, out: &mut Vec<f32>) -> EngineResult<usize>;
}

/// An opened container
pub trait Container {
  type Unit: CompressedUnit;
  type VideoDecoder: VideoDecoder<Unit = Self::Unit>;
  type AudioDecoder: AudioDecoder<Unit = Self::Unit>;

  fn streams(&self) -> &[StreamInfo];

  /// Container-level duration, when known
  fn duration(&self) -> Option<MediaTime>;

  /// Read the next unit; `Ok(None)` at end of stream
  fn read_unit(&mut self) -> EngineResult<Option<Self::Unit>>;

  /// Reposition to a keyframe inside `window`. On error the read position
  /// is unchanged.
  fn seek(&mut self, window: SeekWindow) -> EngineResult<()>;

  fn open_video_decoder(
    &mut self,
    stream: &StreamInfo,
    options: &DecoderOptions,
  ) -> EngineResult<Self::VideoDecoder>;

  fn open_audio_decoder(
    &mut self,
    stream: &StreamInfo,
    options: &DecoderOptions,
  ) -> EngineResult<Self::AudioDecoder>;
}

/// Entry point of a demux/decode backend
pub trait Engine {
  /// Probed container format
  type Format: Clone + Debug;
  type Container: Container;

  /// Recognize a container from the first bytes of a source
  fn probe(&self, prefix: &[u8]) -> Option<Self::Format>;

  /// Open a probed source
  fn open_input(
    &self,
    source: Box<dyn ByteSource>,
    format: &Self::Format,
    options: &OpenOptions,
  ) -> EngineResult<Self::Container>;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_effective_timestamp() {
    let timing = FrameTiming {
      pts: None,
      dts: Some(7),
    };
    assert_eq!(timing.effective(), Some(7));
    assert_eq!(FrameTiming::default().effective(), None);
  }

  #[test]
  fn test_seek_windows() {
    let target = MediaTime::from_secs(30);
    let window = MediaTime::from_secs(10);
    let backward = SeekWindow::backward(target, window);
    assert_eq!(backward.min, MediaTime::from_secs(20));
    assert_eq!(backward.max, target);
    let around = SeekWindow::around(target, window);
    assert_eq!(around.max, MediaTime::from_secs(40));
  }
}
