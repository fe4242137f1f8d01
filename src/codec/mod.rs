//! Safe Rust wrappers for FFmpeg demux/decode operations
//!
//! This module provides RAII wrappers around FFmpeg's C structures,
//! ensuring proper resource cleanup and memory safety.

pub mod avio_context;
pub mod context;
pub mod demuxer;
pub mod frame;
pub mod packet;
pub mod resampler;
pub mod scaler;

pub use avio_context::SourceIoContext;
pub use context::{DecodeStatus, DecoderContext};
pub use demuxer::{probe_input_format, DemuxerContext, InputFormat, StreamParams};
pub use frame::Frame;
pub use packet::Packet;
pub use resampler::Resampler;
pub use scaler::RgbaConverter;

/// Codec error type
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
  #[error("FFmpeg error: {0}")]
  Ffmpeg(#[from] crate::ffi::FFmpegError),

  #[error("Decoder not found for codec {0}")]
  DecoderNotFound(String),

  #[error("Failed to allocate {0}")]
  AllocationFailed(&'static str),

  #[error("Invalid configuration: {0}")]
  InvalidConfig(String),

  #[error("Invalid state: {0}")]
  InvalidState(String),
}

pub type CodecResult<T> = Result<T, CodecError>;
