//! Core FFmpeg type definitions
//!
//! Structs are opaque (zero-sized) except for the few small ones whose layout
//! has been stable across FFmpeg 5.x-7.x and that we must build on our side.
//! Field access goes through the C accessor library in accessors.c

use std::marker::PhantomData;
use std::os::raw::{c_char, c_int, c_void};

// ============================================================================
// Rational Number
// ============================================================================

/// Rational number for time bases
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AVRational {
  pub num: c_int,
  pub den: c_int,
}

impl AVRational {
  pub const fn new(num: c_int, den: c_int) -> Self {
    Self { num, den }
  }

  /// AV_TIME_BASE_Q
  pub const MICROSECONDS: Self = Self {
    num: 1,
    den: AV_TIME_BASE as c_int,
  };
}

// ============================================================================
// Pixel Formats
// ============================================================================

/// Pixel formats the player converts from or to
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AVPixelFormat {
  None = -1,
  Yuv420p = 0,
  Rgb24 = 2,
  Bgr24 = 3,
  Yuv422p = 4,
  Yuv444p = 5,
  Nv12 = 23,
  Rgba = 26,
  Bgra = 28,
}

impl AVPixelFormat {
  #[inline]
  pub fn as_raw(&self) -> c_int {
    *self as c_int
  }
}

// ============================================================================
// Sample Formats
// ============================================================================

/// Audio sample formats
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AVSampleFormat {
  None = -1,
  U8 = 0,
  S16 = 1,
  S32 = 2,
  Flt = 3,
  Dbl = 4,
  U8p = 5,
  S16p = 6,
  S32p = 7,
  Fltp = 8,
  Dblp = 9,
  S64 = 10,
  S64p = 11,
}

impl AVSampleFormat {
  #[inline]
  pub fn as_raw(&self) -> c_int {
    *self as c_int
  }
}

// ============================================================================
// Small structs built on the Rust side
// ============================================================================

/// AVChannelLayout (FFmpeg 5.1+)
#[repr(C)]
pub struct AVChannelLayout {
  pub order: c_int,
  pub nb_channels: c_int,
  /// Union of the channel mask and the custom map pointer
  pub u: u64,
  pub opaque: *mut c_void,
}

impl AVChannelLayout {
  pub const fn empty() -> Self {
    Self {
      order: 0,
      nb_channels: 0,
      u: 0,
      opaque: std::ptr::null_mut(),
    }
  }
}

/// Probe input handed to av_probe_input_format
#[repr(C)]
pub struct AVProbeData {
  pub filename: *const c_char,
  /// Must be followed by AVPROBE_PADDING_SIZE zero bytes
  pub buf: *mut u8,
  pub buf_size: c_int,
  pub mime_type: *const c_char,
}

// ============================================================================
// Opaque FFmpeg Types
// ============================================================================

/// Opaque AVCodec structure (codec implementation descriptor)
#[repr(C)]
pub struct AVCodec {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVCodecContext structure (decoder instance)
#[repr(C)]
pub struct AVCodecContext {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVCodecParameters structure (stream codec parameters)
#[repr(C)]
pub struct AVCodecParameters {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVFrame structure (uncompressed video/audio data)
#[repr(C)]
pub struct AVFrame {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVPacket structure (compressed data)
#[repr(C)]
pub struct AVPacket {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVDictionary structure (key-value options)
#[repr(C)]
pub struct AVDictionary {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque SwsContext structure (software scaler context)
#[repr(C)]
pub struct SwsContext {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque SwrContext structure (software resampler context)
#[repr(C)]
pub struct SwrContext {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

// ============================================================================
// Constants
// ============================================================================

/// No timestamp value
pub const AV_NOPTS_VALUE: i64 = 0x8000000000000000u64 as i64;

/// Internal time base (microseconds)
pub const AV_TIME_BASE: i64 = 1_000_000;

/// Zero bytes required after a probe buffer
pub const AVPROBE_PADDING_SIZE: usize = 32;

/// Packet flags
pub mod pkt_flag {
  use std::os::raw::c_int;

  pub const KEY: c_int = 0x0001;
  pub const CORRUPT: c_int = 0x0002;
}

/// Media types (AVMediaType)
pub mod media_type {
  use std::os::raw::c_int;

  pub const VIDEO: c_int = 0;
  pub const AUDIO: c_int = 1;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_format_values() {
    assert_eq!(AVPixelFormat::Rgba.as_raw(), 26);
    assert_eq!(AVPixelFormat::None.as_raw(), -1);
    assert_eq!(AVSampleFormat::Flt.as_raw(), 3);
  }

  #[test]
  fn test_channel_layout_size() {
    assert_eq!(std::mem::size_of::<AVChannelLayout>(), 24);
  }
}
