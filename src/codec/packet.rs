//! Safe wrapper around FFmpeg AVPacket
//!
//! Provides RAII-based memory management for demuxed, still-compressed data.

use crate::ffi::{
  accessors::{ffpkt_dts, ffpkt_flags, ffpkt_pts, ffpkt_size, ffpkt_stream_index},
  avcodec::{av_packet_alloc, av_packet_free, av_packet_unref},
  pkt_flag, AVPacket, AV_NOPTS_VALUE,
};
use std::ptr::NonNull;

use super::CodecError;

/// Safe wrapper around AVPacket with RAII cleanup
pub struct Packet {
  ptr: NonNull<AVPacket>,
}

impl Packet {
  /// Allocate a new empty packet
  pub fn new() -> Result<Self, CodecError> {
    let ptr = unsafe { av_packet_alloc() };
    NonNull::new(ptr)
      .map(|ptr| Self { ptr })
      .ok_or(CodecError::AllocationFailed("AVPacket"))
  }

  #[inline]
  pub fn as_ptr(&self) -> *const AVPacket {
    self.ptr.as_ptr()
  }

  #[inline]
  pub fn as_mut_ptr(&mut self) -> *mut AVPacket {
    self.ptr.as_ptr()
  }

  /// Index of the stream this packet belongs to
  #[inline]
  pub fn stream_index(&self) -> i32 {
    unsafe { ffpkt_stream_index(self.as_ptr()) }
  }

  /// Payload size in bytes
  #[inline]
  pub fn size(&self) -> i32 {
    unsafe { ffpkt_size(self.as_ptr()) }
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.size() <= 0
  }

  /// Presentation timestamp, `None` for AV_NOPTS_VALUE
  #[inline]
  pub fn pts(&self) -> Option<i64> {
    let pts = unsafe { ffpkt_pts(self.as_ptr()) };
    (pts != AV_NOPTS_VALUE).then_some(pts)
  }

  /// Decoding timestamp, `None` for AV_NOPTS_VALUE
  #[inline]
  pub fn dts(&self) -> Option<i64> {
    let dts = unsafe { ffpkt_dts(self.as_ptr()) };
    (dts != AV_NOPTS_VALUE).then_some(dts)
  }

  #[inline]
  pub fn flags(&self) -> i32 {
    unsafe { ffpkt_flags(self.as_ptr()) }
  }

  #[inline]
  pub fn is_key(&self) -> bool {
    (self.flags() & pkt_flag::KEY) != 0
  }

  #[inline]
  pub fn is_corrupt(&self) -> bool {
    (self.flags() & pkt_flag::CORRUPT) != 0
  }

  /// Unreference the packet data
  pub fn unref(&mut self) {
    unsafe { av_packet_unref(self.as_mut_ptr()) }
  }
}

impl Drop for Packet {
  fn drop(&mut self) {
    unsafe {
      let mut ptr = self.ptr.as_ptr();
      av_packet_free(&mut ptr);
    }
  }
}

// Packet data can be sent between threads
unsafe impl Send for Packet {}

impl std::fmt::Debug for Packet {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Packet")
      .field("stream", &self.stream_index())
      .field("size", &self.size())
      .field("pts", &self.pts())
      .field("dts", &self.dts())
      .field("is_key", &self.is_key())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_packet_allocation() {
    let pkt = Packet::new().unwrap();
    assert!(pkt.is_empty());
    assert_eq!(pkt.pts(), None);
    assert!(!pkt.is_key());
  }
}
