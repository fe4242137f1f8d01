//! Safe wrapper around FFmpeg AVFrame
//!
//! Provides RAII-based memory management and safe access to frame data.

use crate::ffi::{
  accessors::{
    ffframe_data, ffframe_extended_data, ffframe_get_channels, ffframe_get_format,
    ffframe_get_height, ffframe_get_nb_samples, ffframe_get_pkt_dts, ffframe_get_pts,
    ffframe_get_sample_rate, ffframe_get_width, ffframe_linesize,
  },
  avutil::{av_frame_alloc, av_frame_free, av_frame_unref},
  AVFrame, AV_NOPTS_VALUE,
};
use std::os::raw::c_int;
use std::ptr::NonNull;

use super::CodecError;

/// Safe wrapper around AVFrame with RAII cleanup
pub struct Frame {
  ptr: NonNull<AVFrame>,
}

impl Frame {
  /// Allocate a new empty frame
  pub fn new() -> Result<Self, CodecError> {
    let ptr = unsafe { av_frame_alloc() };
    NonNull::new(ptr)
      .map(|ptr| Self { ptr })
      .ok_or(CodecError::AllocationFailed("AVFrame"))
  }

  #[inline]
  pub fn as_ptr(&self) -> *const AVFrame {
    self.ptr.as_ptr()
  }

  #[inline]
  pub fn as_mut_ptr(&mut self) -> *mut AVFrame {
    self.ptr.as_ptr()
  }

  // ========================================================================
  // Video
  // ========================================================================

  #[inline]
  pub fn width(&self) -> u32 {
    unsafe { ffframe_get_width(self.as_ptr()).max(0) as u32 }
  }

  #[inline]
  pub fn height(&self) -> u32 {
    unsafe { ffframe_get_height(self.as_ptr()).max(0) as u32 }
  }

  /// Raw `format` field (pixel format for video, sample format for audio)
  #[inline]
  pub fn format_raw(&self) -> c_int {
    unsafe { ffframe_get_format(self.as_ptr()) }
  }

  /// Data pointer of `plane`
  ///
  /// The pointer is valid only while the frame is alive and unmodified
  pub fn data(&self, plane: usize) -> *const u8 {
    unsafe { ffframe_data(self.ptr.as_ptr(), plane as c_int) as *const u8 }
  }

  /// Line size (stride) of `plane`
  #[inline]
  pub fn linesize(&self, plane: usize) -> i32 {
    unsafe { ffframe_linesize(self.as_ptr(), plane as c_int) }
  }

  // ========================================================================
  // Audio
  // ========================================================================

  /// Samples per channel
  #[inline]
  pub fn nb_samples(&self) -> u32 {
    unsafe { ffframe_get_nb_samples(self.as_ptr()).max(0) as u32 }
  }

  #[inline]
  pub fn sample_rate(&self) -> u32 {
    unsafe { ffframe_get_sample_rate(self.as_ptr()).max(0) as u32 }
  }

  #[inline]
  pub fn channels(&self) -> u32 {
    unsafe { ffframe_get_channels(self.as_ptr()).max(0) as u32 }
  }

  /// Per-plane audio data pointers (`extended_data`)
  pub fn extended_data(&self) -> *const *const u8 {
    unsafe { ffframe_extended_data(self.as_ptr()) }
  }

  // ========================================================================
  // Timestamps
  // ========================================================================

  /// Presentation timestamp in stream time-base units
  #[inline]
  pub fn pts(&self) -> Option<i64> {
    let pts = unsafe { ffframe_get_pts(self.as_ptr()) };
    (pts != AV_NOPTS_VALUE).then_some(pts)
  }

  /// DTS of the packet that produced this frame
  #[inline]
  pub fn pkt_dts(&self) -> Option<i64> {
    let dts = unsafe { ffframe_get_pkt_dts(self.as_ptr()) };
    (dts != AV_NOPTS_VALUE).then_some(dts)
  }

  /// Unreference the frame data (but keep the frame structure)
  pub fn unref(&mut self) {
    unsafe { av_frame_unref(self.as_mut_ptr()) }
  }
}

impl Drop for Frame {
  fn drop(&mut self) {
    unsafe {
      let mut ptr = self.ptr.as_ptr();
      av_frame_free(&mut ptr);
    }
  }
}

// Frame data can be sent between threads
unsafe impl Send for Frame {}

impl std::fmt::Debug for Frame {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Frame")
      .field("width", &self.width())
      .field("height", &self.height())
      .field("nb_samples", &self.nb_samples())
      .field("format", &self.format_raw())
      .field("pts", &self.pts())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_frame_allocation() {
    let frame = Frame::new().unwrap();
    assert_eq!(frame.width(), 0);
    assert_eq!(frame.height(), 0);
    assert_eq!(frame.nb_samples(), 0);
    assert_eq!(frame.pts(), None);
  }
}
