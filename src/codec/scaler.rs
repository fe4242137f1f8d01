//! Safe wrapper around FFmpeg SwsContext
//!
//! Converts decoded pictures of any pixel format into packed RGBA.

use crate::ffi::{
  swscale::{sws_freeContext, sws_getCachedContext, sws_scale, SWS_BILINEAR},
  AVPixelFormat, SwsContext,
};
use std::os::raw::c_int;
use std::ptr::{self, NonNull};

use super::{CodecError, CodecResult, Frame};

/// Row alignment of the RGBA output, in bytes
const ROW_ALIGN: usize = 32;

/// Converts frames to RGBA, rebuilding its SwsContext when the input
/// geometry or pixel format changes
pub struct RgbaConverter {
  ptr: Option<NonNull<SwsContext>>,
  width: u32,
  height: u32,
  src_format: c_int,
}

impl RgbaConverter {
  pub fn new() -> Self {
    Self {
      ptr: None,
      width: 0,
      height: 0,
      src_format: AVPixelFormat::None.as_raw(),
    }
  }

  /// Byte stride of an RGBA row for `width` pixels
  pub fn stride_for(width: u32) -> usize {
    (width as usize * 4).div_ceil(ROW_ALIGN) * ROW_ALIGN
  }

  fn prepare(&mut self, width: u32, height: u32, src_format: c_int) -> CodecResult<NonNull<SwsContext>> {
    if let Some(ptr) = self.ptr {
      if self.width == width && self.height == height && self.src_format == src_format {
        return Ok(ptr);
      }
    }

    let current = self.ptr.map_or(ptr::null_mut(), NonNull::as_ptr);
    let raw = unsafe {
      sws_getCachedContext(
        current,
        width as c_int,
        height as c_int,
        src_format,
        width as c_int,
        height as c_int,
        AVPixelFormat::Rgba.as_raw(),
        SWS_BILINEAR,
        ptr::null_mut(),
        ptr::null_mut(),
        ptr::null(),
      )
    };
    // sws_getCachedContext has already freed `current` when it returns a new one or NULL
    self.ptr = NonNull::new(raw);
    match self.ptr {
      Some(ptr) => {
        self.width = width;
        self.height = height;
        self.src_format = src_format;
        tracing::debug!(
          target: "tickplay::engine",
          "RGBA converter configured for {}x{} (pixel format {})",
          width,
          height,
          src_format
        );
        Ok(ptr)
      }
      None => Err(CodecError::InvalidConfig(format!(
        "Cannot convert pixel format {} at {}x{} to RGBA",
        src_format, width, height
      ))),
    }
  }

  /// Convert `src` into `dst` as RGBA rows of `stride_for(width)` bytes
  ///
  /// Returns the stride. `dst` is resized to `stride * height`.
  pub fn convert(&mut self, src: &Frame, dst: &mut Vec<u8>) -> CodecResult<usize> {
    let width = src.width();
    let height = src.height();
    if width == 0 || height == 0 {
      return Err(CodecError::InvalidState("Frame has no picture".into()));
    }
    let ctx = self.prepare(width, height, src.format_raw())?;

    let stride = Self::stride_for(width);
    dst.resize(stride * height as usize, 0);

    let src_data: [*const u8; 4] = [src.data(0), src.data(1), src.data(2), src.data(3)];
    let src_stride: [c_int; 4] = [
      src.linesize(0),
      src.linesize(1),
      src.linesize(2),
      src.linesize(3),
    ];
    let dst_data: [*mut u8; 4] = [dst.as_mut_ptr(), ptr::null_mut(), ptr::null_mut(), ptr::null_mut()];
    let dst_stride: [c_int; 4] = [stride as c_int, 0, 0, 0];

    let rows = unsafe {
      sws_scale(
        ctx.as_ptr(),
        src_data.as_ptr(),
        src_stride.as_ptr(),
        0,
        height as c_int,
        dst_data.as_ptr(),
        dst_stride.as_ptr(),
      )
    };

    if rows != height as c_int {
      return Err(CodecError::InvalidState(format!(
        "Scaler produced {} of {} rows",
        rows, height
      )));
    }
    Ok(stride)
  }
}

impl Default for RgbaConverter {
  fn default() -> Self {
    Self::new()
  }
}

impl Drop for RgbaConverter {
  fn drop(&mut self) {
    if let Some(ptr) = self.ptr.take() {
      unsafe { sws_freeContext(ptr.as_ptr()) }
    }
  }
}

// SAFETY: the context is only used through &mut self
unsafe impl Send for RgbaConverter {}

impl std::fmt::Debug for RgbaConverter {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RgbaConverter")
      .field("width", &self.width)
      .field("height", &self.height)
      .field("src_format", &self.src_format)
      .field("ready", &self.ptr.is_some())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_stride_alignment() {
    assert_eq!(RgbaConverter::stride_for(8), 32);
    assert_eq!(RgbaConverter::stride_for(9), 64);
    assert_eq!(RgbaConverter::stride_for(1920), 7680);
  }

  #[test]
  fn test_empty_frame_rejected() {
    let mut converter = RgbaConverter::new();
    let frame = Frame::new().unwrap();
    let mut out = Vec::new();
    assert!(converter.convert(&frame, &mut out).is_err());
  }
}
