//! Safe wrapper around FFmpeg SwrContext
//!
//! Converts decoded audio of any sample format and rate into interleaved
//! 32-bit float at a fixed output rate, keeping the channel count.

use crate::ffi::{
  avutil::{av_channel_layout_default, av_channel_layout_uninit},
  check_error,
  swresample::{swr_alloc_set_opts2, swr_convert, swr_free, swr_get_out_samples, swr_init},
  AVChannelLayout, AVSampleFormat, SwrContext,
};
use std::os::raw::c_int;
use std::ptr::{self, NonNull};

use super::{CodecError, CodecResult, Frame};

/// Input parameters a context was built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InputShape {
  format: c_int,
  sample_rate: u32,
  channels: u32,
}

/// Resampler to interleaved f32
pub struct Resampler {
  ptr: Option<NonNull<SwrContext>>,
  shape: Option<InputShape>,
  output_rate: u32,
}

impl Resampler {
  pub fn new(output_rate: u32) -> Self {
    Self {
      ptr: None,
      shape: None,
      output_rate,
    }
  }

  pub fn output_rate(&self) -> u32 {
    self.output_rate
  }

  fn prepare(&mut self, shape: InputShape) -> CodecResult<NonNull<SwrContext>> {
    if let (Some(ptr), Some(current)) = (self.ptr, self.shape) {
      if current == shape {
        return Ok(ptr);
      }
    }
    self.release();

    if shape.channels == 0 || shape.sample_rate == 0 || self.output_rate == 0 {
      return Err(CodecError::InvalidConfig(format!(
        "Cannot resample {} channels at {} Hz to {} Hz",
        shape.channels, shape.sample_rate, self.output_rate
      )));
    }

    let mut layout = AVChannelLayout::empty();
    unsafe { av_channel_layout_default(&mut layout, shape.channels as c_int) };

    let mut ctx: *mut SwrContext = ptr::null_mut();
    let ret = unsafe {
      swr_alloc_set_opts2(
        &mut ctx,
        &layout,
        AVSampleFormat::Flt.as_raw(),
        self.output_rate as c_int,
        &layout,
        shape.format,
        shape.sample_rate as c_int,
        0,
        ptr::null_mut(),
      )
    };
    // The layout has been copied into the context
    unsafe { av_channel_layout_uninit(&mut layout) };

    if ret < 0 {
      if !ctx.is_null() {
        unsafe { swr_free(&mut ctx) };
      }
      check_error(ret)?;
    }
    let ptr = NonNull::new(ctx).ok_or(CodecError::AllocationFailed("SwrContext"))?;

    let ret = unsafe { swr_init(ptr.as_ptr()) };
    if ret < 0 {
      let mut p = ptr.as_ptr();
      unsafe { swr_free(&mut p) };
      check_error(ret)?;
    }

    tracing::debug!(
      target: "tickplay::engine",
      "Resampler configured: {} ch, format {} at {} Hz -> f32 at {} Hz",
      shape.channels,
      shape.format,
      shape.sample_rate,
      self.output_rate
    );
    self.ptr = Some(ptr);
    self.shape = Some(shape);
    Ok(ptr)
  }

  /// Convert `src` into `dst` as interleaved f32 at the output rate
  ///
  /// `dst` is replaced; its length is `frames * channels`. Returns the
  /// number of frames written, which may be 0 while the resampler buffers.
  pub fn convert(&mut self, src: &Frame, dst: &mut Vec<f32>) -> CodecResult<usize> {
    let shape = InputShape {
      format: src.format_raw(),
      sample_rate: src.sample_rate(),
      channels: src.channels(),
    };
    let ctx = self.prepare(shape)?;
    let channels = shape.channels as usize;
    let in_samples = src.nb_samples().min(c_int::MAX as u32) as c_int;

    let capacity = unsafe { swr_get_out_samples(ctx.as_ptr(), in_samples) };
    if capacity < 0 {
      check_error(capacity)?;
    }
    let capacity = capacity.max(0) as usize;

    dst.clear();
    dst.resize(capacity * channels, 0.0);
    if capacity == 0 {
      return Ok(0);
    }

    let mut out_planes: [*mut u8; 1] = [dst.as_mut_ptr() as *mut u8];
    let written = unsafe {
      swr_convert(
        ctx.as_ptr(),
        out_planes.as_mut_ptr(),
        capacity as c_int,
        src.extended_data(),
        in_samples,
      )
    };
    if written < 0 {
      dst.clear();
      check_error(written)?;
    }

    let written = written.max(0) as usize;
    dst.truncate(written * channels);
    Ok(written)
  }

  /// Forget buffered samples; the next frame rebuilds the context
  pub fn reset(&mut self) {
    self.release();
  }

  fn release(&mut self) {
    if let Some(ptr) = self.ptr.take() {
      let mut p = ptr.as_ptr();
      unsafe { swr_free(&mut p) };
    }
    self.shape = None;
  }
}

impl Drop for Resampler {
  fn drop(&mut self) {
    self.release();
  }
}

// SAFETY: the context is only used through &mut self
unsafe impl Send for Resampler {}

impl std::fmt::Debug for Resampler {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Resampler")
      .field("input", &self.shape)
      .field("output_rate", &self.output_rate)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_frame_rejected() {
    let mut resampler = Resampler::new(48_000);
    let frame = Frame::new().unwrap();
    let mut out = vec![1.0f32; 4];
    assert!(resampler.convert(&frame, &mut out).is_err());
    assert_eq!(resampler.output_rate(), 48_000);
  }

  #[test]
  fn test_reset_without_context() {
    let mut resampler = Resampler::new(44_100);
    resampler.reset();
    resampler.reset();
  }
}
