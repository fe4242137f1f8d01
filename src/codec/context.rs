//! Safe wrapper around a decoding AVCodecContext
//!
//! Provides the send/receive decode loop with RAII cleanup.

use crate::ffi::{
  accessors::{
    ffcodecpar_get_codec_id, ffctx_get_channels, ffctx_get_codec_id, ffctx_get_height,
    ffctx_get_sample_rate, ffctx_get_width, ffctx_set_pkt_timebase, ffctx_set_thread_count,
  },
  avcodec::{
    avcodec_alloc_context3, avcodec_find_decoder, avcodec_flush_buffers, avcodec_free_context,
    avcodec_open2, avcodec_parameters_to_context, avcodec_receive_frame, avcodec_send_packet,
    codec_name,
  },
  check_error,
  error::{AVERROR_EAGAIN, AVERROR_EOF},
  AVCodecContext, AVCodecParameters, AVRational, FFmpegError,
};
use std::os::raw::c_int;
use std::ptr::{self, NonNull};

use super::{CodecError, CodecResult, Frame, Packet};

/// Outcome of one `receive_frame` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
  /// A frame was written into the caller's frame
  Frame,
  /// The decoder needs more input
  Again,
  /// The decoder is fully drained
  Eof,
}

/// Safe wrapper around a decoder AVCodecContext
pub struct DecoderContext {
  ptr: NonNull<AVCodecContext>,
}

impl DecoderContext {
  /// Open a decoder for the stream described by `par`
  ///
  /// `time_base` is the stream time base; decoded frame timestamps are
  /// reported in it. A `thread_count` of 0 lets FFmpeg choose.
  pub fn open(
    par: *const AVCodecParameters,
    time_base: AVRational,
    thread_count: u32,
  ) -> CodecResult<Self> {
    if par.is_null() {
      return Err(CodecError::InvalidConfig("missing codec parameters".into()));
    }

    let codec_id = unsafe { ffcodecpar_get_codec_id(par) };
    let codec = unsafe { avcodec_find_decoder(codec_id) };
    if codec.is_null() {
      return Err(CodecError::DecoderNotFound(codec_name(codec_id)));
    }

    let raw = unsafe { avcodec_alloc_context3(codec) };
    let ptr = NonNull::new(raw).ok_or(CodecError::AllocationFailed("AVCodecContext"))?;
    // From here on Drop releases the context on every error path
    let ctx = Self { ptr };

    check_error(unsafe { avcodec_parameters_to_context(ctx.ptr.as_ptr(), par) })?;

    unsafe {
      ffctx_set_thread_count(ctx.ptr.as_ptr(), thread_count.min(c_int::MAX as u32) as c_int);
      ffctx_set_pkt_timebase(ctx.ptr.as_ptr(), time_base.num, time_base.den);
    }

    check_error(unsafe { avcodec_open2(ctx.ptr.as_ptr(), codec, ptr::null_mut()) })?;

    tracing::debug!(
      target: "tickplay::engine",
      "Opened {} decoder ({} threads requested)",
      codec_name(codec_id),
      thread_count
    );
    Ok(ctx)
  }

  // ========================================================================
  // Decoding
  // ========================================================================

  /// Send a packet to the decoder, `None` enters draining mode
  ///
  /// Returns `Ok(false)` when the decoder is full and frames must be
  /// received first.
  pub fn send_packet(&mut self, packet: Option<&Packet>) -> CodecResult<bool> {
    let pkt_ptr = packet.map_or(ptr::null(), |p| p.as_ptr());
    let ret = unsafe { avcodec_send_packet(self.ptr.as_ptr(), pkt_ptr) };

    if ret == AVERROR_EAGAIN {
      return Ok(false);
    }
    // A second drain request after EOF is harmless
    if ret == AVERROR_EOF && packet.is_none() {
      return Ok(true);
    }
    if ret < 0 {
      return Err(CodecError::Ffmpeg(FFmpegError::from_code(ret)));
    }
    Ok(true)
  }

  /// Receive the next decoded frame into `frame`
  pub fn receive_frame(&mut self, frame: &mut Frame) -> CodecResult<DecodeStatus> {
    let ret = unsafe { avcodec_receive_frame(self.ptr.as_ptr(), frame.as_mut_ptr()) };
    match ret {
      0 => Ok(DecodeStatus::Frame),
      AVERROR_EAGAIN => Ok(DecodeStatus::Again),
      AVERROR_EOF => Ok(DecodeStatus::Eof),
      code => Err(CodecError::Ffmpeg(FFmpegError::from_code(code))),
    }
  }

  /// Drop all buffered input and output, leaving draining mode
  pub fn flush(&mut self) {
    unsafe { avcodec_flush_buffers(self.ptr.as_ptr()) }
  }

  // ========================================================================
  // Properties
  // ========================================================================

  pub fn codec_id(&self) -> c_int {
    unsafe { ffctx_get_codec_id(self.ptr.as_ptr()) }
  }

  pub fn width(&self) -> u32 {
    unsafe { ffctx_get_width(self.ptr.as_ptr()).max(0) as u32 }
  }

  pub fn height(&self) -> u32 {
    unsafe { ffctx_get_height(self.ptr.as_ptr()).max(0) as u32 }
  }

  pub fn sample_rate(&self) -> u32 {
    unsafe { ffctx_get_sample_rate(self.ptr.as_ptr()).max(0) as u32 }
  }

  pub fn channels(&self) -> u32 {
    unsafe { ffctx_get_channels(self.ptr.as_ptr()).max(0) as u32 }
  }
}

impl Drop for DecoderContext {
  fn drop(&mut self) {
    unsafe {
      let mut ptr = self.ptr.as_ptr();
      avcodec_free_context(&mut ptr);
    }
  }
}

// SAFETY: the context is only used through &mut self from one thread at a time
unsafe impl Send for DecoderContext {}

impl std::fmt::Debug for DecoderContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("DecoderContext")
      .field("codec", &codec_name(self.codec_id()))
      .field("width", &self.width())
      .field("height", &self.height())
      .field("sample_rate", &self.sample_rate())
      .field("channels", &self.channels())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_open_rejects_null_parameters() {
    let err = DecoderContext::open(ptr::null(), AVRational::MICROSECONDS, 1).unwrap_err();
    assert!(matches!(err, CodecError::InvalidConfig(_)));
  }
}
