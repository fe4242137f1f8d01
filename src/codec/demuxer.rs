//! Demuxer context wrapper for FFmpeg libavformat
//!
//! Provides RAII wrapper around AVFormatContext reading through a
//! [`SourceIoContext`], plus format probing over a byte prefix.

use super::avio_context::SourceIoContext;
use super::{CodecError, CodecResult, Packet};
use crate::ffi::accessors::{
  ffcodecpar_get_channels, ffcodecpar_get_codec_id, ffcodecpar_get_codec_type,
  ffcodecpar_get_height, ffcodecpar_get_sample_rate, ffcodecpar_get_width, fffmt_get_duration,
  fffmt_get_nb_streams, fffmt_get_stream, fffmt_set_pb, ffinfmt_get_name,
  ffstream_get_codecpar_const, ffstream_get_duration, ffstream_get_index, ffstream_get_time_base,
};
use crate::ffi::avformat::{
  av_probe_input_format, av_read_frame, avformat_alloc_context, avformat_close_input,
  avformat_find_stream_info, avformat_open_input, avformat_seek_file, AVFormatContext,
  AVInputFormat,
};
use crate::ffi::error::AVERROR_EOF;
use crate::ffi::{
  check_error, media_type, AVCodecParameters, AVProbeData, AVRational, FFmpegError,
  AVPROBE_PADDING_SIZE, AV_NOPTS_VALUE,
};
use crate::source::ByteSource;
use std::ffi::CStr;
use std::os::raw::c_int;
use std::ptr::{self, NonNull};

// ============================================================================
// Probing
// ============================================================================

/// A container format recognized by FFmpeg
#[derive(Clone)]
pub struct InputFormat {
  ptr: NonNull<AVInputFormat>,
  name: String,
}

impl InputFormat {
  /// Short name(s) of the demuxer, e.g. `mov,mp4,m4a,3gp,3g2,mj2`
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn as_ptr(&self) -> *const AVInputFormat {
    self.ptr.as_ptr()
  }
}

impl std::fmt::Debug for InputFormat {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_tuple("InputFormat").field(&self.name).finish()
  }
}

// SAFETY: AVInputFormat descriptors are immutable static tables inside libavformat
unsafe impl Send for InputFormat {}
unsafe impl Sync for InputFormat {}

/// Guess the container format of `prefix`
pub fn probe_input_format(prefix: &[u8]) -> Option<InputFormat> {
  if prefix.is_empty() || prefix.len() > c_int::MAX as usize - AVPROBE_PADDING_SIZE {
    return None;
  }
  let mut padded = Vec::with_capacity(prefix.len() + AVPROBE_PADDING_SIZE);
  padded.extend_from_slice(prefix);
  padded.resize(prefix.len() + AVPROBE_PADDING_SIZE, 0);

  let mut probe = AVProbeData {
    filename: c"".as_ptr(),
    buf: padded.as_mut_ptr(),
    buf_size: prefix.len() as c_int,
    mime_type: ptr::null(),
  };
  let fmt = unsafe { av_probe_input_format(&mut probe, 1) };
  let ptr = NonNull::new(fmt as *mut AVInputFormat)?;

  let name_ptr = unsafe { ffinfmt_get_name(ptr.as_ptr()) };
  let name = if name_ptr.is_null() {
    String::from("unknown")
  } else {
    unsafe { CStr::from_ptr(name_ptr) }
      .to_string_lossy()
      .into_owned()
  };
  Some(InputFormat { ptr, name })
}

// ============================================================================
// Stream parameters
// ============================================================================

/// Stream description read from the container
#[derive(Debug, Clone)]
pub struct StreamParams {
  pub index: usize,
  /// Raw AVMediaType
  pub codec_type: c_int,
  /// Raw AVCodecID
  pub codec_id: c_int,
  pub time_base: AVRational,
  /// Duration in `time_base` units
  pub duration: Option<i64>,
  pub width: u32,
  pub height: u32,
  pub sample_rate: u32,
  pub channels: u32,
}

impl StreamParams {
  pub fn is_video(&self) -> bool {
    self.codec_type == media_type::VIDEO
  }

  pub fn is_audio(&self) -> bool {
    self.codec_type == media_type::AUDIO
  }
}

// ============================================================================
// Demuxer
// ============================================================================

/// Demuxer context wrapper
pub struct DemuxerContext {
  ptr: NonNull<AVFormatContext>,
  /// Must outlive `ptr`; released after the format context in Drop
  io: Option<SourceIoContext>,
  streams: Vec<StreamParams>,
}

impl DemuxerContext {
  /// Open `source` as `format`
  pub fn open_source(
    source: Box<dyn ByteSource>,
    format: &InputFormat,
    io_buffer_size: usize,
  ) -> CodecResult<Self> {
    let io = SourceIoContext::new(source, io_buffer_size)?;

    let mut ctx_ptr = unsafe { avformat_alloc_context() };
    if ctx_ptr.is_null() {
      return Err(CodecError::AllocationFailed("AVFormatContext"));
    }

    unsafe {
      fffmt_set_pb(ctx_ptr, io.as_ptr());
    }

    let ret =
      unsafe { avformat_open_input(&mut ctx_ptr, ptr::null(), format.as_ptr(), ptr::null_mut()) };
    if ret < 0 {
      // avformat_open_input frees the context on failure; `io` drops here
      return Err(CodecError::Ffmpeg(FFmpegError::from_code(ret)));
    }
    let ptr =
      NonNull::new(ctx_ptr).ok_or(CodecError::InvalidState("open_input returned no context".into()))?;

    let mut ctx = Self {
      ptr,
      io: Some(io),
      streams: Vec::new(),
    };
    ctx.find_stream_info()?;
    Ok(ctx)
  }

  fn find_stream_info(&mut self) -> CodecResult<()> {
    let ret = unsafe { avformat_find_stream_info(self.ptr.as_ptr(), ptr::null_mut()) };
    check_error(ret)?;
    self.parse_streams();
    Ok(())
  }

  fn parse_streams(&mut self) {
    let nb_streams = unsafe { fffmt_get_nb_streams(self.ptr.as_ptr()) };

    self.streams.clear();
    self.streams.reserve(nb_streams as usize);

    for i in 0..nb_streams {
      let stream = unsafe { fffmt_get_stream(self.ptr.as_ptr(), i) };
      if stream.is_null() {
        continue;
      }
      let codecpar = unsafe { ffstream_get_codecpar_const(stream) };
      if codecpar.is_null() {
        continue;
      }

      let mut num = 0;
      let mut den = 0;
      unsafe { ffstream_get_time_base(stream, &mut num, &mut den) };
      let duration = unsafe { ffstream_get_duration(stream) };

      unsafe {
        self.streams.push(StreamParams {
          index: ffstream_get_index(stream).max(0) as usize,
          codec_type: ffcodecpar_get_codec_type(codecpar),
          codec_id: ffcodecpar_get_codec_id(codecpar),
          time_base: AVRational::new(num, den),
          duration: (duration > 0 && duration != AV_NOPTS_VALUE).then_some(duration),
          width: ffcodecpar_get_width(codecpar).max(0) as u32,
          height: ffcodecpar_get_height(codecpar).max(0) as u32,
          sample_rate: ffcodecpar_get_sample_rate(codecpar).max(0) as u32,
          channels: ffcodecpar_get_channels(codecpar).max(0) as u32,
        });
      }
    }
  }

  pub fn streams(&self) -> &[StreamParams] {
    &self.streams
  }

  /// Codec parameters of stream `index`, owned by the format context
  pub fn codec_parameters(&self, index: usize) -> Option<*const AVCodecParameters> {
    let nb_streams = unsafe { fffmt_get_nb_streams(self.ptr.as_ptr()) };
    if index >= nb_streams as usize {
      return None;
    }
    let stream = unsafe { fffmt_get_stream(self.ptr.as_ptr(), index as u32) };
    if stream.is_null() {
      return None;
    }
    let par = unsafe { ffstream_get_codecpar_const(stream) };
    (!par.is_null()).then_some(par)
  }

  /// Read the next packet
  ///
  /// Returns `Ok(None)` on EOF.
  pub fn read_packet(&mut self) -> CodecResult<Option<Packet>> {
    let mut packet = Packet::new()?;
    let ret = unsafe { av_read_frame(self.ptr.as_ptr(), packet.as_mut_ptr()) };
    if ret == AVERROR_EOF {
      return Ok(None);
    }
    check_error(ret)?;
    Ok(Some(packet))
  }

  /// Seek to a keyframe within `[min_us, max_us]`, as close to `target_us`
  /// as possible. Timestamps are in AV_TIME_BASE units.
  pub fn seek_file(&mut self, min_us: i64, target_us: i64, max_us: i64) -> CodecResult<()> {
    let ret = unsafe { avformat_seek_file(self.ptr.as_ptr(), -1, min_us, target_us, max_us, 0) };
    check_error(ret)?;
    Ok(())
  }

  /// Container duration in AV_TIME_BASE units (microseconds)
  pub fn duration_us(&self) -> Option<i64> {
    let duration = unsafe { fffmt_get_duration(self.ptr.as_ptr()) };
    (duration > 0 && duration != AV_NOPTS_VALUE).then_some(duration)
  }
}

impl Drop for DemuxerContext {
  fn drop(&mut self) {
    let mut ctx_ptr = self.ptr.as_ptr();
    // runs the demuxer's read_close; the custom AVIO context outlives it
    unsafe {
      avformat_close_input(&mut ctx_ptr);
    }
    self.io.take();
  }
}

// SAFETY: DemuxerContext owns all its resources and is only used from one thread at a time
unsafe impl Send for DemuxerContext {}

impl std::fmt::Debug for DemuxerContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("DemuxerContext")
      .field("streams", &self.streams.len())
      .field("duration_us", &self.duration_us())
      .finish()
  }
}
