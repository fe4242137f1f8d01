//! Rust declarations for C accessor functions
//!
//! These functions provide access to FFmpeg struct fields via the thin C accessor library.

use super::avformat::{AVFormatContext, AVIOContext, AVInputFormat, AVStream};
use super::types::*;
use std::os::raw::{c_char, c_int, c_uint, c_void};

unsafe extern "C" {
  // ========================================================================
  // AVCodecContext
  // ========================================================================

  pub fn ffctx_set_thread_count(ctx: *mut AVCodecContext, thread_count: c_int);
  pub fn ffctx_set_pkt_timebase(ctx: *mut AVCodecContext, num: c_int, den: c_int);
  pub fn ffctx_get_codec_id(ctx: *const AVCodecContext) -> c_int;
  pub fn ffctx_get_width(ctx: *const AVCodecContext) -> c_int;
  pub fn ffctx_get_height(ctx: *const AVCodecContext) -> c_int;
  pub fn ffctx_get_sample_rate(ctx: *const AVCodecContext) -> c_int;
  pub fn ffctx_get_channels(ctx: *const AVCodecContext) -> c_int;

  // ========================================================================
  // AVFrame
  // ========================================================================

  pub fn ffframe_get_width(frame: *const AVFrame) -> c_int;
  pub fn ffframe_get_height(frame: *const AVFrame) -> c_int;
  pub fn ffframe_get_format(frame: *const AVFrame) -> c_int;
  pub fn ffframe_get_pts(frame: *const AVFrame) -> i64;
  pub fn ffframe_get_pkt_dts(frame: *const AVFrame) -> i64;
  pub fn ffframe_get_nb_samples(frame: *const AVFrame) -> c_int;
  pub fn ffframe_get_sample_rate(frame: *const AVFrame) -> c_int;
  pub fn ffframe_get_channels(frame: *const AVFrame) -> c_int;
  pub fn ffframe_data(frame: *mut AVFrame, plane: c_int) -> *mut u8;
  pub fn ffframe_linesize(frame: *const AVFrame, plane: c_int) -> c_int;
  pub fn ffframe_extended_data(frame: *const AVFrame) -> *const *const u8;

  // ========================================================================
  // AVPacket
  // ========================================================================

  pub fn ffpkt_stream_index(pkt: *const AVPacket) -> c_int;
  pub fn ffpkt_size(pkt: *const AVPacket) -> c_int;
  pub fn ffpkt_pts(pkt: *const AVPacket) -> i64;
  pub fn ffpkt_dts(pkt: *const AVPacket) -> i64;
  pub fn ffpkt_flags(pkt: *const AVPacket) -> c_int;

  // ========================================================================
  // AVFormatContext
  // ========================================================================

  pub fn fffmt_set_pb(ctx: *mut AVFormatContext, pb: *mut AVIOContext);
  pub fn fffmt_get_nb_streams(ctx: *const AVFormatContext) -> c_uint;
  pub fn fffmt_get_stream(ctx: *const AVFormatContext, index: c_uint) -> *const AVStream;
  pub fn fffmt_get_duration(ctx: *const AVFormatContext) -> i64;

  // ========================================================================
  // AVInputFormat
  // ========================================================================

  pub fn ffinfmt_get_name(fmt: *const AVInputFormat) -> *const c_char;

  // ========================================================================
  // AVStream
  // ========================================================================

  pub fn ffstream_get_index(stream: *const AVStream) -> c_int;
  pub fn ffstream_get_time_base(stream: *const AVStream, num: *mut c_int, den: *mut c_int);
  pub fn ffstream_get_duration(stream: *const AVStream) -> i64;
  pub fn ffstream_get_codecpar_const(stream: *const AVStream) -> *const AVCodecParameters;

  // ========================================================================
  // AVCodecParameters
  // ========================================================================

  pub fn ffcodecpar_get_codec_type(par: *const AVCodecParameters) -> c_int;
  pub fn ffcodecpar_get_codec_id(par: *const AVCodecParameters) -> c_int;
  pub fn ffcodecpar_get_width(par: *const AVCodecParameters) -> c_int;
  pub fn ffcodecpar_get_height(par: *const AVCodecParameters) -> c_int;
  pub fn ffcodecpar_get_sample_rate(par: *const AVCodecParameters) -> c_int;
  pub fn ffcodecpar_get_channels(par: *const AVCodecParameters) -> c_int;

  // ========================================================================
  // AVIOContext
  // ========================================================================

  pub fn fffio_get_opaque(ctx: *const AVIOContext) -> *mut c_void;
  /// Free the context together with its current buffer
  pub fn fffio_free(ctx: *mut *mut AVIOContext);
}
