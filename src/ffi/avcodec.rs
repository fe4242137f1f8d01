//! libavcodec function declarations (decode side)

use super::types::*;
use std::os::raw::{c_char, c_int};

unsafe extern "C" {
  // ========================================================================
  // Codec Discovery
  // ========================================================================

  /// Find a registered decoder with a matching codec ID
  pub fn avcodec_find_decoder(id: c_int) -> *const AVCodec;

  /// Get the name of a codec
  pub fn avcodec_get_name(id: c_int) -> *const c_char;

  // ========================================================================
  // Context Management
  // ========================================================================

  /// Allocate an AVCodecContext and set its fields to default values
  pub fn avcodec_alloc_context3(codec: *const AVCodec) -> *mut AVCodecContext;

  /// Free the codec context and everything associated with it
  pub fn avcodec_free_context(avctx: *mut *mut AVCodecContext);

  /// Initialize the AVCodecContext to use the given AVCodec
  pub fn avcodec_open2(
    avctx: *mut AVCodecContext,
    codec: *const AVCodec,
    options: *mut *mut AVDictionary,
  ) -> c_int;

  /// Fill codec context with codec parameters
  pub fn avcodec_parameters_to_context(
    codec: *mut AVCodecContext,
    par: *const AVCodecParameters,
  ) -> c_int;

  // ========================================================================
  // Decoding
  // ========================================================================

  /// Supply raw packet data as input to a decoder
  ///
  /// A NULL packet enters draining mode.
  ///
  /// # Returns
  /// * 0 on success
  /// * AVERROR(EAGAIN) if input is not accepted until output is read
  /// * AVERROR_EOF if the decoder has been flushed
  pub fn avcodec_send_packet(avctx: *mut AVCodecContext, avpkt: *const AVPacket) -> c_int;

  /// Return decoded output data from a decoder
  ///
  /// # Returns
  /// * 0 on success
  /// * AVERROR(EAGAIN) if more input is needed
  /// * AVERROR_EOF if the decoder has been fully flushed
  pub fn avcodec_receive_frame(avctx: *mut AVCodecContext, frame: *mut AVFrame) -> c_int;

  /// Reset the internal codec state / flush internal buffers
  pub fn avcodec_flush_buffers(avctx: *mut AVCodecContext);

  // ========================================================================
  // Packet Management
  // ========================================================================

  /// Allocate an AVPacket and set its fields to default values
  pub fn av_packet_alloc() -> *mut AVPacket;

  /// Free the packet
  pub fn av_packet_free(pkt: *mut *mut AVPacket);

  /// Wipe the packet
  pub fn av_packet_unref(pkt: *mut AVPacket);
}

/// Codec name for logging
pub fn codec_name(codec_id: c_int) -> String {
  let name = unsafe { avcodec_get_name(codec_id) };
  if name.is_null() {
    return format!("codec#{codec_id}");
  }
  unsafe { std::ffi::CStr::from_ptr(name) }
    .to_string_lossy()
    .into_owned()
}
