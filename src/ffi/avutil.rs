//! libavutil function declarations

use super::types::*;
use std::os::raw::{c_char, c_int, c_void};

unsafe extern "C" {
  // ========================================================================
  // Frame Management
  // ========================================================================

  /// Allocate an AVFrame and set its fields to default values
  pub fn av_frame_alloc() -> *mut AVFrame;

  /// Free the frame and any dynamically allocated objects in it
  pub fn av_frame_free(frame: *mut *mut AVFrame);

  /// Unreference all the buffers referenced by frame and reset the frame fields
  pub fn av_frame_unref(frame: *mut AVFrame);

  /// Allocate new buffer(s) for audio or video data
  pub fn av_frame_get_buffer(frame: *mut AVFrame, align: c_int) -> c_int;

  // ========================================================================
  // Memory
  // ========================================================================

  /// Allocate a memory block with alignment suitable for all memory accesses
  pub fn av_malloc(size: usize) -> *mut c_void;

  /// Free a memory block allocated with av_malloc
  pub fn av_free(ptr: *mut c_void);

  // ========================================================================
  // Channel Layouts
  // ========================================================================

  /// Get the default channel layout for a given number of channels
  pub fn av_channel_layout_default(ch_layout: *mut AVChannelLayout, nb_channels: c_int);

  /// Free any allocated data in the channel layout and reset it
  pub fn av_channel_layout_uninit(channel_layout: *mut AVChannelLayout);

  // ========================================================================
  // Errors and Logging
  // ========================================================================

  /// Put a description of the AVERROR code errnum in errbuf
  pub fn av_strerror(errnum: c_int, errbuf: *mut c_char, errbuf_size: usize) -> c_int;

  /// Set the log level
  pub fn av_log_set_level(level: c_int);
}

/// Log levels
pub mod log_level {
  use std::os::raw::c_int;

  pub const QUIET: c_int = -8;
  pub const ERROR: c_int = 16;
  pub const WARNING: c_int = 24;
}
