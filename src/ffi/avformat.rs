//! libavformat function declarations (demux side)

use super::types::*;
use std::os::raw::{c_int, c_void};

// ============================================================================
// Opaque Types (format-specific)
// ============================================================================

/// Opaque AVFormatContext structure (demuxer context)
#[repr(C)]
pub struct AVFormatContext {
  _opaque: [u8; 0],
  _marker: std::marker::PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVInputFormat structure (input format descriptor)
#[repr(C)]
pub struct AVInputFormat {
  _opaque: [u8; 0],
  _marker: std::marker::PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVIOContext structure (I/O abstraction)
#[repr(C)]
pub struct AVIOContext {
  _opaque: [u8; 0],
  _marker: std::marker::PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVStream structure (stream within container)
#[repr(C)]
pub struct AVStream {
  _opaque: [u8; 0],
  _marker: std::marker::PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

// ============================================================================
// Callback Types for Custom I/O
// ============================================================================

/// Read callback for custom I/O
///
/// # Returns
/// Number of bytes read, or negative AVERROR on error
pub type ReadPacketFn =
  unsafe extern "C" fn(opaque: *mut c_void, buf: *mut u8, buf_size: c_int) -> c_int;

/// Seek callback for custom I/O
///
/// # Arguments
/// * `whence` - SEEK_SET, SEEK_CUR, SEEK_END, or AVSEEK_SIZE
///
/// # Returns
/// New position, or negative AVERROR on error
pub type SeekFn = unsafe extern "C" fn(opaque: *mut c_void, offset: i64, whence: c_int) -> i64;

unsafe extern "C" {
  // ========================================================================
  // Input Context (Demuxing)
  // ========================================================================

  /// Allocate an AVFormatContext
  pub fn avformat_alloc_context() -> *mut AVFormatContext;

  /// Close an opened input, free the context and set `*s` to NULL.
  ///
  /// A caller-supplied `pb` (custom I/O) is left open.
  pub fn avformat_close_input(s: *mut *mut AVFormatContext);

  /// Open an input stream and read the header
  ///
  /// # Arguments
  /// * `ps` - Pointer to a context allocated with avformat_alloc_context
  /// * `url` - URL/filename to open (NULL with custom I/O)
  /// * `fmt` - Input format (NULL for auto-detect)
  /// * `options` - Demuxer options
  ///
  /// On failure the context is freed and `*ps` set to NULL.
  pub fn avformat_open_input(
    ps: *mut *mut AVFormatContext,
    url: *const std::os::raw::c_char,
    fmt: *const AVInputFormat,
    options: *mut *mut AVDictionary,
  ) -> c_int;

  /// Read packets of a media file to get stream information
  pub fn avformat_find_stream_info(
    ic: *mut AVFormatContext,
    options: *mut *mut AVDictionary,
  ) -> c_int;

  /// Return the next packet of a stream
  ///
  /// # Returns
  /// * 0 on success
  /// * AVERROR_EOF at end of file
  pub fn av_read_frame(s: *mut AVFormatContext, pkt: *mut AVPacket) -> c_int;

  /// Seek to timestamp ts, choosing a position within `[min_ts, max_ts]`
  ///
  /// With `stream_index` -1 the timestamps are in AV_TIME_BASE units.
  pub fn avformat_seek_file(
    s: *mut AVFormatContext,
    stream_index: c_int,
    min_ts: i64,
    ts: i64,
    max_ts: i64,
    flags: c_int,
  ) -> c_int;

  // ========================================================================
  // Custom I/O
  // ========================================================================

  /// Allocate and initialize an AVIOContext for custom I/O
  ///
  /// # Safety
  /// The buffer must be allocated with av_malloc. FFmpeg may replace it, so
  /// free the context's current buffer, not the original pointer.
  pub fn avio_alloc_context(
    buffer: *mut u8,
    buffer_size: c_int,
    write_flag: c_int,
    opaque: *mut c_void,
    read_packet: Option<ReadPacketFn>,
    write_packet: Option<
      unsafe extern "C" fn(opaque: *mut c_void, buf: *const u8, buf_size: c_int) -> c_int,
    >,
    seek: Option<SeekFn>,
  ) -> *mut AVIOContext;

  // ========================================================================
  // Format Detection
  // ========================================================================

  /// Guess the input format from probe data
  ///
  /// # Arguments
  /// * `is_opened` - Whether the file is already opened (skips AVFMT_NOFILE formats when 1)
  pub fn av_probe_input_format(pd: *mut AVProbeData, is_opened: c_int) -> *const AVInputFormat;
}

// ============================================================================
// Constants
// ============================================================================

/// Seek flags
pub mod seek_flag {
  use std::os::raw::c_int;

  /// Seek backward
  pub const BACKWARD: c_int = 1;
}

/// Custom I/O seek whence values
pub mod seek_whence {
  use std::os::raw::c_int;

  pub const SEEK_SET: c_int = 0;
  pub const SEEK_CUR: c_int = 1;
  pub const SEEK_END: c_int = 2;
  /// Return the stream size instead of seeking
  pub const AVSEEK_SIZE: c_int = 0x10000;
  /// Flag OR-ed into whence; ignored here
  pub const AVSEEK_FORCE: c_int = 0x20000;
}
