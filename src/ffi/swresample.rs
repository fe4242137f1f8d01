//! libswresample function declarations
//!
//! Sample rate and sample format conversion for the audio ring.

use super::types::*;
use std::os::raw::{c_int, c_void};

unsafe extern "C" {
  /// Free the given SwrContext and set the pointer to NULL
  pub fn swr_free(s: *mut *mut SwrContext);

  /// Initialize context after user parameters have been set
  pub fn swr_init(s: *mut SwrContext) -> c_int;

  /// Allocate SwrContext if needed and set/reset common parameters
  ///
  /// # Returns
  /// 0 on success, negative AVERROR code on error
  pub fn swr_alloc_set_opts2(
    ps: *mut *mut SwrContext,
    out_ch_layout: *const AVChannelLayout,
    out_sample_fmt: c_int,
    out_sample_rate: c_int,
    in_ch_layout: *const AVChannelLayout,
    in_sample_fmt: c_int,
    in_sample_rate: c_int,
    log_offset: c_int,
    log_ctx: *mut c_void,
  ) -> c_int;

  /// Convert audio
  ///
  /// # Arguments
  /// * `out` - Output buffers, one per plane
  /// * `out_count` - Space available per channel, in samples
  /// * `in_` - Input buffers, one per plane (NULL to flush)
  /// * `in_count` - Input samples per channel
  ///
  /// # Returns
  /// Samples output per channel, negative on error
  pub fn swr_convert(
    s: *mut SwrContext,
    out: *mut *mut u8,
    out_count: c_int,
    in_: *const *const u8,
    in_count: c_int,
  ) -> c_int;

  /// Upper bound on the samples the next swr_convert call will output
  pub fn swr_get_out_samples(s: *const SwrContext, in_samples: c_int) -> c_int;
}
