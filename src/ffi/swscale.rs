//! libswscale function declarations
//!
//! Pixel format conversion for presentable RGBA frames.

use super::types::*;
use std::os::raw::c_int;

unsafe extern "C" {
  /// Get a cached context, reusing `context` if the parameters still match
  ///
  /// With a NULL context this behaves like sws_getContext.
  pub fn sws_getCachedContext(
    context: *mut SwsContext,
    srcW: c_int,
    srcH: c_int,
    srcFormat: c_int,
    dstW: c_int,
    dstH: c_int,
    dstFormat: c_int,
    flags: c_int,
    srcFilter: *mut SwsFilter,
    dstFilter: *mut SwsFilter,
    param: *const f64,
  ) -> *mut SwsContext;

  /// Free the swscaler context
  pub fn sws_freeContext(swsContext: *mut SwsContext);

  /// Scale the image slice in srcSlice into dst
  ///
  /// # Returns
  /// Height of the output slice
  pub fn sws_scale(
    c: *mut SwsContext,
    srcSlice: *const *const u8,
    srcStride: *const c_int,
    srcSliceY: c_int,
    srcSliceH: c_int,
    dst: *const *mut u8,
    dstStride: *const c_int,
  ) -> c_int;
}

/// Opaque SwsFilter structure
#[repr(C)]
pub struct SwsFilter {
  _opaque: [u8; 0],
  _marker: std::marker::PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

// ============================================================================
// Scaling Algorithm Flags
// ============================================================================

pub const SWS_FAST_BILINEAR: c_int = 1;
pub const SWS_BILINEAR: c_int = 2;
pub const SWS_POINT: c_int = 0x10;
