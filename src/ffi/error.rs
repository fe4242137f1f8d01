//! FFmpeg return codes and their error type

use std::ffi::CStr;
use std::fmt;
use std::os::raw::c_int;

// ============================================================================
// Error Codes
// ============================================================================

/// End of stream
pub const AVERROR_EOF: c_int = fferrtag(b'E', b'O', b'F', b' ');

/// Malformed input
pub const AVERROR_INVALIDDATA: c_int = fferrtag(b'I', b'N', b'D', b'A');

// Negated errno values, platform dependent

/// Output not available in this state, feed more input
#[cfg(target_os = "macos")]
pub const AVERROR_EAGAIN: c_int = -35;

#[cfg(not(target_os = "macos"))]
pub const AVERROR_EAGAIN: c_int = -11;

/// Returned from the custom I/O callbacks when the host source fails
pub const AVERROR_EIO: c_int = -5;

const fn fferrtag(a: u8, b: u8, c: u8, d: u8) -> c_int {
  -((a as c_int) | ((b as c_int) << 8) | ((c as c_int) << 16) | ((d as c_int) << 24))
}

// ============================================================================
// FFmpegError
// ============================================================================

/// A negative FFmpeg return code with its `av_strerror` text
#[derive(Clone)]
pub struct FFmpegError {
  pub code: c_int,
  pub message: String,
}

impl FFmpegError {
  pub fn from_code(code: c_int) -> Self {
    Self {
      code,
      message: error_message(code),
    }
  }

  #[inline]
  pub fn is_invalid_data(&self) -> bool {
    self.code == AVERROR_INVALIDDATA
  }
}

impl fmt::Debug for FFmpegError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FFmpegError")
      .field("code", &self.code)
      .field("message", &self.message)
      .finish()
  }
}

impl fmt::Display for FFmpegError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} (code {})", self.message, self.code)
  }
}

impl std::error::Error for FFmpegError {}

pub type FFmpegResult<T> = Result<T, FFmpegError>;

/// `Ok(ret)` for non-negative return codes
#[inline]
pub fn check_error(ret: c_int) -> FFmpegResult<c_int> {
  if ret < 0 {
    Err(FFmpegError::from_code(ret))
  } else {
    Ok(ret)
  }
}

fn error_message(code: c_int) -> String {
  let mut buf = [0 as std::os::raw::c_char; 256];
  unsafe {
    super::avutil::av_strerror(code, buf.as_mut_ptr(), buf.len());
    CStr::from_ptr(buf.as_ptr()).to_string_lossy().into_owned()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_tags() {
    assert_eq!(AVERROR_EOF, -0x20464f45);
    assert!(AVERROR_INVALIDDATA < 0);
  }

  #[test]
  fn test_check_error() {
    assert_eq!(check_error(3).unwrap(), 3);
    let err = check_error(AVERROR_INVALIDDATA).unwrap_err();
    assert!(err.is_invalid_data());
    assert!(!err.message.is_empty());
  }
}
