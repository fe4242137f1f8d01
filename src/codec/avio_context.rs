//! Custom I/O context wrapper for FFmpeg's AVIO system
//!
//! Lets a demuxer pull bytes from any [`ByteSource`]: in-memory buffers, files
//! and host-provided readers all go through the same read/seek callbacks.

use crate::ffi::accessors::{fffio_free, fffio_get_opaque};
use crate::ffi::avformat::{avio_alloc_context, seek_whence, AVIOContext};
use crate::ffi::avutil::{av_free, av_malloc};
use crate::ffi::error::{AVERROR_EIO, AVERROR_EOF};
use crate::source::ByteSource;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::os::raw::{c_int, c_void};
use std::ptr::NonNull;

use super::{CodecError, CodecResult};

/// Smallest AVIO buffer we hand to FFmpeg
const MIN_BUFFER_SIZE: usize = 4 * 1024;

/// Read-only custom I/O context
///
/// Owns the boxed source passed to FFmpeg as the callback opaque pointer.
pub struct SourceIoContext {
  ptr: NonNull<AVIOContext>,
}

impl SourceIoContext {
  /// Wrap `source` in an AVIOContext with a `buffer_size` byte buffer
  pub fn new(source: Box<dyn ByteSource>, buffer_size: usize) -> CodecResult<Self> {
    let buffer_size = buffer_size.clamp(MIN_BUFFER_SIZE, c_int::MAX as usize);

    let buffer = unsafe { av_malloc(buffer_size) } as *mut u8;
    if buffer.is_null() {
      return Err(CodecError::AllocationFailed("AVIO buffer"));
    }

    // Double box: the trait object is fat, the opaque pointer must be thin
    let opaque = Box::into_raw(Box::new(source)) as *mut c_void;

    let ptr = unsafe {
      avio_alloc_context(
        buffer,
        buffer_size as c_int,
        0, // write_flag = 0 for reading
        opaque,
        Some(read_callback),
        None,
        Some(seek_callback),
      )
    };

    match NonNull::new(ptr) {
      Some(ptr) => Ok(Self { ptr }),
      None => {
        unsafe {
          av_free(buffer as *mut c_void);
          drop(Box::from_raw(opaque as *mut Box<dyn ByteSource>));
        }
        Err(CodecError::AllocationFailed("AVIOContext"))
      }
    }
  }

  /// Get the raw AVIOContext pointer
  pub fn as_ptr(&self) -> *mut AVIOContext {
    self.ptr.as_ptr()
  }
}

impl Drop for SourceIoContext {
  fn drop(&mut self) {
    unsafe {
      let opaque = fffio_get_opaque(self.ptr.as_ptr());

      let mut ptr = self.ptr.as_ptr();
      fffio_free(&mut ptr);

      if !opaque.is_null() {
        drop(Box::from_raw(opaque as *mut Box<dyn ByteSource>));
      }
    }
  }
}

// SAFETY: the context and its source are only touched through &mut self or
// from FFmpeg calls made by the owning demuxer
unsafe impl Send for SourceIoContext {}

// ============================================================================
// FFmpeg Callbacks
// ============================================================================

unsafe extern "C" fn read_callback(opaque: *mut c_void, buf: *mut u8, buf_size: c_int) -> c_int {
  if opaque.is_null() || buf.is_null() || buf_size <= 0 {
    return AVERROR_EIO;
  }

  // SAFETY: opaque was set by SourceIoContext::new and lives until Drop
  let source = unsafe { &mut *(opaque as *mut Box<dyn ByteSource>) };
  // SAFETY: FFmpeg hands us a writable buffer of buf_size bytes
  let data = unsafe { std::slice::from_raw_parts_mut(buf, buf_size as usize) };

  loop {
    match source.read(data) {
      Ok(0) => return AVERROR_EOF,
      Ok(n) => return n as c_int,
      Err(err) if err.kind() == ErrorKind::Interrupted => continue,
      Err(err) => {
        tracing::warn!(target: "tickplay::engine", "Source read failed: {}", err);
        return AVERROR_EIO;
      }
    }
  }
}

unsafe extern "C" fn seek_callback(opaque: *mut c_void, offset: i64, whence: c_int) -> i64 {
  if opaque.is_null() {
    return AVERROR_EIO as i64;
  }

  // SAFETY: opaque was set by SourceIoContext::new and lives until Drop
  let source = unsafe { &mut *(opaque as *mut Box<dyn ByteSource>) };
  let whence = whence & !seek_whence::AVSEEK_FORCE;

  if whence == seek_whence::AVSEEK_SIZE {
    return match source.byte_len() {
      Ok(len) => len as i64,
      Err(_) => AVERROR_EIO as i64,
    };
  }

  let seek_from = match whence {
    seek_whence::SEEK_SET if offset >= 0 => SeekFrom::Start(offset as u64),
    seek_whence::SEEK_CUR => SeekFrom::Current(offset),
    seek_whence::SEEK_END => SeekFrom::End(offset),
    _ => return AVERROR_EIO as i64,
  };

  match source.seek(seek_from) {
    Ok(pos) => pos as i64,
    Err(err) => {
      tracing::debug!(target: "tickplay::engine", "Source seek failed: {}", err);
      AVERROR_EIO as i64
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::source::ReadOnlyBuffer;

  #[test]
  fn test_context_creation() {
    let source = Box::new(ReadOnlyBuffer::new(vec![1u8, 2, 3, 4, 5]));
    let ctx = SourceIoContext::new(source, 0);
    assert!(ctx.is_ok());
  }

  #[test]
  fn test_callbacks_read_and_seek_source() {
    let source: Box<dyn ByteSource> = Box::new(ReadOnlyBuffer::new(vec![10u8, 20, 30, 40]));
    let opaque = Box::into_raw(Box::new(source)) as *mut c_void;
    let mut buf = [0u8; 3];
    unsafe {
      assert_eq!(seek_callback(opaque, 0, seek_whence::AVSEEK_SIZE), 4);
      assert_eq!(seek_callback(opaque, 1, seek_whence::SEEK_SET), 1);
      assert_eq!(read_callback(opaque, buf.as_mut_ptr(), 3), 3);
      assert_eq!(buf, [20, 30, 40]);
      assert_eq!(read_callback(opaque, buf.as_mut_ptr(), 3), AVERROR_EOF);
      assert_eq!(seek_callback(opaque, -1, seek_whence::SEEK_SET), AVERROR_EIO as i64);
      drop(Box::from_raw(opaque as *mut Box<dyn ByteSource>));
    }
  }
}
