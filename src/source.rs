//! Host byte sources
//!
//! The decode engine reads containers through a random-access byte source
//! supplied by the host: a file path, an in-memory buffer, or any
//! `Read + Seek` implementation.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::PathBuf;

// ============================================================================
// Buffer Source Trait (zero-copy in-memory input)
// ============================================================================

/// Object-safe trait for read-only buffer access.
///
/// Lets different buffer types (`Vec<u8>`, a JavaScript `Uint8Array`, ...)
/// back a source without copying.
pub trait BufferSource: Send + Sync {
  fn buffer_data(&self) -> &[u8];
}

impl BufferSource for Vec<u8> {
  fn buffer_data(&self) -> &[u8] {
    self
  }
}

impl BufferSource for Box<[u8]> {
  fn buffer_data(&self) -> &[u8] {
    self
  }
}

impl BufferSource for &'static [u8] {
  fn buffer_data(&self) -> &[u8] {
    self
  }
}

// ============================================================================
// Read-Only Buffer
// ============================================================================

/// Seekable reader over a `BufferSource`
pub struct ReadOnlyBuffer {
  source: Box<dyn BufferSource>,
  position: usize,
}

impl ReadOnlyBuffer {
  pub fn new(source: impl BufferSource + 'static) -> Self {
    Self {
      source: Box::new(source),
      position: 0,
    }
  }

  #[inline]
  pub fn as_slice(&self) -> &[u8] {
    self.source.buffer_data()
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.as_slice().len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  #[inline]
  pub fn position(&self) -> usize {
    self.position
  }
}

impl Read for ReadOnlyBuffer {
  fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    let data = self.source.buffer_data();
    let start = self.position.min(data.len());
    let n = buf.len().min(data.len() - start);
    buf[..n].copy_from_slice(&data[start..start + n]);
    self.position = start + n;
    Ok(n)
  }
}

impl Seek for ReadOnlyBuffer {
  fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
    let len = self.len() as i64;
    let target = match pos {
      SeekFrom::Start(offset) => offset as i64,
      SeekFrom::Current(offset) => self.position as i64 + offset,
      SeekFrom::End(offset) => len + offset,
    };
    if target < 0 {
      return Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        "seek before start of buffer",
      ));
    }
    self.position = target as usize;
    Ok(self.position as u64)
  }
}

impl std::fmt::Debug for ReadOnlyBuffer {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ReadOnlyBuffer")
      .field("len", &self.len())
      .field("position", &self.position)
      .finish()
  }
}

// ============================================================================
// ByteSource
// ============================================================================

/// Random-access byte source consumed by the engines
pub trait ByteSource: Read + Seek + Send {
  /// Total length in bytes; the read position is preserved
  fn byte_len(&mut self) -> io::Result<u64> {
    let current = self.stream_position()?;
    let len = self.seek(SeekFrom::End(0))?;
    if current != len {
      self.seek(SeekFrom::Start(current))?;
    }
    Ok(len)
  }
}

impl<T: Read + Seek + Send> ByteSource for T {}

/// Read up to `limit` bytes from the start of `source`, then rewind it
pub fn read_prefix(source: &mut dyn ByteSource, limit: usize) -> io::Result<Vec<u8>> {
  source.seek(SeekFrom::Start(0))?;
  let mut prefix = Vec::with_capacity(limit.min(64 * 1024));
  (&mut *source).take(limit as u64).read_to_end(&mut prefix)?;
  source.seek(SeekFrom::Start(0))?;
  Ok(prefix)
}

// ============================================================================
// MediaSource
// ============================================================================

/// What the host hands to `Session::open`
pub enum MediaSource {
  /// A file on disk
  Path(PathBuf),
  /// An in-memory container
  Buffer(ReadOnlyBuffer),
  /// Any host reader
  Reader(Box<dyn ByteSource>),
}

impl MediaSource {
  pub fn path(path: impl Into<PathBuf>) -> Self {
    Self::Path(path.into())
  }

  pub fn buffer(source: impl BufferSource + 'static) -> Self {
    Self::Buffer(ReadOnlyBuffer::new(source))
  }

  pub fn reader(reader: impl ByteSource + 'static) -> Self {
    Self::Reader(Box::new(reader))
  }

  /// Open the source as a boxed byte source
  pub fn into_byte_source(self) -> io::Result<Box<dyn ByteSource>> {
    match self {
      MediaSource::Path(path) => Ok(Box::new(BufReader::new(File::open(path)?))),
      MediaSource::Buffer(buffer) => Ok(Box::new(buffer)),
      MediaSource::Reader(reader) => Ok(reader),
    }
  }
}

impl std::fmt::Debug for MediaSource {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      MediaSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
      MediaSource::Buffer(buffer) => f.debug_tuple("Buffer").field(buffer).finish(),
      MediaSource::Reader(_) => f.write_str("Reader(..)"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_read_only_buffer_read_and_seek() {
    let mut buffer = ReadOnlyBuffer::new(vec![1u8, 2, 3, 4, 5]);
    let mut out = [0u8; 3];
    assert_eq!(buffer.read(&mut out).unwrap(), 3);
    assert_eq!(out, [1, 2, 3]);
    assert_eq!(buffer.seek(SeekFrom::End(-1)).unwrap(), 4);
    assert_eq!(buffer.read(&mut out).unwrap(), 1);
    assert_eq!(out[0], 5);
    assert_eq!(buffer.read(&mut out).unwrap(), 0);
    assert!(buffer.seek(SeekFrom::Current(-10)).is_err());
  }

  #[test]
  fn test_byte_len_preserves_position() {
    let mut buffer = ReadOnlyBuffer::new(vec![0u8; 10]);
    buffer.seek(SeekFrom::Start(3)).unwrap();
    assert_eq!(buffer.byte_len().unwrap(), 10);
    assert_eq!(buffer.position(), 3);
  }

  #[test]
  fn test_read_prefix_rewinds() {
    let mut source: Box<dyn ByteSource> = Box::new(ReadOnlyBuffer::new(vec![7u8; 100]));
    let prefix = read_prefix(source.as_mut(), 16).unwrap();
    assert_eq!(prefix.len(), 16);
    assert_eq!(source.stream_position().unwrap(), 0);
  }

  #[test]
  fn test_read_prefix_shorter_than_limit() {
    let mut source: Box<dyn ByteSource> = Box::new(ReadOnlyBuffer::new((0u8..10).collect::<Vec<_>>()));
    source.seek(SeekFrom::Start(6)).unwrap();
    let prefix = read_prefix(source.as_mut(), 64).unwrap();
    assert_eq!(prefix, (0u8..10).collect::<Vec<_>>());
    assert_eq!(source.stream_position().unwrap(), 0);
    // the source stays usable through the trait object afterwards
    let mut out = [0u8; 2];
    source.read_exact(&mut out).unwrap();
    assert_eq!(out, [0, 1]);
  }

  #[test]
  fn test_missing_file_is_error() {
    let source = MediaSource::path("/definitely/not/here.mkv");
    assert!(source.into_byte_source().is_err());
  }
}
