//! Player error types

use std::io;

use crate::engine::EngineError;

/// Errors surfaced by the session API
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
  #[error("No media is open")]
  NotOpen,

  #[error("Failed to open byte source: {0}")]
  Source(#[source] io::Error),

  #[error("Unrecognized container format")]
  UnrecognizedFormat,

  #[error("Container has no video stream")]
  NoVideoStream,

  #[error("Engine error: {0}")]
  Engine(#[from] EngineError),

  #[error("Seek to {target:.3}s failed: {source}")]
  Seek {
    target: f64,
    #[source]
    source: EngineError,
  },
}

pub type PlayerResult<T> = Result<T, PlayerError>;
