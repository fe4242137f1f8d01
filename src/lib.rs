#![deny(clippy::all)]

//! Tick-driven progressive audio/video playback
//!
//! A host calls [`Session::advance`] once per display tick, then pulls the
//! RGBA frame that is due with [`Session::get_video_frame`] and interleaved
//! f32 audio with [`Session::fill_audio`]. Demuxing and decoding happen
//! lazily inside those calls through an [`engine::Engine`].
//!
//! The core has no native dependencies. The `synthetic` feature adds a
//! deterministic in-memory engine used by the integration tests, the
//! `ffmpeg` feature adds an engine backed by libavformat and libavcodec, and
//! the `node` feature exposes a NAPI-RS class on top of the latter.

pub mod config;
pub mod engine;
pub mod error;
pub mod player;
pub mod source;
pub mod time;

// FFmpeg C bindings (hand-written, no bindgen)
#[cfg(feature = "ffmpeg")]
pub mod ffi;

// Safe codec wrappers (RAII)
#[cfg(feature = "ffmpeg")]
pub mod codec;

// Node.js surface (NAPI class)
#[cfg(feature = "node")]
pub mod node;

pub use config::PlayerConfig;
pub use error::{PlayerError, PlayerResult};
pub use player::{AudioSink, FrameSink, Playback, PlaybackStats, Session, VideoFrame};
pub use source::{BufferSource, ByteSource, MediaSource, ReadOnlyBuffer};
pub use time::{MediaTime, TimeBase};

#[cfg(feature = "ffmpeg")]
pub use engine::FfmpegEngine;
