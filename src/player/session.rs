//! Stream session
//!
//! The host-facing aggregate: one open container, its video stream, its
//! optional audio stream, and the clocks tying them together. The host
//! drives it once per display tick with `advance`, `get_video_frame`,
//! `fill_audio` and `get_position`.

use crate::config::PlayerConfig;
use crate::engine::{
  Container, DecoderOptions, Engine, MediaKind, OpenOptions, SeekWindow, StreamInfo,
};
use crate::error::{PlayerError, PlayerResult};
use crate::source::{read_prefix, MediaSource};
use crate::time::MediaTime;

use super::audio::AudioStream;
use super::clock::{ClockState, MonotonicTicks, TickSource};
use super::demux::DemuxScheduler;
use super::video::{DropCounters, VideoStream};

/// RGBA frame handed to the host
#[derive(Debug, Clone, Copy)]
pub struct VideoFrame<'a> {
  /// `width * height * 4` bytes, rows tightly packed
  pub data: &'a [u8],
  pub width: u32,
  pub height: u32,
  /// Presentation time in seconds, if the frame carried one
  pub pts: Option<f64>,
}

/// Drop counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackStats {
  /// Frames discarded by the drop gate
  pub dropped_frames: u64,
  /// Frames decoded
  pub total_frames: u64,
}

/// Everything that exists only while media is open. Fields drop in
/// declaration order: decoders first, container last.
struct ActiveStreams<C: Container> {
  audio: Option<AudioStream<C::AudioDecoder>>,
  video: VideoStream<C::VideoDecoder>,
  demux: DemuxScheduler<C>,
  length: MediaTime,
}

pub struct Session<E: Engine> {
  config: PlayerConfig,
  ticks: Box<dyn TickSource>,
  clock: ClockState,
  counters: DropCounters,
  active: Option<ActiveStreams<E::Container>>,
}

impl<E: Engine> Session<E> {
  pub fn new(config: PlayerConfig) -> Self {
    Self::with_ticks(config, MonotonicTicks::new())
  }

  /// Session bounded by a custom tick source
  pub fn with_ticks(config: PlayerConfig, ticks: impl TickSource + 'static) -> Self {
    Self {
      config,
      ticks: Box::new(ticks),
      clock: ClockState::default(),
      counters: DropCounters::default(),
      active: None,
    }
  }

  pub fn config(&self) -> &PlayerConfig {
    &self.config
  }

  pub fn clock(&self) -> &ClockState {
    &self.clock
  }

  pub fn is_open(&self) -> bool {
    self.active.is_some()
  }

  // ==========================================================================
  // Lifecycle
  // ==========================================================================

  /// Open `source`, replacing whatever was open. Failures are logged.
  pub fn open(&mut self, engine: &E, source: MediaSource) -> bool {
    match self.try_open(engine, source) {
      Ok(()) => true,
      Err(err) => {
        tracing::error!(target: "tickplay::session", "Failed to open media: {}", err);
        false
      }
    }
  }

  pub fn try_open(&mut self, engine: &E, source: MediaSource) -> PlayerResult<()> {
    self.close();

    let mut bytes = source.into_byte_source().map_err(PlayerError::Source)?;
    let prefix = read_prefix(bytes.as_mut(), self.config.io_buffer_size).map_err(PlayerError::Source)?;
    let format = engine.probe(&prefix).ok_or(PlayerError::UnrecognizedFormat)?;
    tracing::debug!(target: "tickplay::session", "Probed format {:?}", format);

    let mut container = engine.open_input(
      bytes,
      &format,
      &OpenOptions {
        io_buffer_size: self.config.io_buffer_size,
      },
    )?;

    let video_info = last_stream(container.streams(), MediaKind::Video).ok_or(PlayerError::NoVideoStream)?;
    let audio_info = last_stream(container.streams(), MediaKind::Audio);

    let options = DecoderOptions {
      thread_count: self.config.decoder_threads,
      output_sample_rate: self.config.output_sample_rate,
    };
    let video_decoder = container.open_video_decoder(&video_info, &options)?;
    let audio = match &audio_info {
      Some(info) => {
        let decoder = container.open_audio_decoder(info, &options)?;
        Some(AudioStream::new(decoder, info, self.config.output_sample_rate))
      }
      None => None,
    };

    let length = video_info
      .duration_time()
      .or_else(|| container.duration())
      .unwrap_or(MediaTime::ZERO);
    let demux = DemuxScheduler::new(
      container,
      video_info.index,
      audio_info.as_ref().map(|info| info.index),
      &self.config,
    );

    self.clock = ClockState::default();
    self.counters = DropCounters::default();
    self.active = Some(ActiveStreams {
      audio,
      video: VideoStream::new(video_decoder, &video_info),
      demux,
      length,
    });
    tracing::debug!(
      target: "tickplay::session",
      "Opened media: video stream {}, audio stream {:?}, length {}",
      video_info.index,
      audio_info.as_ref().map(|info| info.index),
      length
    );
    Ok(())
  }

  /// Release every engine handle
  pub fn close(&mut self) {
    if self.active.take().is_some() {
      tracing::debug!(target: "tickplay::session", "Closed media");
    }
  }

  // ==========================================================================
  // Per-tick API
  // ==========================================================================

  /// Move the wall clock forward by `delta` seconds and read ahead
  pub fn advance(&mut self, delta: f64) {
    let Some(active) = self.active.as_mut() else {
      return;
    };
    self.clock.advance(MediaTime::from_secs_f64(delta));
    active.demux.top_up();
  }

  /// Next presentable frame, or `None` when nothing could be produced
  pub fn get_video_frame(&mut self) -> Option<VideoFrame<'_>> {
    let Some(active) = self.active.as_mut() else {
      return None;
    };
    let frame = active.video.next_frame(
      &mut active.demux,
      &mut self.clock,
      self.ticks.as_ref(),
      &self.config,
      &mut self.counters,
    );
    self.clock.set_selector(super::clock::PositionSource::WallTime);
    let pts = self.clock.video_pts.map(MediaTime::as_secs_f64);
    frame.map(|buffer| {
      let (width, height) = buffer.dimensions();
      VideoFrame {
        data: buffer.data(),
        width,
        height,
        pts,
      }
    })
  }

  /// Fill `out` with interleaved f32 samples; returns frames written
  pub fn fill_audio(&mut self, out: &mut [f32]) -> usize {
    let Some(active) = self.active.as_mut() else {
      return 0;
    };
    match active.audio.as_mut() {
      Some(audio) => audio.fill(out, &mut active.demux, &mut self.clock),
      None => 0,
    }
  }

  /// Playback position in seconds (consumes the position selector)
  pub fn get_position(&mut self) -> f64 {
    self.position_time().as_secs_f64()
  }

  pub(crate) fn position_time(&mut self) -> MediaTime {
    self.clock.position(self.config.position_fudge_time())
  }

  /// Media length in seconds
  pub fn get_length(&self) -> f64 {
    self
      .active
      .as_ref()
      .map_or(0.0, |active| active.length.as_secs_f64())
  }

  /// Wall clock in seconds
  pub fn time(&self) -> f64 {
    self.clock.time.as_secs_f64()
  }

  // ==========================================================================
  // Seek
  // ==========================================================================

  /// Seek to `seconds`; a negative target means the end of the container,
  /// or of the video stream when the container has no duration.
  ///
  /// On failure nothing changes and playback continues from where it was.
  pub fn seek(&mut self, seconds: f64) -> PlayerResult<()> {
    let active = self.active.as_mut().ok_or(PlayerError::NotOpen)?;
    let target = if seconds < 0.0 {
      active.demux.container().duration().unwrap_or(active.length)
    } else {
      MediaTime::from_secs_f64(seconds)
    };
    let window = self.config.seek_window_time();

    let container = active.demux.container_mut();
    if let Err(err) = container.seek(SeekWindow::backward(target, window)) {
      tracing::debug!(target: "tickplay::seek", "Backward seek to {} rejected ({}), widening", target, err);
      container
        .seek(SeekWindow::around(target, window))
        .map_err(|source| {
          tracing::warn!(target: "tickplay::seek", "Seek to {} failed: {}", target, source);
          PlayerError::Seek {
            target: target.as_secs_f64(),
            source,
          }
        })?;
    }

    active.demux.flush();
    active.video.flush();
    if let Some(audio) = active.audio.as_mut() {
      audio.flush();
    }
    self.clock.rearm(target);
    tracing::debug!(target: "tickplay::seek", "Seeked to {}", target);
    Ok(())
  }

  // ==========================================================================
  // Stream properties
  // ==========================================================================

  /// Output channel count, 0 without audio
  pub fn get_channels(&self) -> u16 {
    self
      .active
      .as_ref()
      .and_then(|active| active.audio.as_ref())
      .map_or(0, |audio| audio.channels())
  }

  /// Output sample rate, 0 without audio
  pub fn get_sample_rate(&self) -> u32 {
    self
      .active
      .as_ref()
      .and_then(|active| active.audio.as_ref())
      .map_or(0, |audio| audio.sample_rate())
  }

  /// Video dimensions, (0, 0) when closed
  pub fn get_frame_size(&self) -> (u32, u32) {
    self
      .active
      .as_ref()
      .map_or((0, 0), |active| active.video.dimensions())
  }

  /// Queued (video, audio) units
  pub fn queued_units(&self) -> (usize, usize) {
    self.active.as_ref().map_or((0, 0), |active| {
      (
        active.demux.video_queue().len(),
        active.demux.audio_queue().len(),
      )
    })
  }

  pub fn stats(&self) -> PlaybackStats {
    PlaybackStats {
      dropped_frames: self.counters.dropped,
      total_frames: self.counters.total,
    }
  }
}

fn last_stream(streams: &[StreamInfo], kind: MediaKind) -> Option<StreamInfo> {
  streams.iter().rev().find(|stream| stream.kind == kind).cloned()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::engine::{SyntheticEngine, SyntheticSpec};
  use crate::player::clock::ManualTicks;

  fn open(spec: &SyntheticSpec) -> Session<SyntheticEngine> {
    let mut session = Session::with_ticks(PlayerConfig::default(), ManualTicks::new());
    assert!(session.open(&SyntheticEngine::new(), MediaSource::buffer(spec.to_bytes())));
    session
  }

  #[test]
  fn test_closed_session_is_inert() {
    let mut session: Session<SyntheticEngine> = Session::new(PlayerConfig::default());
    session.advance(0.5);
    assert!(session.get_video_frame().is_none());
    assert_eq!(session.fill_audio(&mut [0.0; 64]), 0);
    assert_eq!(session.get_length(), 0.0);
    assert_eq!(session.get_frame_size(), (0, 0));
    assert!(matches!(session.seek(1.0), Err(PlayerError::NotOpen)));
  }

  #[test]
  fn test_open_failures_leave_session_empty() {
    let mut session: Session<SyntheticEngine> = Session::new(PlayerConfig::default());
    let err = session
      .try_open(&SyntheticEngine::new(), MediaSource::buffer(b"not media".to_vec()))
      .unwrap_err();
    assert!(matches!(err, PlayerError::UnrecognizedFormat));

    let audio_only = SyntheticSpec {
      width: 0,
      ..Default::default()
    };
    let err = session
      .try_open(&SyntheticEngine::new(), MediaSource::buffer(audio_only.to_bytes()))
      .unwrap_err();
    assert!(matches!(err, PlayerError::NoVideoStream));
    assert!(!session.is_open());
    assert!(!session.open(&SyntheticEngine::new(), MediaSource::path("/no/such/file")));
  }

  #[test]
  fn test_stream_properties() {
    let session = open(&SyntheticSpec::default());
    assert_eq!(session.get_channels(), 2);
    assert_eq!(session.get_sample_rate(), 22_050);
    assert_eq!(session.get_frame_size(), (64, 48));
    assert!((session.get_length() - 10.0).abs() < 1e-9);
  }

  #[test]
  fn test_frame_resets_selector() {
    let mut session = open(&SyntheticSpec::default());
    session.advance(1.0 / 30.0);
    let frame = session.get_video_frame().unwrap();
    assert_eq!(frame.pts, Some(0.0));
    assert_eq!(frame.data.len(), 64 * 48 * 4);
    assert_eq!(session.clock().selector(), crate::player::PositionSource::WallTime);
  }

  #[test]
  fn test_seek_then_position() {
    let mut session = open(&SyntheticSpec::default());
    session.advance(0.1);
    session.seek(4.2).unwrap();
    assert!((session.get_position() - 4.2).abs() < 1e-9);
    assert_eq!(session.queued_units(), (0, 0));
    // next frame comes from the keyframe before the target
    session.advance(1.0 / 30.0);
    let frame = session.get_video_frame().unwrap();
    assert_eq!(frame.pts, Some(4.0));
  }

  #[test]
  fn test_advance_zero_is_idempotent() {
    let mut session = open(&SyntheticSpec::default());
    session.advance(0.5);
    let stats = session.stats();
    let time = session.time();
    session.advance(0.0);
    session.advance(0.0);
    assert_eq!(session.time(), time);
    assert_eq!(session.stats(), stats);
  }
}
