//! Demux scheduler
//!
//! Owns the container and both packet queues. Reading happens synchronously
//! on the caller's thread: proactively in `top_up` once per tick, and
//! reactively when a decoder finds its queue empty.

use crate::config::PlayerConfig;
use crate::engine::{CompressedUnit, Container};

use super::packet_queue::PacketQueue;

/// Outcome of a read-ahead pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopUp {
  /// The video queue reached the read-ahead depth
  Filled,
  /// The container has no more units
  Exhausted,
}

pub struct DemuxScheduler<C: Container> {
  container: C,
  video_index: usize,
  audio_index: Option<usize>,
  video_queue: PacketQueue<C::Unit>,
  audio_queue: PacketQueue<C::Unit>,
  read_ahead_depth: usize,
  max_queued_units: usize,
  at_eof: bool,
}

impl<C: Container> DemuxScheduler<C> {
  pub fn new(
    container: C,
    video_index: usize,
    audio_index: Option<usize>,
    config: &PlayerConfig,
  ) -> Self {
    Self {
      container,
      video_index,
      audio_index,
      video_queue: PacketQueue::new(),
      audio_queue: PacketQueue::new(),
      read_ahead_depth: config.read_ahead_depth.max(1),
      max_queued_units: config.max_queued_units,
      at_eof: false,
    }
  }

  /// Keep the video queue at the read-ahead depth
  pub fn top_up(&mut self) -> TopUp {
    while self.video_queue.len() < self.read_ahead_depth {
      if !self.read_one() {
        return TopUp::Exhausted;
      }
    }
    TopUp::Filled
  }

  pub fn next_video_unit(&mut self) -> Option<C::Unit> {
    if let Some(unit) = self.video_queue.get() {
      return Some(unit);
    }
    self.top_up();
    self.video_queue.get()
  }

  /// Read until an audio unit shows up, the container runs dry, or the video
  /// queue hits its cap
  pub fn next_audio_unit(&mut self) -> Option<C::Unit> {
    loop {
      if let Some(unit) = self.audio_queue.get() {
        return Some(unit);
      }
      if self.video_queue.len() >= self.max_queued_units || !self.read_one() {
        return None;
      }
    }
  }

  /// Drop every queued unit and clear the end-of-stream mark
  pub fn flush(&mut self) {
    let video = self.video_queue.flush();
    let audio = self.audio_queue.flush();
    self.at_eof = false;
    tracing::debug!(
      target: "tickplay::queue",
      "Flushed {} video and {} audio unit(s)",
      video,
      audio
    );
  }

  #[inline]
  pub fn is_exhausted(&self) -> bool {
    self.at_eof
  }

  pub fn container(&self) -> &C {
    &self.container
  }

  pub fn container_mut(&mut self) -> &mut C {
    &mut self.container
  }

  pub fn video_queue(&self) -> &PacketQueue<C::Unit> {
    &self.video_queue
  }

  pub fn audio_queue(&self) -> &PacketQueue<C::Unit> {
    &self.audio_queue
  }

  /// Read and route one unit; `false` once the container is exhausted
  fn read_one(&mut self) -> bool {
    if self.at_eof {
      return false;
    }
    let unit = match self.container.read_unit() {
      Ok(Some(unit)) => unit,
      Ok(None) => {
        tracing::debug!(target: "tickplay::demux", "End of stream");
        self.at_eof = true;
        return false;
      }
      Err(err) => {
        tracing::warn!(target: "tickplay::demux", "Read failed, treating as end of stream: {}", err);
        self.at_eof = true;
        return false;
      }
    };

    let index = unit.stream_index();
    let queue = if index == self.video_index {
      &mut self.video_queue
    } else if Some(index) == self.audio_index {
      &mut self.audio_queue
    } else {
      tracing::trace!(target: "tickplay::demux", "Dropping unit of unselected stream {}", index);
      return true;
    };
    tracing::trace!(
      target: "tickplay::demux",
      "Queued unit of stream {} ({} bytes, pts {:?})",
      index,
      unit.size(),
      unit.pts()
    );
    if queue.put(unit).is_err() {
      tracing::warn!(target: "tickplay::queue", "Queue allocation failed, unit of stream {} dropped", index);
    }
    true
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::engine::{Engine, OpenOptions, SyntheticEngine, SyntheticSpec};
  use crate::source::ReadOnlyBuffer;

  fn scheduler(spec: &SyntheticSpec, config: &PlayerConfig) -> DemuxScheduler<crate::engine::synthetic::SyntheticContainer> {
    let engine = SyntheticEngine::new();
    let bytes = spec.to_bytes();
    let format = engine.probe(&bytes).unwrap();
    let container = engine
      .open_input(
        Box::new(ReadOnlyBuffer::new(bytes)),
        &format,
        &OpenOptions { io_buffer_size: 4096 },
      )
      .unwrap();
    let audio = if spec.has_audio() { Some(1) } else { None };
    DemuxScheduler::new(container, 0, audio, config)
  }

  #[test]
  fn test_top_up_reaches_depth() {
    let config = PlayerConfig::default();
    let mut demux = scheduler(&SyntheticSpec::default(), &config);
    assert_eq!(demux.top_up(), TopUp::Filled);
    assert_eq!(demux.video_queue().len(), 24);
    assert!(demux.audio_queue().len() > 0);
    assert!(demux.audio_queue().bytes() > 0);
    // already full: no further reads
    let audio = demux.audio_queue().len();
    assert_eq!(demux.top_up(), TopUp::Filled);
    assert_eq!(demux.audio_queue().len(), audio);
  }

  #[test]
  fn test_exhaustion_and_flush() {
    let spec = SyntheticSpec {
      duration_ms: 500,
      ..Default::default()
    };
    let config = PlayerConfig::default();
    let mut demux = scheduler(&spec, &config);
    assert_eq!(demux.top_up(), TopUp::Exhausted);
    assert!(demux.is_exhausted());
    assert_eq!(demux.video_queue().len(), 15);

    demux.flush();
    assert!(!demux.is_exhausted());
    assert!(demux.video_queue().is_empty());
    assert_eq!(demux.audio_queue().bytes(), 0);
  }

  #[test]
  fn test_other_streams_are_dropped() {
    let spec = SyntheticSpec {
      audio_channels: 0,
      data_track: true,
      ..Default::default()
    };
    let config = PlayerConfig::default();
    let mut demux = scheduler(&spec, &config);
    let mut frames = 0;
    while let Some(unit) = demux.next_video_unit() {
      assert_eq!(unit.stream_index(), 0);
      frames += 1;
    }
    assert_eq!(frames, 300);
    assert!(demux.audio_queue().is_empty());
  }

  #[test]
  fn test_audio_refill_is_capped() {
    let config = PlayerConfig {
      max_queued_units: 10,
      ..Default::default()
    };
    // audio units far apart relative to video frames
    let spec = SyntheticSpec {
      audio_rate: 8_000,
      samples_per_frame: 8_000,
      ..Default::default()
    };
    let mut demux = scheduler(&spec, &config);
    assert!(demux.next_audio_unit().is_some());
    // the second audio unit sits 30 video frames later, past the cap
    assert!(demux.next_audio_unit().is_none());
    assert_eq!(demux.video_queue().len(), 10);
    assert!(!demux.is_exhausted());
  }
}
