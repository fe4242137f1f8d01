//! Playback orchestration
//!
//! Everything between the engine and the host: packet read-ahead, the
//! per-stream decode loops, the drop gate, the audio ring and the clocks.

pub mod audio;
pub mod clock;
pub mod demux;
pub mod packet_queue;
pub mod playback;
pub mod session;
pub mod video;

pub use clock::{ClockState, ManualTicks, MonotonicTicks, PositionSource, TickSource};
pub use demux::{DemuxScheduler, TopUp};
pub use packet_queue::PacketQueue;
pub use playback::{AudioSink, FrameSink, Playback};
pub use session::{PlaybackStats, Session, VideoFrame};

use crate::engine::{Decoder, FrameTiming, Receive};

/// Where the next unit for a decoder comes from
pub(crate) enum Fetch<U> {
  Unit(U),
  /// The container has no more units
  Exhausted,
  /// Nothing queued right now
  Empty,
}

/// Named exits of one decode loop pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DecodeStep {
  Decoded(FrameTiming),
  Exhausted,
  Failed,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum StreamKind {
  Video,
  Audio,
}

macro_rules! stream_log {
  ($level:ident, $kind:expr, $($arg:tt)+) => {
    match $kind {
      StreamKind::Video => tracing::$level!(target: "tickplay::video", $($arg)+),
      StreamKind::Audio => tracing::$level!(target: "tickplay::audio", $($arg)+),
    }
  };
}

/// Receive one frame, feeding the decoder as needed.
///
/// Once the container is exhausted the decoder gets a single drain signal so
/// frames it still holds come out. Units the decoder rejects are dropped.
pub(crate) fn decode_step<D, F>(
  decoder: &mut D,
  drain_sent: &mut bool,
  kind: StreamKind,
  mut fetch: F,
) -> DecodeStep
where
  D: Decoder,
  F: FnMut() -> Fetch<D::Unit>,
{
  loop {
    match decoder.receive() {
      Ok(Receive::Frame(timing)) => return DecodeStep::Decoded(timing),
      Ok(Receive::Drained) => return DecodeStep::Exhausted,
      Ok(Receive::NeedsInput) => {}
      Err(err) => {
        stream_log!(error, kind, "Receiving frame failed: {}", err);
        return DecodeStep::Failed;
      }
    }

    loop {
      match fetch() {
        Fetch::Unit(unit) => match decoder.send_unit(Some(unit)) {
          Ok(()) => break,
          Err(err) => {
            stream_log!(warn, kind, "Dropping unit the decoder rejected: {}", err);
          }
        },
        Fetch::Exhausted if !*drain_sent => {
          *drain_sent = true;
          stream_log!(debug, kind, "Draining decoder at end of stream");
          if let Err(err) = decoder.send_unit(None) {
            stream_log!(warn, kind, "Drain signal rejected: {}", err);
            return DecodeStep::Exhausted;
          }
          break;
        }
        Fetch::Exhausted | Fetch::Empty => return DecodeStep::Exhausted,
      }
    }
  }
}

/// Upper bound on frames consumed while draining a decoder for a seek
const MAX_DRAIN_FRAMES: usize = 512;

/// Drain a decoder completely, then reset it
pub(crate) fn drain_and_reset<D: Decoder>(decoder: &mut D, drain_sent: &mut bool, kind: StreamKind) {
  if !*drain_sent {
    if let Err(err) = decoder.send_unit(None) {
      stream_log!(debug, kind, "Drain signal rejected during flush: {}", err);
    }
  }
  let mut discarded = 0usize;
  while discarded < MAX_DRAIN_FRAMES {
    match decoder.receive() {
      Ok(Receive::Frame(_)) => discarded += 1,
      Ok(Receive::Drained) | Ok(Receive::NeedsInput) | Err(_) => break,
    }
  }
  decoder.reset();
  *drain_sent = false;
  stream_log!(trace, kind, "Decoder flushed, {} frame(s) discarded", discarded);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::engine::{CompressedUnit, EngineError, EngineResult};
  use std::collections::VecDeque;

  struct Unit(i64, bool);

  impl CompressedUnit for Unit {
    fn stream_index(&self) -> usize {
      0
    }

    fn size(&self) -> usize {
      1
    }

    fn pts(&self) -> Option<i64> {
      Some(self.0)
    }
  }

  /// Holds one frame back until drained; rejects units flagged bad
  #[derive(Default)]
  struct Delayed {
    held: Option<i64>,
    ready: VecDeque<i64>,
    draining: bool,
    resets: usize,
  }

  impl Decoder for Delayed {
    type Unit = Unit;

    fn send_unit(&mut self, unit: Option<Unit>) -> EngineResult<()> {
      match unit {
        None => {
          self.draining = true;
          self.ready.extend(self.held.take());
        }
        Some(Unit(_, true)) => return Err(EngineError::Decode("bad".into())),
        Some(Unit(pts, false)) => {
          if let Some(prev) = self.held.replace(pts) {
            self.ready.push_back(prev);
          }
        }
      }
      Ok(())
    }

    fn receive(&mut self) -> EngineResult<Receive> {
      Ok(match self.ready.pop_front() {
        Some(pts) => Receive::Frame(FrameTiming {
          pts: Some(pts),
          dts: None,
        }),
        None if self.draining => Receive::Drained,
        None => Receive::NeedsInput,
      })
    }

    fn reset(&mut self) {
      self.held = None;
      self.ready.clear();
      self.draining = false;
      self.resets += 1;
    }
  }

  fn run(units: Vec<Unit>) -> Vec<i64> {
    let mut decoder = Delayed::default();
    let mut drain_sent = false;
    let mut units: VecDeque<Unit> = units.into();
    let mut out = Vec::new();
    while let DecodeStep::Decoded(timing) =
      decode_step(&mut decoder, &mut drain_sent, StreamKind::Video, || {
        units.pop_front().map_or(Fetch::Exhausted, Fetch::Unit)
      })
    {
      out.extend(timing.pts);
    }
    assert!(drain_sent);
    out
  }

  #[test]
  fn test_drain_releases_held_frame() {
    let out = run(vec![Unit(0, false), Unit(1, false), Unit(2, false)]);
    assert_eq!(out, vec![0, 1, 2]);
  }

  #[test]
  fn test_rejected_units_are_skipped() {
    let out = run(vec![Unit(0, false), Unit(1, true), Unit(2, false)]);
    assert_eq!(out, vec![0, 2]);
  }

  #[test]
  fn test_drain_and_reset() {
    let mut decoder = Delayed::default();
    let mut drain_sent = true;
    decoder.send_unit(Some(Unit(5, false))).unwrap();
    drain_and_reset(&mut decoder, &mut drain_sent, StreamKind::Audio);
    assert!(!drain_sent);
    assert_eq!(decoder.resets, 1);
    assert_eq!(decoder.receive().unwrap(), Receive::NeedsInput);
  }
}
