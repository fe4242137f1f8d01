//! Video decode loop and drop gate

use crate::config::PlayerConfig;
use crate::engine::{Container, EngineResult, RgbaView, StreamInfo, VideoDecoder};
use crate::time::{MediaTime, TimeBase};

use super::clock::{ClockState, TickSource};
use super::demux::DemuxScheduler;
use super::{decode_step, drain_and_reset, DecodeStep, Fetch, StreamKind};

// ============================================================================
// Presentable frame buffer
// ============================================================================

/// Tightly packed RGBA copy of the last accepted frame
#[derive(Debug, Default)]
pub struct PresentableFrameBuffer {
  data: Vec<u8>,
  width: u32,
  height: u32,
}

impl PresentableFrameBuffer {
  /// Copy `view` row by row, honouring its stride
  pub fn store(&mut self, view: &RgbaView<'_>) -> EngineResult<()> {
    let row_bytes = view.width as usize * 4;
    let rows = view.height as usize;
    if row_bytes == 0
      || rows == 0
      || view.stride < row_bytes
      || view.data.len() < view.stride * (rows - 1) + row_bytes
    {
      return Err(crate::engine::EngineError::InvalidData(format!(
        "RGBA view of {}x{} does not fit {} bytes with stride {}",
        view.width,
        view.height,
        view.data.len(),
        view.stride
      )));
    }
    if view.width != self.width || view.height != self.height {
      self.data.resize(row_bytes * rows, 0);
      self.width = view.width;
      self.height = view.height;
    }
    for (dst, src) in self
      .data
      .chunks_exact_mut(row_bytes)
      .zip(view.data.chunks(view.stride))
    {
      dst.copy_from_slice(&src[..row_bytes]);
    }
    Ok(())
  }

  pub fn data(&self) -> &[u8] {
    &self.data
  }

  pub fn dimensions(&self) -> (u32, u32) {
    (self.width, self.height)
  }
}

// ============================================================================
// Video stream
// ============================================================================

/// Counters of the drop gate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropCounters {
  /// Frames discarded as late
  pub dropped: u64,
  /// Frames decoded
  pub total: u64,
}

pub struct VideoStream<D: VideoDecoder> {
  decoder: D,
  time_base: TimeBase,
  buffer: PresentableFrameBuffer,
  drain_sent: bool,
  frame_unwrapped: bool,
}

impl<D: VideoDecoder> VideoStream<D> {
  pub fn new(decoder: D, stream: &StreamInfo) -> Self {
    Self {
      decoder,
      time_base: stream.time_base,
      buffer: PresentableFrameBuffer::default(),
      drain_sent: false,
      frame_unwrapped: false,
    }
  }

  /// Decode up to the next presentable frame and copy it out.
  ///
  /// Late frames are dropped while the per-call tick budget and drop floor
  /// allow; a late frame past either limit is shown anyway.
  pub fn next_frame<C>(
    &mut self,
    demux: &mut DemuxScheduler<C>,
    clock: &mut ClockState,
    ticks: &dyn TickSource,
    config: &PlayerConfig,
    counters: &mut DropCounters,
  ) -> Option<&PresentableFrameBuffer>
  where
    C: Container<Unit = D::Unit>,
  {
    self.frame_unwrapped = false;
    let started = ticks.now();
    let threshold = clock.stale_threshold();
    let grace = clock.in_grace(config.post_seek_grace_ticks);
    let mut dropped_now = 0usize;

    let pts = loop {
      let timing = match decode_step(&mut self.decoder, &mut self.drain_sent, StreamKind::Video, || {
        match demux.next_video_unit() {
          Some(unit) => Fetch::Unit(unit),
          None if demux.is_exhausted() => Fetch::Exhausted,
          None => Fetch::Empty,
        }
      }) {
        DecodeStep::Decoded(timing) => timing,
        DecodeStep::Exhausted => {
          tracing::trace!(target: "tickplay::video", "No more video frames");
          return None;
        }
        DecodeStep::Failed => return None,
      };
      counters.total += 1;

      let pts = timing
        .effective()
        .map(|ts| self.time_base.to_media_time(ts));
      // untimed frames are never stale
      let stale = pts.is_some_and(|pts| pts < threshold);
      if !stale {
        break pts;
      }

      let elapsed = ticks.now().saturating_sub(started);
      if !grace && elapsed < config.drop_budget && dropped_now < config.drop_floor {
        dropped_now += 1;
        counters.dropped += 1;
        tracing::trace!(
          target: "tickplay::video",
          "Dropped late frame at {} (clock {})",
          pts.unwrap_or(MediaTime::ZERO),
          clock.time
        );
        continue;
      }

      if !grace {
        tracing::warn!(
          target: "tickplay::video",
          "Showing late frame at {} (clock {}), dropped {}/{} frames",
          pts.unwrap_or(MediaTime::ZERO),
          clock.time,
          counters.dropped,
          counters.total
        );
      }
      break pts;
    };
    clock.video_pts = pts;

    let view = match self.decoder.rgba_view() {
      Ok(view) => view,
      Err(err) => {
        tracing::warn!(target: "tickplay::video", "RGBA conversion failed: {}", err);
        return None;
      }
    };
    if let Err(err) = self.buffer.store(&view) {
      tracing::warn!(target: "tickplay::video", "Frame copy failed: {}", err);
      return None;
    }
    self.frame_unwrapped = true;
    Some(&self.buffer)
  }

  /// Forget decoder state after a seek
  pub fn flush(&mut self) {
    drain_and_reset(&mut self.decoder, &mut self.drain_sent, StreamKind::Video);
    self.frame_unwrapped = false;
  }

  pub fn dimensions(&self) -> (u32, u32) {
    self.decoder.dimensions()
  }

  /// A frame was copied out during the last request
  pub fn frame_unwrapped(&self) -> bool {
    self.frame_unwrapped
  }

  pub fn buffer(&self) -> &PresentableFrameBuffer {
    &self.buffer
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_store_strips_stride_padding() {
    let mut data = vec![0u8; 2 * 12];
    data[..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
    data[12..20].copy_from_slice(&[9, 10, 11, 12, 13, 14, 15, 16]);
    let view = RgbaView {
      data: &data,
      stride: 12,
      width: 2,
      height: 2,
    };
    let mut buffer = PresentableFrameBuffer::default();
    buffer.store(&view).unwrap();
    assert_eq!(buffer.dimensions(), (2, 2));
    assert_eq!(buffer.data(), &(1..=16).collect::<Vec<u8>>()[..]);
  }

  #[test]
  fn test_store_rejects_short_view_and_keeps_content() {
    let data = vec![7u8; 16];
    let mut buffer = PresentableFrameBuffer::default();
    buffer
      .store(&RgbaView {
        data: &data,
        stride: 8,
        width: 2,
        height: 2,
      })
      .unwrap();
    let short = vec![0u8; 4];
    assert!(buffer
      .store(&RgbaView {
        data: &short,
        stride: 8,
        width: 2,
        height: 2,
      })
      .is_err());
    assert_eq!(buffer.data(), &[7u8; 16][..]);
  }
}
