//! Audio decode loop and sample delivery
//!
//! Decoded audio is resampled one frame at a time into an [`AudioRing`] and
//! handed out in whatever chunk sizes the host asks for. While the audio
//! clock has not caught up with the wall clock (the reset state), stale
//! frames are skipped and frames from the future are held back.

use crate::engine::{AudioDecoder, Container, StreamInfo};
use crate::time::{MediaTime, TimeBase};

use super::clock::ClockState;
use super::demux::DemuxScheduler;
use super::{decode_step, drain_and_reset, DecodeStep, Fetch, StreamKind};

// ============================================================================
// AudioRing
// ============================================================================

/// One resampled frame of interleaved samples with a read cursor
#[derive(Debug, Default)]
pub struct AudioRing {
  samples: Vec<f32>,
  channels: usize,
  /// Read position in frames
  cursor: usize,
  /// Unread frames
  remaining: usize,
  /// Presentation time of the held frame
  frame_time: MediaTime,
}

impl AudioRing {
  pub fn new(channels: usize) -> Self {
    Self {
      channels: channels.max(1),
      ..Default::default()
    }
  }

  /// Storage to resample into; call [`AudioRing::load`] afterwards
  fn storage(&mut self) -> &mut Vec<f32> {
    &mut self.samples
  }

  /// Mark `frames` freshly written frames as unread
  fn load(&mut self, frames: usize, time: MediaTime) {
    let capacity = self.capacity_frames();
    self.cursor = 0;
    self.remaining = frames.min(capacity);
    self.frame_time = time;
  }

  /// Copy up to `out.len() / channels` frames out; returns frames copied
  pub fn take(&mut self, out: &mut [f32]) -> usize {
    let frames = self.remaining.min(out.len() / self.channels);
    if frames == 0 {
      return 0;
    }
    let start = self.cursor * self.channels;
    let len = frames * self.channels;
    out[..len].copy_from_slice(&self.samples[start..start + len]);
    self.cursor += frames;
    self.remaining -= frames;
    frames
  }

  pub fn clear(&mut self) {
    self.cursor = 0;
    self.remaining = 0;
  }

  #[inline]
  pub fn remaining(&self) -> usize {
    self.remaining
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.remaining == 0
  }

  #[inline]
  pub fn frame_time(&self) -> MediaTime {
    self.frame_time
  }

  fn capacity_frames(&self) -> usize {
    self.samples.len() / self.channels
  }
}

// ============================================================================
// Audio stream
// ============================================================================

pub struct AudioStream<D: AudioDecoder> {
  decoder: D,
  time_base: TimeBase,
  channels: u16,
  sample_rate: u32,
  ring: AudioRing,
  drain_sent: bool,
  /// Expected start of the next frame, for frames without timestamps
  next_time: MediaTime,
}

impl<D: AudioDecoder> AudioStream<D> {
  pub fn new(decoder: D, stream: &StreamInfo, sample_rate: u32) -> Self {
    let channels = decoder.channels();
    Self {
      decoder,
      time_base: stream.time_base,
      channels,
      sample_rate,
      ring: AudioRing::new(channels as usize),
      drain_sent: false,
      next_time: MediaTime::ZERO,
    }
  }

  /// Fill `out` with interleaved samples; returns frames written
  pub fn fill<C>(
    &mut self,
    out: &mut [f32],
    demux: &mut DemuxScheduler<C>,
    clock: &mut ClockState,
  ) -> usize
  where
    C: Container<Unit = D::Unit>,
  {
    let channels = self.channels as usize;
    if channels == 0 {
      return 0;
    }
    let request = out.len() / channels;
    let reset = clock.audio_reset();

    if reset && !self.ring.is_empty() {
      if self.ring.frame_time() > clock.time {
        return 0;
      }
      if clock.time - self.ring.frame_time() > clock.diff_tolerance {
        tracing::trace!(target: "tickplay::audio", "Discarding {} stale frame(s)", self.ring.remaining());
        self.ring.clear();
      }
    }

    let mut delivered = self.ring.take(out);
    let mut first_frame = true;

    while delivered < request {
      if self.ring.is_empty() {
        let step = decode_step(&mut self.decoder, &mut self.drain_sent, StreamKind::Audio, || {
          match demux.next_audio_unit() {
            Some(unit) => Fetch::Unit(unit),
            None if demux.is_exhausted() => Fetch::Exhausted,
            None => Fetch::Empty,
          }
        });
        let timing = match step {
          DecodeStep::Decoded(timing) => timing,
          DecodeStep::Exhausted => {
            if delivered == 0 {
              clock.audio_time = None;
            }
            return delivered;
          }
          DecodeStep::Failed => return delivered,
        };

        let time = timing
          .effective()
          .map(|ts| self.time_base.to_media_time(ts))
          .unwrap_or(self.next_time);
        if first_frame {
          clock.audio_time = Some(time);
          first_frame = false;
        }

        let frames = match self.decoder.resample_into(self.ring.storage()) {
          Ok(frames) => frames,
          Err(err) => {
            tracing::warn!(target: "tickplay::audio", "Resampling failed, frame skipped: {}", err);
            self.ring.clear();
            continue;
          }
        };
        self.ring.load(frames, time);
        self.next_time = time + frames_to_time(frames, self.sample_rate);
      }

      if reset {
        if clock.time - self.ring.frame_time() > clock.diff_tolerance {
          self.ring.clear();
        } else if self.ring.frame_time() > clock.time {
          clock.audio_time = None;
          break;
        }
      }

      delivered += self.ring.take(&mut out[delivered * channels..]);
    }
    delivered
  }

  /// Forget decoder and ring state after a seek
  pub fn flush(&mut self) {
    drain_and_reset(&mut self.decoder, &mut self.drain_sent, StreamKind::Audio);
    self.ring.clear();
  }

  pub fn channels(&self) -> u16 {
    self.channels
  }

  pub fn sample_rate(&self) -> u32 {
    self.sample_rate
  }

  pub fn ring(&self) -> &AudioRing {
    &self.ring
  }
}

fn frames_to_time(frames: usize, rate: u32) -> MediaTime {
  if rate == 0 {
    return MediaTime::ZERO;
  }
  MediaTime::from_nanos((frames as i128 * 1_000_000_000 / rate as i128) as i64)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn loaded_ring(frames: usize) -> AudioRing {
    let mut ring = AudioRing::new(2);
    ring.storage().clear();
    ring.storage().extend((0..frames * 2).map(|i| i as f32));
    ring.load(frames, MediaTime::from_millis(100));
    ring
  }

  #[test]
  fn test_take_in_chunks() {
    let mut ring = loaded_ring(5);
    let mut out = [0.0f32; 4];
    assert_eq!(ring.take(&mut out), 2);
    assert_eq!(out, [0.0, 1.0, 2.0, 3.0]);
    assert_eq!(ring.take(&mut out), 2);
    assert_eq!(out, [4.0, 5.0, 6.0, 7.0]);
    assert_eq!(ring.take(&mut out), 1);
    assert_eq!(&out[..2], &[8.0, 9.0]);
    assert!(ring.is_empty());
    assert_eq!(ring.take(&mut out), 0);
  }

  #[test]
  fn test_odd_output_length_rounds_down() {
    let mut ring = loaded_ring(3);
    let mut out = [0.0f32; 3];
    assert_eq!(ring.take(&mut out), 1);
    assert_eq!(ring.remaining(), 2);
  }

  #[test]
  fn test_load_never_exceeds_capacity() {
    let mut ring = loaded_ring(2);
    ring.load(10, MediaTime::ZERO);
    assert_eq!(ring.remaining(), 2);
    ring.clear();
    assert!(ring.is_empty());
    assert_eq!(ring.frame_time(), MediaTime::ZERO);
  }

  #[test]
  fn test_frames_to_time() {
    assert_eq!(frames_to_time(22_050, 22_050), MediaTime::from_secs(1));
    assert_eq!(frames_to_time(10, 0), MediaTime::ZERO);
  }
}
