//! Host-side playback driver
//!
//! Wraps a [`Session`] with play/stop/pause state and the per-tick update a
//! game-engine style host runs: advance, mix audio into a sink, then pull
//! frames until the stream position catches up with playback time.

use crate::engine::Engine;
use crate::error::PlayerResult;
use crate::time::MediaTime;

use super::session::{Session, VideoFrame};

/// Receives presented video frames
pub trait FrameSink {
  fn present(&mut self, frame: VideoFrame<'_>);
}

/// Receives mixed audio; may accept fewer frames than offered
pub trait AudioSink {
  /// Returns the number of frames accepted from `samples`
  fn mix(&mut self, samples: &[f32], channels: u16) -> usize;
}

/// Samples decoded on an earlier tick that the sink has not taken yet
#[derive(Debug, Clone, Copy)]
struct PendingMix {
  offset: usize,
  end: usize,
}

pub struct Playback<E: Engine> {
  session: Session<E>,
  playing: bool,
  paused: bool,
  time: MediaTime,
  seek_backward: bool,
  pcm: Vec<f32>,
  pending: Option<PendingMix>,
}

impl<E: Engine> Playback<E> {
  pub fn new(session: Session<E>) -> Self {
    Self {
      session,
      playing: false,
      paused: false,
      time: MediaTime::ZERO,
      seek_backward: false,
      pcm: Vec::new(),
      pending: None,
    }
  }

  pub fn session(&self) -> &Session<E> {
    &self.session
  }

  pub fn session_mut(&mut self) -> &mut Session<E> {
    &mut self.session
  }

  pub fn into_session(self) -> Session<E> {
    self.session
  }

  /// Start from the beginning
  pub fn play(&mut self) {
    self.stop();
    self.playing = true;
    tracing::debug!(target: "tickplay::session", "Playback started");
  }

  /// Stop and rewind
  pub fn stop(&mut self) {
    if self.playing {
      if let Err(err) = self.seek(0.0) {
        tracing::warn!(target: "tickplay::session", "Rewind on stop failed: {}", err);
      }
    }
    self.playing = false;
  }

  pub fn set_paused(&mut self, paused: bool) {
    self.paused = paused;
  }

  pub fn is_playing(&self) -> bool {
    self.playing
  }

  pub fn is_paused(&self) -> bool {
    self.paused
  }

  /// Single-track playback only; accepted and ignored
  pub fn set_audio_track(&mut self, _index: usize) {}

  /// Playback time in seconds
  pub fn get_playback_position(&mut self) -> f64 {
    self.session.get_position()
  }

  pub fn seek(&mut self, seconds: f64) -> PlayerResult<()> {
    let before = self.time;
    self.session.seek(seconds)?;
    self.time = MediaTime::from_secs_f64(self.session.time());
    self.seek_backward = self.time < before;
    self.pending = None;
    Ok(())
  }

  /// Run one host tick
  pub fn update(&mut self, delta: f64, frames: &mut dyn FrameSink, audio: &mut dyn AudioSink) {
    if !self.playing || self.paused || !self.session.is_open() {
      return;
    }
    let delta_time = MediaTime::from_secs_f64(delta.max(0.0));
    self.time += delta_time;
    self.session.advance(delta);

    self.mix_audio(audio);

    if self.seek_backward {
      if let Some(frame) = self.session.get_video_frame() {
        frames.present(frame);
      }
      self.seek_backward = false;
    }

    while self.playing && self.session.position_time() < self.time {
      match self.session.get_video_frame() {
        Some(frame) => frames.present(frame),
        None => {
          tracing::debug!(target: "tickplay::session", "Out of video frames, stopping");
          self.playing = false;
        }
      }
    }
  }

  fn mix_audio(&mut self, audio: &mut dyn AudioSink) {
    let channels = self.session.get_channels();
    if channels == 0 {
      return;
    }
    let ch = channels as usize;
    let chunk = self.session.config().aux_buffer_frames.max(1) * ch;
    if self.pcm.len() != chunk {
      self.pcm.resize(chunk, 0.0);
      self.pending = None;
    }

    if let Some(pending) = self.pending {
      let mixed = audio.mix(&self.pcm[pending.offset * ch..pending.end * ch], channels);
      let offset = pending.offset + mixed.min(pending.end - pending.offset);
      self.pending = (offset < pending.end).then_some(PendingMix {
        offset,
        end: pending.end,
      });
    }

    if self.pending.is_none() {
      let decoded = self.session.fill_audio(&mut self.pcm);
      if decoded == 0 {
        return;
      }
      let mixed = audio.mix(&self.pcm[..decoded * ch], channels).min(decoded);
      if mixed < decoded {
        self.pending = Some(PendingMix {
          offset: mixed,
          end: decoded,
        });
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::PlayerConfig;
  use crate::engine::{SyntheticEngine, SyntheticSpec};
  use crate::player::clock::ManualTicks;
  use crate::source::MediaSource;

  #[derive(Default)]
  struct Frames(Vec<f64>);

  impl FrameSink for Frames {
    fn present(&mut self, frame: VideoFrame<'_>) {
      self.0.extend(frame.pts);
    }
  }

  /// Takes at most `limit` frames per call
  struct Mixer {
    limit: usize,
    samples: Vec<f32>,
  }

  impl AudioSink for Mixer {
    fn mix(&mut self, samples: &[f32], channels: u16) -> usize {
      let frames = (samples.len() / channels as usize).min(self.limit);
      self
        .samples
        .extend_from_slice(&samples[..frames * channels as usize]);
      frames
    }
  }

  fn playback(spec: &SyntheticSpec) -> Playback<SyntheticEngine> {
    let mut session = Session::with_ticks(PlayerConfig::default(), ManualTicks::new());
    assert!(session.open(&SyntheticEngine::new(), MediaSource::buffer(spec.to_bytes())));
    Playback::new(session)
  }

  #[test]
  fn test_update_requires_play() {
    let mut playback = playback(&SyntheticSpec::default());
    let mut frames = Frames::default();
    let mut mixer = Mixer {
      limit: usize::MAX,
      samples: Vec::new(),
    };
    playback.update(0.1, &mut frames, &mut mixer);
    assert!(frames.0.is_empty());

    playback.play();
    playback.set_paused(true);
    playback.update(0.1, &mut frames, &mut mixer);
    assert!(frames.0.is_empty());
    playback.set_paused(false);
    playback.update(1.0 / 30.0, &mut frames, &mut mixer);
    assert_eq!(frames.0, vec![0.0]);
  }

  #[test]
  fn test_partial_mixes_carry_over() {
    let spec = SyntheticSpec::default();
    let expected = spec.resampled_audio(22_050);
    let mut playback = playback(&spec);
    let mut frames = Frames::default();
    let mut mixer = Mixer {
      limit: 300,
      samples: Vec::new(),
    };
    playback.play();
    playback.update(10.0, &mut frames, &mut mixer);
    for _ in 0..40 {
      playback.update(0.0, &mut frames, &mut mixer);
    }
    assert!(mixer.samples.len() > 1024 * 2 * 5);
    assert_eq!(mixer.samples[..], expected[..mixer.samples.len()]);
  }

  #[test]
  fn test_stops_when_video_runs_out() {
    let spec = SyntheticSpec {
      duration_ms: 200,
      audio_channels: 0,
      ..Default::default()
    };
    let mut playback = playback(&spec);
    let mut frames = Frames::default();
    let mut mixer = Mixer {
      limit: usize::MAX,
      samples: Vec::new(),
    };
    playback.play();
    for _ in 0..10 {
      playback.update(1.0 / 30.0, &mut frames, &mut mixer);
    }
    assert_eq!(frames.0.len(), 6);
    assert!(!playback.is_playing());
    assert!(mixer.samples.is_empty());
  }
}
