mod common;

use common::{frame_index, open, tick_frame, TICK};
use tickplay::engine::{EngineError, SyntheticSpec};
use tickplay::PlayerError;

#[test]
fn test_seek_to_end_lands_on_last_keyframe() {
  let spec = SyntheticSpec::default();
  let mut session = open(&spec);
  session.advance(TICK);
  assert!(session.get_video_frame().is_some());

  session.seek(-1.0).unwrap();
  let pts = session.get_video_frame().unwrap().pts.unwrap();
  let length = session.get_length();
  let keyframe_span = spec.keyframe_interval as f64 / spec.fps as f64;
  assert!(pts <= length);
  assert!(length - pts <= keyframe_span + 1e-9);
  assert_eq!(frame_index(pts, spec.fps), 270);
}

#[test]
fn test_seek_to_end_uses_container_duration() {
  // the container outlasts its streams by two seconds
  let spec = SyntheticSpec {
    trailer_ms: 2_000,
    ..Default::default()
  };
  let mut session = open(&spec);
  assert!((session.get_length() - 10.0).abs() < 0.05);

  session.seek(-1.0).unwrap();
  assert!((session.time() - 12.0).abs() < 1e-9);
  assert!((session.get_position() - 12.0).abs() < 1e-9);
  let pts = session.get_video_frame().unwrap().pts.unwrap();
  assert_eq!(frame_index(pts, spec.fps), 270);
}

#[test]
fn test_frames_after_seek_to_end_drain_reordering_decoder() {
  let spec = SyntheticSpec {
    reorder_delay: 3,
    ..Default::default()
  };
  let mut session = open(&spec);
  for _ in 0..5 {
    tick_frame(&mut session, TICK);
  }
  session.seek(-1.0).unwrap();

  // no tick has passed since the seek, so nothing is dropped
  let mut presented = Vec::new();
  while let Some(frame) = session.get_video_frame() {
    presented.push(frame_index(frame.pts.unwrap(), spec.fps));
  }
  assert_eq!(presented, (270..300).collect::<Vec<_>>());
  assert!(session.get_video_frame().is_none());
}

#[test]
fn test_failed_seek_leaves_playback_untouched() {
  let spec = SyntheticSpec::default();
  let mut session = open(&spec);
  for _ in 0..5 {
    assert!(tick_frame(&mut session, TICK).is_some());
  }
  let queued = session.queued_units();
  let time = session.time();
  let stats = session.stats();

  let err = session.seek(100.0).unwrap_err();
  assert!(matches!(
    err,
    PlayerError::Seek {
      source: EngineError::SeekRejected,
      ..
    }
  ));
  assert_eq!(session.queued_units(), queued);
  assert_eq!(session.time(), time);
  assert_eq!(session.stats(), stats);

  let pts = tick_frame(&mut session, TICK).unwrap();
  assert_eq!(frame_index(pts, spec.fps), 5);
}

#[test]
fn test_backward_seek_restarts_from_keyframe() {
  let spec = SyntheticSpec::default();
  let mut session = open(&spec);
  for _ in 0..90 {
    tick_frame(&mut session, TICK);
  }
  session.seek(1.5).unwrap();
  assert!((session.get_position() - 1.5).abs() < 1e-9);

  // the keyframe at 1.0s is late but inside the post-seek grace period
  let pts = tick_frame(&mut session, TICK).unwrap();
  assert_eq!(frame_index(pts, spec.fps), 30);
}

#[test]
fn test_audio_waits_for_clock_after_seek() {
  let spec = SyntheticSpec::default();
  let mut session = open(&spec);
  session.seek(5.0).unwrap();

  // first audio block after the seek starts at 216 * 1024 / 44100 = 5.0155s
  let mut out = vec![0.0f32; 64 * 2];
  assert_eq!(session.fill_audio(&mut out), 0);

  session.advance(0.02);
  assert_eq!(session.fill_audio(&mut out), 64);
  let first = (216 * 1024u64).div_ceil(2);
  assert_eq!(out[0], SyntheticSpec::sample_value(first, 0));
  assert_eq!(out[1], SyntheticSpec::sample_value(first, 1));
  assert_eq!(out[2], SyntheticSpec::sample_value(first + 1, 0));
}

#[test]
fn test_audio_skips_stale_blocks_after_seek() {
  let spec = SyntheticSpec::default();
  let mut session = open(&spec);
  session.seek(5.0).unwrap();
  session.advance(0.5);
  session.advance(0.1);

  // clock 5.6s with 0.1s tolerance: blocks before 5.5s are discarded,
  // block 237 (5.5031s) is the first one played
  let mut out = vec![0.0f32; 64 * 2];
  assert_eq!(session.fill_audio(&mut out), 64);
  let first = (237 * 1024u64).div_ceil(2);
  assert_eq!(out[0], SyntheticSpec::sample_value(first, 0));
  assert_eq!(out[1], SyntheticSpec::sample_value(first, 1));
}

#[test]
fn test_audio_discards_stale_leftover_after_seek() {
  let spec = SyntheticSpec::default();
  let mut session = open(&spec);
  session.seek(5.0).unwrap();
  session.advance(0.02);

  // 64 of block 216's 512 frames are played, the rest stays buffered
  let mut out = vec![0.0f32; 64 * 2];
  assert_eq!(session.fill_audio(&mut out), 64);
  let leftover = (216 * 1024u64).div_ceil(2) + 64;

  // clock 5.53s with 0.01s tolerance: the buffered frames from 5.0184s and
  // blocks 217 to 237 are stale, block 238 (5.5264s) is the next one played
  session.advance(0.5);
  session.advance(0.01);
  assert_eq!(session.fill_audio(&mut out), 64);
  assert_ne!(out[0], SyntheticSpec::sample_value(leftover, 0));
  let first = (238 * 1024u64).div_ceil(2);
  assert_eq!(out[0], SyntheticSpec::sample_value(first, 0));
  assert_eq!(out[1], SyntheticSpec::sample_value(first, 1));
}
