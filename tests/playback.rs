mod common;

use std::io::Cursor;
use std::time::Duration;

use common::{frame_index, open, open_with, tick_frame, TICK};
use tickplay::engine::{SyntheticEngine, SyntheticSpec};
use tickplay::player::ManualTicks;
use tickplay::{MediaSource, PlayerConfig, Session};

#[test]
fn test_every_frame_presented_once_at_frame_rate() {
  let spec = SyntheticSpec::default();
  let mut session = open(&spec);
  assert!((session.get_length() - 10.0).abs() < 0.05);

  let mut presented = Vec::new();
  for _ in 0..300 {
    session.advance(TICK);
    let frame = session.get_video_frame().unwrap();
    assert_eq!((frame.width, frame.height), (64, 48));
    let index = frame_index(frame.pts.unwrap(), spec.fps);
    let offset = (2 * 64 + 3) * 4;
    assert_eq!(
      &frame.data[offset..offset + 4],
      &SyntheticSpec::expected_pixel(index, 3, 2)
    );
    presented.push(index);
  }

  assert_eq!(presented, (0..300).collect::<Vec<_>>());
  let stats = session.stats();
  assert_eq!(stats.total_frames, 300);
  assert_eq!(stats.dropped_frames, 0);
  assert!(tick_frame(&mut session, TICK).is_none());
}

#[test]
fn test_slow_decode_keeps_pace() {
  let spec = SyntheticSpec::default();
  let ticks = ManualTicks::new();
  let engine = SyntheticEngine::with_decode_cost(ticks.clone(), Duration::from_millis(2));
  let mut session = open_with(&spec, &engine, ticks, PlayerConfig::default());

  let accepted = (0..300)
    .filter_map(|_| tick_frame(&mut session, TICK))
    .count();
  assert_eq!(accepted, 300);
  assert!(session.stats().dropped_frames <= 5);
}

#[test]
fn test_frame_at_stale_threshold_is_kept() {
  let spec = SyntheticSpec {
    fps: 8,
    audio_channels: 0,
    ..Default::default()
  };
  let mut session = open(&spec);
  for _ in 0..3 {
    session.advance(0.125);
  }
  // clock 0.375, tolerance 0.125: frames at 0 and 0.125 are late, 0.25 is not
  let frame = session.get_video_frame().unwrap();
  assert_eq!(frame.pts, Some(0.25));
  assert_eq!(session.stats().dropped_frames, 2);
  assert_eq!(session.stats().total_frames, 3);
}

#[test]
fn test_drop_floor_bounds_one_request() {
  let spec = SyntheticSpec::default();
  let mut session = open(&spec);
  for _ in 0..10 {
    session.advance(TICK);
  }
  let pts = session.get_video_frame().unwrap().pts.unwrap();
  assert_eq!(frame_index(pts, spec.fps), 5);
  assert_eq!(session.stats().dropped_frames, 5);
}

#[test]
fn test_drop_budget_bounds_one_request() {
  let spec = SyntheticSpec::default();
  let ticks = ManualTicks::new();
  let engine = SyntheticEngine::with_decode_cost(ticks.clone(), Duration::from_millis(2));
  let mut session = open_with(&spec, &engine, ticks, PlayerConfig::default());
  for _ in 0..10 {
    session.advance(TICK);
  }
  // 2 ms per decode against a 5 ms budget: two drops, the third is shown late
  let pts = session.get_video_frame().unwrap().pts.unwrap();
  assert_eq!(frame_index(pts, spec.fps), 2);
  assert_eq!(session.stats().dropped_frames, 2);
}

#[test]
fn test_corrupt_units_are_skipped() {
  let spec = SyntheticSpec {
    corrupt_interval: 10,
    ..Default::default()
  };
  let mut session = open(&spec);

  let presented: Vec<u32> = (0..300)
    .filter_map(|_| tick_frame(&mut session, TICK))
    .map(|pts| frame_index(pts, spec.fps))
    .collect();
  assert_eq!(presented.len(), 270);
  assert!(presented.iter().all(|index| index % 10 != 9));
  assert!(presented.windows(2).all(|pair| pair[0] < pair[1]));
  assert_eq!(session.stats().total_frames, 270);
}

#[test]
fn test_reordering_decoder_is_drained_at_end() {
  let spec = SyntheticSpec {
    duration_ms: 1_000,
    reorder_delay: 4,
    audio_channels: 0,
    ..Default::default()
  };
  let mut session = open(&spec);

  let presented: Vec<u32> = (0..40)
    .filter_map(|_| tick_frame(&mut session, TICK))
    .map(|pts| frame_index(pts, spec.fps))
    .collect();
  assert_eq!(presented, (0..30).collect::<Vec<_>>());
}

#[test]
fn test_audio_less_source() {
  let spec = SyntheticSpec {
    audio_channels: 0,
    ..Default::default()
  };
  let mut session = open(&spec);
  assert_eq!(session.get_channels(), 0);
  assert_eq!(session.get_sample_rate(), 0);

  let mut out = vec![0.0f32; 2048];
  for _ in 0..30 {
    session.advance(TICK);
    assert_eq!(session.fill_audio(&mut out), 0);
    assert!(session.get_video_frame().is_some());
  }
}

#[test]
fn test_small_audio_chunks_reconstruct_stream() {
  let spec = SyntheticSpec::default();
  let expected = spec.resampled_audio(22_050);
  let mut session = open(&spec);
  assert_eq!(session.get_channels(), 2);
  // a single tick whose tolerance spans the whole media: no block is ever
  // early or stale, so only the chunking is exercised
  session.advance(11.0);

  // 37 frames per call, far below the 512 frames a decoded block yields
  let mut out = vec![0.0f32; 37 * 2];
  let mut collected = Vec::with_capacity(expected.len());
  loop {
    let frames = session.fill_audio(&mut out);
    if frames == 0 {
      break;
    }
    collected.extend_from_slice(&out[..frames * 2]);
  }
  assert_eq!(collected.len(), expected.len());
  assert!(collected == expected);
}

#[test]
fn test_data_streams_are_ignored() {
  let spec = SyntheticSpec {
    duration_ms: 2_000,
    data_track: true,
    ..Default::default()
  };
  let mut session = open(&spec);
  let accepted = (0..60)
    .filter_map(|_| tick_frame(&mut session, TICK))
    .count();
  assert_eq!(accepted, 60);
}

#[test]
fn test_open_from_host_reader() {
  common::init_tracing();
  let spec = SyntheticSpec::default();
  let mut session: Session<SyntheticEngine> = Session::with_ticks(PlayerConfig::default(), ManualTicks::new());
  let source = MediaSource::reader(Cursor::new(spec.to_bytes()));
  assert!(session.open(&SyntheticEngine::new(), source));
  assert_eq!(tick_frame(&mut session, TICK), Some(0.0));

  session.close();
  assert!(!session.is_open());
  assert_eq!(session.get_length(), 0.0);
}
