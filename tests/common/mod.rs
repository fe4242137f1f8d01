#![allow(dead_code)]

use tickplay::engine::{SyntheticEngine, SyntheticSpec};
use tickplay::player::ManualTicks;
use tickplay::{MediaSource, PlayerConfig, Session};
use tracing_subscriber::EnvFilter;

pub const TICK: f64 = 1.0 / 30.0;

/// Route library logs to the test writer; `RUST_LOG=tickplay=trace` to see them
pub fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}

pub fn open_with(
  spec: &SyntheticSpec,
  engine: &SyntheticEngine,
  ticks: ManualTicks,
  config: PlayerConfig,
) -> Session<SyntheticEngine> {
  init_tracing();
  let mut session = Session::with_ticks(config, ticks);
  session
    .try_open(engine, MediaSource::buffer(spec.to_bytes()))
    .unwrap();
  session
}

pub fn open(spec: &SyntheticSpec) -> Session<SyntheticEngine> {
  open_with(
    spec,
    &SyntheticEngine::new(),
    ManualTicks::new(),
    PlayerConfig::default(),
  )
}

/// Frame index a presentation time in seconds belongs to
pub fn frame_index(pts: f64, fps: u32) -> u32 {
  (pts * fps as f64).round() as u32
}

/// Advance one tick and request a frame; returns its pts
pub fn tick_frame(session: &mut Session<SyntheticEngine>, delta: f64) -> Option<f64> {
  session.advance(delta);
  session.get_video_frame().map(|frame| frame.pts.unwrap_or(f64::NAN))
}
