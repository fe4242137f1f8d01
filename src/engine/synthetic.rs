//! Deterministic in-process engine
//!
//! Understands a tiny binary container description (`SYNT` + little-endian
//! `u32` fields) and produces video frames and audio blocks whose content is
//! a pure function of their position, so playback output can be checked
//! sample for sample. Decoder reorder delay, corrupt units and per-frame
//! decode cost can be dialed in to exercise the player's failure paths.

use std::collections::VecDeque;
use std::io::Read;
use std::time::Duration;

use super::{
  AudioDecoder, CompressedUnit, Container, Decoder, DecoderOptions, Engine, EngineError,
  EngineResult, FrameTiming, MediaKind, OpenOptions, Receive, RgbaView, SeekWindow, StreamInfo,
  VideoDecoder,
};
use crate::player::clock::ManualTicks;
use crate::source::ByteSource;
use crate::time::{MediaTime, TimeBase};

const MAGIC: &[u8; 4] = b"SYNT";
const FIELD_COUNT: usize = 12;

/// Serialized header size
pub const HEADER_LEN: usize = MAGIC.len() + FIELD_COUNT * 4;

/// Extra bytes at the end of every rendered RGBA row
pub const ROW_PADDING: usize = 16;

const KEYFRAME_UNIT_SIZE: usize = 4096;
const DELTA_UNIT_SIZE: usize = 1024;
const DATA_UNIT_SIZE: usize = 16;

// ============================================================================
// Container description
// ============================================================================

/// Description of a synthetic container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticSpec {
  /// Frame width; 0 means no video stream
  pub width: u32,
  pub height: u32,
  pub fps: u32,
  pub duration_ms: u32,
  /// Frames between keyframes
  pub keyframe_interval: u32,
  /// 0 means no audio stream
  pub audio_channels: u32,
  pub audio_rate: u32,
  /// Input samples per audio unit
  pub samples_per_frame: u32,
  /// Frames the video decoder holds back before emitting
  pub reorder_delay: u32,
  /// Every Nth video unit fails to decode (0 disables)
  pub corrupt_interval: u32,
  /// Adds a data stream with one unit per second
  pub data_track: bool,
  /// Container duration past the end of every stream
  pub trailer_ms: u32,
}

impl Default for SyntheticSpec {
  fn default() -> Self {
    Self {
      width: 64,
      height: 48,
      fps: 30,
      duration_ms: 10_000,
      keyframe_interval: 30,
      audio_channels: 2,
      audio_rate: 44_100,
      samples_per_frame: 1024,
      reorder_delay: 0,
      corrupt_interval: 0,
      data_track: false,
      trailer_ms: 0,
    }
  }
}

impl SyntheticSpec {
  pub fn to_bytes(&self) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_LEN);
    bytes.extend_from_slice(MAGIC);
    for field in self.fields() {
      bytes.extend_from_slice(&field.to_le_bytes());
    }
    bytes
  }

  /// Parse a header; `None` if the bytes are not a synthetic container
  pub fn parse(bytes: &[u8]) -> Option<Self> {
    if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
      return None;
    }
    let mut fields = [0u32; FIELD_COUNT];
    for (i, chunk) in bytes[MAGIC.len()..HEADER_LEN].chunks_exact(4).enumerate() {
      fields[i] = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    Some(Self {
      width: fields[0],
      height: fields[1],
      fps: fields[2],
      duration_ms: fields[3],
      keyframe_interval: fields[4],
      audio_channels: fields[5],
      audio_rate: fields[6],
      samples_per_frame: fields[7],
      reorder_delay: fields[8],
      corrupt_interval: fields[9],
      data_track: fields[10] != 0,
      trailer_ms: fields[11],
    })
  }

  fn fields(&self) -> [u32; FIELD_COUNT] {
    [
      self.width,
      self.height,
      self.fps,
      self.duration_ms,
      self.keyframe_interval,
      self.audio_channels,
      self.audio_rate,
      self.samples_per_frame,
      self.reorder_delay,
      self.corrupt_interval,
      self.data_track as u32,
      self.trailer_ms,
    ]
  }

  fn validate(&self) -> EngineResult<()> {
    if self.has_video() && self.keyframe_interval == 0 {
      return Err(EngineError::InvalidData("keyframe interval is zero".into()));
    }
    if self.has_audio() && (self.audio_rate == 0 || self.samples_per_frame == 0) {
      return Err(EngineError::InvalidData(
        "audio stream without rate or frame size".into(),
      ));
    }
    Ok(())
  }

  pub fn has_video(&self) -> bool {
    self.width > 0 && self.height > 0 && self.fps > 0
  }

  pub fn has_audio(&self) -> bool {
    self.audio_channels > 0
  }

  pub fn video_frame_count(&self) -> u32 {
    if !self.has_video() {
      return 0;
    }
    (self.duration_ms as u64 * self.fps as u64 / 1000) as u32
  }

  /// Timestamp of video frame `index` in the 90 kHz video time base
  pub fn video_pts(&self, index: u32) -> i64 {
    (index as u64 * 90_000 / self.fps.max(1) as u64) as i64
  }

  pub fn is_keyframe(&self, index: u32) -> bool {
    index % self.keyframe_interval.max(1) == 0
  }

  pub fn is_corrupt(&self, index: u32) -> bool {
    self.corrupt_interval > 0 && index % self.corrupt_interval == self.corrupt_interval - 1
  }

  pub fn audio_sample_count(&self) -> u64 {
    if !self.has_audio() {
      return 0;
    }
    self.duration_ms as u64 * self.audio_rate as u64 / 1000
  }

  pub fn audio_unit_count(&self) -> u32 {
    let spf = self.samples_per_frame.max(1) as u64;
    self.audio_sample_count().div_ceil(spf) as u32
  }

  /// RGBA pixel of frame `index` at (`x`, `y`)
  pub fn expected_pixel(index: u32, x: u32, y: u32) -> [u8; 4] {
    [index as u8, x as u8, y as u8, 255]
  }

  /// Output sample `frame` of `channel` after resampling
  pub fn sample_value(frame: u64, channel: usize) -> f32 {
    let magnitude = (frame % 1000) as f32 / 1000.0;
    if channel % 2 == 0 {
      magnitude
    } else {
      -magnitude
    }
  }

  /// The complete interleaved audio stream as decoded at `out_rate`
  pub fn resampled_audio(&self, out_rate: u32) -> Vec<f32> {
    let frames = scale_ceil(self.audio_sample_count(), out_rate, self.audio_rate);
    let channels = self.audio_channels as usize;
    let mut samples = Vec::with_capacity(frames as usize * channels);
    for m in 0..frames {
      for c in 0..channels {
        samples.push(Self::sample_value(m, c));
      }
    }
    samples
  }

  fn streams(&self) -> Vec<StreamInfo> {
    let mut streams = Vec::new();
    if self.has_video() {
      streams.push(StreamInfo {
        index: streams.len(),
        kind: MediaKind::Video,
        time_base: TimeBase::MPEG,
        duration: Some(self.video_pts(self.video_frame_count())),
        width: Some(self.width),
        height: Some(self.height),
        sample_rate: None,
        channels: None,
      });
    }
    if self.has_audio() {
      streams.push(StreamInfo {
        index: streams.len(),
        kind: MediaKind::Audio,
        time_base: TimeBase::new(1, self.audio_rate as i32),
        duration: Some(self.audio_sample_count() as i64),
        width: None,
        height: None,
        sample_rate: Some(self.audio_rate),
        channels: Some(self.audio_channels),
      });
    }
    if self.data_track {
      streams.push(StreamInfo {
        index: streams.len(),
        kind: MediaKind::Other,
        time_base: TimeBase::new(1, 1000),
        duration: Some(self.duration_ms as i64),
        width: None,
        height: None,
        sample_rate: None,
        channels: None,
      });
    }
    streams
  }
}

/// `ceil(value * num / den)`
fn scale_ceil(value: u64, num: u32, den: u32) -> u64 {
  if den == 0 {
    return 0;
  }
  (value * num as u64).div_ceil(den as u64)
}

// ============================================================================
// Units
// ============================================================================

/// A synthetic compressed unit
#[derive(Debug)]
pub struct SyntheticUnit {
  stream_index: usize,
  /// Frame / block number within its stream
  index: u32,
  pts: i64,
  size: usize,
  corrupt: bool,
}

impl CompressedUnit for SyntheticUnit {
  fn stream_index(&self) -> usize {
    self.stream_index
  }

  fn size(&self) -> usize {
    self.size
  }

  fn pts(&self) -> Option<i64> {
    Some(self.pts)
  }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
  stream: usize,
  kind: MediaKind,
  index: u32,
  time: MediaTime,
}

fn kind_rank(kind: MediaKind) -> u8 {
  match kind {
    MediaKind::Video => 0,
    MediaKind::Audio => 1,
    MediaKind::Other => 2,
  }
}

// ============================================================================
// Engine
// ============================================================================

/// Engine for synthetic containers
#[derive(Debug, Clone, Default)]
pub struct SyntheticEngine {
  decode_cost: Option<(ManualTicks, Duration)>,
}

impl SyntheticEngine {
  pub fn new() -> Self {
    Self::default()
  }

  /// Advance `ticks` by `cost` for every decoded video frame
  pub fn with_decode_cost(ticks: ManualTicks, cost: Duration) -> Self {
    Self {
      decode_cost: Some((ticks, cost)),
    }
  }
}

impl Engine for SyntheticEngine {
  type Format = SyntheticSpec;
  type Container = SyntheticContainer;

  fn probe(&self, prefix: &[u8]) -> Option<SyntheticSpec> {
    SyntheticSpec::parse(prefix)
  }

  fn open_input(
    &self,
    mut source: Box<dyn ByteSource>,
    format: &SyntheticSpec,
    _options: &OpenOptions,
  ) -> EngineResult<SyntheticContainer> {
    let mut header = [0u8; HEADER_LEN];
    source.read_exact(&mut header)?;
    let spec = SyntheticSpec::parse(&header)
      .filter(|spec| spec == format)
      .ok_or_else(|| EngineError::InvalidData("header changed since probe".into()))?;
    spec.validate()?;
    tracing::debug!(
      target: "tickplay::engine",
      "Opened synthetic container {}x{}@{} {}ms, {} audio channel(s)",
      spec.width, spec.height, spec.fps, spec.duration_ms, spec.audio_channels
    );
    Ok(SyntheticContainer::new(spec, source, self.decode_cost.clone()))
  }
}

// ============================================================================
// Container
// ============================================================================

pub struct SyntheticContainer {
  spec: SyntheticSpec,
  streams: Vec<StreamInfo>,
  timeline: Vec<Slot>,
  cursor: usize,
  decode_cost: Option<(ManualTicks, Duration)>,
  _source: Box<dyn ByteSource>,
}

impl SyntheticContainer {
  fn new(
    spec: SyntheticSpec,
    source: Box<dyn ByteSource>,
    decode_cost: Option<(ManualTicks, Duration)>,
  ) -> Self {
    let streams = spec.streams();
    let mut timeline = Vec::new();
    for stream in &streams {
      let count = match stream.kind {
        MediaKind::Video => spec.video_frame_count(),
        MediaKind::Audio => spec.audio_unit_count(),
        MediaKind::Other => spec.duration_ms / 1000,
      };
      for index in 0..count {
        let pts = unit_pts(&spec, stream.kind, index);
        timeline.push(Slot {
          stream: stream.index,
          kind: stream.kind,
          index,
          time: stream.time_base.to_media_time(pts),
        });
      }
    }
    timeline.sort_by_key(|slot| (slot.time, kind_rank(slot.kind)));

    Self {
      spec,
      streams,
      timeline,
      cursor: 0,
      decode_cost,
      _source: source,
    }
  }

  fn keyframe_times(&self) -> Vec<MediaTime> {
    let seek_kind = if self.spec.has_video() {
      MediaKind::Video
    } else {
      MediaKind::Audio
    };
    self
      .timeline
      .iter()
      .filter(|slot| slot.kind == seek_kind)
      .filter(|slot| seek_kind != MediaKind::Video || self.spec.is_keyframe(slot.index))
      .map(|slot| slot.time)
      .collect()
  }
}

fn unit_pts(spec: &SyntheticSpec, kind: MediaKind, index: u32) -> i64 {
  match kind {
    MediaKind::Video => spec.video_pts(index),
    MediaKind::Audio => index as i64 * spec.samples_per_frame as i64,
    MediaKind::Other => index as i64 * 1000,
  }
}

impl Container for SyntheticContainer {
  type Unit = SyntheticUnit;
  type VideoDecoder = SyntheticVideoDecoder;
  type AudioDecoder = SyntheticAudioDecoder;

  fn streams(&self) -> &[StreamInfo] {
    &self.streams
  }

  fn duration(&self) -> Option<MediaTime> {
    let total_ms = self.spec.duration_ms as i64 + self.spec.trailer_ms as i64;
    Some(MediaTime::from_millis(total_ms))
  }

  fn read_unit(&mut self) -> EngineResult<Option<SyntheticUnit>> {
    let Some(slot) = self.timeline.get(self.cursor).copied() else {
      return Ok(None);
    };
    self.cursor += 1;

    let size = match slot.kind {
      MediaKind::Video if self.spec.is_keyframe(slot.index) => KEYFRAME_UNIT_SIZE,
      MediaKind::Video => DELTA_UNIT_SIZE,
      MediaKind::Audio => self.spec.samples_per_frame as usize * self.spec.audio_channels as usize * 2,
      MediaKind::Other => DATA_UNIT_SIZE,
    };
    Ok(Some(SyntheticUnit {
      stream_index: slot.stream,
      index: slot.index,
      pts: unit_pts(&self.spec, slot.kind, slot.index),
      size,
      corrupt: slot.kind == MediaKind::Video && self.spec.is_corrupt(slot.index),
    }))
  }

  fn seek(&mut self, window: SeekWindow) -> EngineResult<()> {
    let keyframes = self.keyframe_times();
    let chosen = keyframes
      .iter()
      .rev()
      .find(|t| **t <= window.target && **t >= window.min)
      .or_else(|| {
        keyframes
          .iter()
          .find(|t| **t > window.target && **t <= window.max)
      })
      .copied()
      .ok_or(EngineError::SeekRejected)?;

    self.cursor = self.timeline.partition_point(|slot| slot.time < chosen);
    tracing::trace!(target: "tickplay::engine", "Synthetic seek to keyframe at {}", chosen);
    Ok(())
  }

  fn open_video_decoder(
    &mut self,
    stream: &StreamInfo,
    _options: &DecoderOptions,
  ) -> EngineResult<SyntheticVideoDecoder> {
    if stream.kind != MediaKind::Video {
      return Err(EngineError::DecoderNotFound(format!(
        "stream {} is not video",
        stream.index
      )));
    }
    Ok(SyntheticVideoDecoder {
      width: self.spec.width,
      height: self.spec.height,
      reorder_delay: self.spec.reorder_delay as usize,
      held: VecDeque::new(),
      ready: VecDeque::new(),
      current: None,
      draining: false,
      pixels: Vec::new(),
      rendered: None,
      decode_cost: self.decode_cost.clone(),
    })
  }

  fn open_audio_decoder(
    &mut self,
    stream: &StreamInfo,
    options: &DecoderOptions,
  ) -> EngineResult<SyntheticAudioDecoder> {
    if stream.kind != MediaKind::Audio {
      return Err(EngineError::DecoderNotFound(format!(
        "stream {} is not audio",
        stream.index
      )));
    }
    if options.output_sample_rate == 0 {
      return Err(EngineError::InvalidData("output sample rate is zero".into()));
    }
    Ok(SyntheticAudioDecoder {
      channels: self.spec.audio_channels as u16,
      in_rate: self.spec.audio_rate,
      out_rate: options.output_sample_rate,
      samples_per_frame: self.spec.samples_per_frame as u64,
      total_samples: self.spec.audio_sample_count(),
      ready: VecDeque::new(),
      current: None,
      draining: false,
    })
  }
}

// ============================================================================
// Video decoder
// ============================================================================

pub struct SyntheticVideoDecoder {
  width: u32,
  height: u32,
  reorder_delay: usize,
  held: VecDeque<SyntheticUnit>,
  ready: VecDeque<SyntheticUnit>,
  current: Option<u32>,
  draining: bool,
  pixels: Vec<u8>,
  rendered: Option<u32>,
  decode_cost: Option<(ManualTicks, Duration)>,
}

impl SyntheticVideoDecoder {
  fn render(&mut self, index: u32) {
    let stride = self.width as usize * 4 + ROW_PADDING;
    self.pixels.clear();
    self.pixels.resize(stride * self.height as usize, 0);
    for y in 0..self.height {
      let row = &mut self.pixels[y as usize * stride..];
      for x in 0..self.width {
        let offset = x as usize * 4;
        row[offset..offset + 4].copy_from_slice(&SyntheticSpec::expected_pixel(index, x, y));
      }
    }
    self.rendered = Some(index);
  }
}

impl Decoder for SyntheticVideoDecoder {
  type Unit = SyntheticUnit;

  fn send_unit(&mut self, unit: Option<SyntheticUnit>) -> EngineResult<()> {
    let Some(unit) = unit else {
      self.draining = true;
      self.ready.extend(self.held.drain(..));
      return Ok(());
    };
    if self.draining {
      return Err(EngineError::Decode("unit sent after end of stream".into()));
    }
    if unit.corrupt {
      return Err(EngineError::Decode(format!(
        "corrupt video unit #{}",
        unit.index
      )));
    }
    self.held.push_back(unit);
    while self.held.len() > self.reorder_delay {
      if let Some(unit) = self.held.pop_front() {
        self.ready.push_back(unit);
      }
    }
    Ok(())
  }

  fn receive(&mut self) -> EngineResult<Receive> {
    if let Some(unit) = self.ready.pop_front() {
      self.current = Some(unit.index);
      if let Some((ticks, cost)) = &self.decode_cost {
        ticks.advance(*cost);
      }
      return Ok(Receive::Frame(FrameTiming {
        pts: Some(unit.pts),
        dts: Some(unit.pts),
      }));
    }
    if self.draining {
      Ok(Receive::Drained)
    } else {
      Ok(Receive::NeedsInput)
    }
  }

  fn reset(&mut self) {
    self.held.clear();
    self.ready.clear();
    self.current = None;
    self.draining = false;
  }
}

impl VideoDecoder for SyntheticVideoDecoder {
  fn dimensions(&self) -> (u32, u32) {
    (self.width, self.height)
  }

  fn rgba_view(&mut self) -> EngineResult<RgbaView<'_>> {
    let index = self
      .current
      .ok_or_else(|| EngineError::Decode("no decoded frame".into()))?;
    if self.rendered != Some(index) {
      self.render(index);
    }
    Ok(RgbaView {
      data: &self.pixels,
      stride: self.width as usize * 4 + ROW_PADDING,
      width: self.width,
      height: self.height,
    })
  }
}

// ============================================================================
// Audio decoder
// ============================================================================

pub struct SyntheticAudioDecoder {
  channels: u16,
  in_rate: u32,
  out_rate: u32,
  samples_per_frame: u64,
  total_samples: u64,
  ready: VecDeque<SyntheticUnit>,
  current: Option<SyntheticUnit>,
  draining: bool,
}

impl Decoder for SyntheticAudioDecoder {
  type Unit = SyntheticUnit;

  fn send_unit(&mut self, unit: Option<SyntheticUnit>) -> EngineResult<()> {
    match unit {
      None => self.draining = true,
      Some(_) if self.draining => {
        return Err(EngineError::Decode("unit sent after end of stream".into()));
      }
      Some(unit) => self.ready.push_back(unit),
    }
    Ok(())
  }

  fn receive(&mut self) -> EngineResult<Receive> {
    if let Some(unit) = self.ready.pop_front() {
      let timing = FrameTiming {
        pts: Some(unit.pts),
        dts: Some(unit.pts),
      };
      self.current = Some(unit);
      return Ok(Receive::Frame(timing));
    }
    if self.draining {
      Ok(Receive::Drained)
    } else {
      Ok(Receive::NeedsInput)
    }
  }

  fn reset(&mut self) {
    self.ready.clear();
    self.current = None;
    self.draining = false;
  }
}

impl AudioDecoder for SyntheticAudioDecoder {
  fn channels(&self) -> u16 {
    self.channels
  }

  fn resample_into(&mut self, out: &mut Vec<f32>) -> EngineResult<usize> {
    let unit = self
      .current
      .as_ref()
      .ok_or_else(|| EngineError::Decode("no decoded frame".into()))?;
    let first = unit.index as u64 * self.samples_per_frame;
    let last = (first + self.samples_per_frame).min(self.total_samples);
    let start = scale_ceil(first, self.out_rate, self.in_rate);
    let end = scale_ceil(last, self.out_rate, self.in_rate);

    out.clear();
    out.reserve((end - start) as usize * self.channels as usize);
    for m in start..end {
      for c in 0..self.channels as usize {
        out.push(SyntheticSpec::sample_value(m, c));
      }
    }
    Ok((end - start) as usize)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::source::ReadOnlyBuffer;

  fn open(spec: &SyntheticSpec) -> SyntheticContainer {
    let engine = SyntheticEngine::new();
    let bytes = spec.to_bytes();
    let format = engine.probe(&bytes).unwrap();
    engine
      .open_input(
        Box::new(ReadOnlyBuffer::new(bytes)),
        &format,
        &OpenOptions {
          io_buffer_size: 4096,
        },
      )
      .unwrap()
  }

  #[test]
  fn test_header_round_trip() {
    let spec = SyntheticSpec {
      data_track: true,
      reorder_delay: 3,
      trailer_ms: 250,
      ..Default::default()
    };
    assert_eq!(SyntheticSpec::parse(&spec.to_bytes()), Some(spec));
    assert_eq!(SyntheticSpec::parse(b"RIFF0000"), None);
  }

  #[test]
  fn test_units_interleaved_in_time_order() {
    let spec = SyntheticSpec::default();
    let mut container = open(&spec);
    let streams = container.streams().to_vec();
    let mut last = MediaTime::from_nanos(i64::MIN);
    let mut counts = [0u32; 2];
    while let Some(unit) = container.read_unit().unwrap() {
      let time = streams[unit.stream_index()]
        .time_base
        .to_media_time(unit.pts().unwrap());
      assert!(time >= last);
      last = time;
      counts[unit.stream_index()] += 1;
    }
    assert_eq!(counts[0], 300);
    assert_eq!(counts[1], spec.audio_unit_count());
  }

  #[test]
  fn test_seek_picks_keyframe_inside_window() {
    let spec = SyntheticSpec::default();
    let mut container = open(&spec);
    let window = SeekWindow::backward(MediaTime::from_millis(4_500), MediaTime::from_secs(10));
    container.seek(window).unwrap();
    let unit = container.read_unit().unwrap().unwrap();
    assert_eq!(unit.stream_index(), 0);
    assert_eq!(unit.pts(), Some(spec.video_pts(120)));

    let before = container.cursor;
    let far = SeekWindow::around(MediaTime::from_secs(100), MediaTime::from_secs(10));
    assert!(matches!(container.seek(far), Err(EngineError::SeekRejected)));
    assert_eq!(container.cursor, before);
  }

  #[test]
  fn test_reorder_delay_needs_drain() {
    let spec = SyntheticSpec {
      reorder_delay: 2,
      ..Default::default()
    };
    let mut container = open(&spec);
    let info = container.streams()[0].clone();
    let mut decoder = container
      .open_video_decoder(
        &info,
        &DecoderOptions {
          thread_count: 1,
          output_sample_rate: 22_050,
        },
      )
      .unwrap();
    for index in 0..2 {
      decoder
        .send_unit(Some(SyntheticUnit {
          stream_index: 0,
          index,
          pts: spec.video_pts(index),
          size: DELTA_UNIT_SIZE,
          corrupt: false,
        }))
        .unwrap();
      assert_eq!(decoder.receive().unwrap(), Receive::NeedsInput);
    }
    decoder.send_unit(None).unwrap();
    assert!(matches!(decoder.receive().unwrap(), Receive::Frame(_)));
    assert!(matches!(decoder.receive().unwrap(), Receive::Frame(_)));
    assert_eq!(decoder.receive().unwrap(), Receive::Drained);
  }

  #[test]
  fn test_resampled_blocks_tile_the_stream() {
    let spec = SyntheticSpec {
      duration_ms: 1_000,
      ..Default::default()
    };
    let expected = spec.resampled_audio(22_050);
    let mut container = open(&spec);
    let info = container.streams()[1].clone();
    let mut decoder = container
      .open_audio_decoder(
        &info,
        &DecoderOptions {
          thread_count: 1,
          output_sample_rate: 22_050,
        },
      )
      .unwrap();

    let mut collected = Vec::new();
    let mut block = Vec::new();
    while let Some(unit) = container.read_unit().unwrap() {
      if unit.stream_index() != 1 {
        continue;
      }
      decoder.send_unit(Some(unit)).unwrap();
      while let Receive::Frame(_) = decoder.receive().unwrap() {
        decoder.resample_into(&mut block).unwrap();
        collected.extend_from_slice(&block);
      }
    }
    assert_eq!(collected, expected);
  }
}
