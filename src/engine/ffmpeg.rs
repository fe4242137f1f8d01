//! FFmpeg-backed engine
//!
//! Probes with libavformat, demuxes through a custom AVIO context over the
//! session's byte source, decodes with libavcodec, converts pictures with
//! libswscale and audio with libswresample.

use super::{
  AudioDecoder, CompressedUnit, Container, Decoder, DecoderOptions, Engine, EngineError,
  EngineResult, FrameTiming, MediaKind, OpenOptions, Receive, RgbaView, SeekWindow, StreamInfo,
  VideoDecoder,
};
use crate::codec::{
  probe_input_format, CodecError, DecodeStatus, DecoderContext, DemuxerContext, Frame,
  InputFormat, Packet, Resampler, RgbaConverter, StreamParams,
};
use crate::ffi::AVRational;
use crate::source::ByteSource;
use crate::time::{MediaTime, TimeBase};

impl From<CodecError> for EngineError {
  fn from(err: CodecError) -> Self {
    match err {
      CodecError::Ffmpeg(err) if err.is_invalid_data() => EngineError::InvalidData(err.to_string()),
      CodecError::Ffmpeg(err) => EngineError::Ffmpeg(err),
      CodecError::DecoderNotFound(name) => EngineError::DecoderNotFound(name),
      CodecError::AllocationFailed(what) => EngineError::Allocation(what),
      CodecError::InvalidConfig(msg) | CodecError::InvalidState(msg) => EngineError::Decode(msg),
    }
  }
}

impl CompressedUnit for Packet {
  fn stream_index(&self) -> usize {
    Packet::stream_index(self).max(0) as usize
  }

  fn size(&self) -> usize {
    Packet::size(self).max(0) as usize
  }

  fn pts(&self) -> Option<i64> {
    Packet::pts(self)
  }
}

// ============================================================================
// Engine
// ============================================================================

/// Engine backed by the linked FFmpeg libraries
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegEngine;

impl Engine for FfmpegEngine {
  type Format = InputFormat;
  type Container = FfmpegContainer;

  fn probe(&self, prefix: &[u8]) -> Option<InputFormat> {
    let format = probe_input_format(prefix);
    match &format {
      Some(format) => tracing::debug!(target: "tickplay::engine", "Probed container: {}", format.name()),
      None => tracing::debug!(target: "tickplay::engine", "Probe failed on {} byte prefix", prefix.len()),
    }
    format
  }

  fn open_input(
    &self,
    source: Box<dyn ByteSource>,
    format: &InputFormat,
    options: &OpenOptions,
  ) -> EngineResult<FfmpegContainer> {
    let demuxer = DemuxerContext::open_source(source, format, options.io_buffer_size)?;
    let streams = demuxer.streams().iter().map(stream_info).collect();
    Ok(FfmpegContainer { demuxer, streams })
  }
}

fn time_base(rational: AVRational) -> TimeBase {
  TimeBase::new(rational.num, rational.den)
}

fn stream_info(params: &StreamParams) -> StreamInfo {
  let kind = if params.is_video() {
    MediaKind::Video
  } else if params.is_audio() {
    MediaKind::Audio
  } else {
    MediaKind::Other
  };
  let nonzero = |v: u32| (v > 0).then_some(v);
  StreamInfo {
    index: params.index,
    kind,
    time_base: time_base(params.time_base),
    duration: params.duration,
    width: nonzero(params.width),
    height: nonzero(params.height),
    sample_rate: nonzero(params.sample_rate),
    channels: nonzero(params.channels),
  }
}

// ============================================================================
// Container
// ============================================================================

/// Opened FFmpeg container
#[derive(Debug)]
pub struct FfmpegContainer {
  demuxer: DemuxerContext,
  streams: Vec<StreamInfo>,
}

impl FfmpegContainer {
  fn open_decoder(&self, stream: &StreamInfo, options: &DecoderOptions) -> EngineResult<DecoderContext> {
    let par = self.demuxer.codec_parameters(stream.index).ok_or_else(|| {
      EngineError::InvalidData(format!("stream {} has no codec parameters", stream.index))
    })?;
    let tb = AVRational::new(stream.time_base.num, stream.time_base.den);
    Ok(DecoderContext::open(par, tb, options.thread_count)?)
  }
}

impl Container for FfmpegContainer {
  type Unit = Packet;
  type VideoDecoder = FfmpegVideoDecoder;
  type AudioDecoder = FfmpegAudioDecoder;

  fn streams(&self) -> &[StreamInfo] {
    &self.streams
  }

  fn duration(&self) -> Option<MediaTime> {
    self.demuxer.duration_us().map(MediaTime::from_micros)
  }

  fn read_unit(&mut self) -> EngineResult<Option<Packet>> {
    Ok(self.demuxer.read_packet()?)
  }

  fn seek(&mut self, window: SeekWindow) -> EngineResult<()> {
    let result = self.demuxer.seek_file(
      window.min.as_micros(),
      window.target.as_micros(),
      window.max.as_micros(),
    );
    match result {
      Ok(()) => Ok(()),
      Err(CodecError::Ffmpeg(err)) => {
        tracing::debug!(target: "tickplay::engine", "avformat_seek_file failed: {}", err);
        Err(EngineError::SeekRejected)
      }
      Err(err) => Err(err.into()),
    }
  }

  fn open_video_decoder(
    &mut self,
    stream: &StreamInfo,
    options: &DecoderOptions,
  ) -> EngineResult<FfmpegVideoDecoder> {
    let ctx = self.open_decoder(stream, options)?;
    Ok(FfmpegVideoDecoder {
      ctx,
      frame: Frame::new()?,
      has_frame: false,
      converter: RgbaConverter::new(),
      rgba: Vec::new(),
      fallback_size: (stream.width.unwrap_or(0), stream.height.unwrap_or(0)),
    })
  }

  fn open_audio_decoder(
    &mut self,
    stream: &StreamInfo,
    options: &DecoderOptions,
  ) -> EngineResult<FfmpegAudioDecoder> {
    let ctx = self.open_decoder(stream, options)?;
    let channels = ctx.channels().max(stream.channels.unwrap_or(0)).min(u16::MAX as u32) as u16;
    Ok(FfmpegAudioDecoder {
      ctx,
      frame: Frame::new()?,
      has_frame: false,
      resampler: Resampler::new(options.output_sample_rate),
      channels,
    })
  }
}

// ============================================================================
// Decoders
// ============================================================================

fn send(ctx: &mut DecoderContext, unit: Option<Packet>) -> EngineResult<()> {
  match ctx.send_packet(unit.as_ref())? {
    true => Ok(()),
    false => Err(EngineError::Decode("decoder input is full".into())),
  }
}

fn receive(ctx: &mut DecoderContext, frame: &mut Frame, has_frame: &mut bool) -> EngineResult<Receive> {
  *has_frame = false;
  match ctx.receive_frame(frame)? {
    DecodeStatus::Frame => {
      *has_frame = true;
      Ok(Receive::Frame(FrameTiming {
        pts: frame.pts(),
        dts: frame.pkt_dts(),
      }))
    }
    DecodeStatus::Again => Ok(Receive::NeedsInput),
    DecodeStatus::Eof => Ok(Receive::Drained),
  }
}

/// Video stream decoder producing RGBA
#[derive(Debug)]
pub struct FfmpegVideoDecoder {
  ctx: DecoderContext,
  frame: Frame,
  has_frame: bool,
  converter: RgbaConverter,
  rgba: Vec<u8>,
  fallback_size: (u32, u32),
}

impl Decoder for FfmpegVideoDecoder {
  type Unit = Packet;

  fn send_unit(&mut self, unit: Option<Packet>) -> EngineResult<()> {
    send(&mut self.ctx, unit)
  }

  fn receive(&mut self) -> EngineResult<Receive> {
    receive(&mut self.ctx, &mut self.frame, &mut self.has_frame)
  }

  fn reset(&mut self) {
    self.ctx.flush();
    self.frame.unref();
    self.has_frame = false;
  }
}

impl VideoDecoder for FfmpegVideoDecoder {
  fn dimensions(&self) -> (u32, u32) {
    match (self.ctx.width(), self.ctx.height()) {
      (0, _) | (_, 0) => self.fallback_size,
      size => size,
    }
  }

  fn rgba_view(&mut self) -> EngineResult<RgbaView<'_>> {
    if !self.has_frame {
      return Err(EngineError::Decode("no decoded frame to convert".into()));
    }
    let stride = self.converter.convert(&self.frame, &mut self.rgba)?;
    Ok(RgbaView {
      data: &self.rgba,
      stride,
      width: self.frame.width(),
      height: self.frame.height(),
    })
  }
}

/// Audio stream decoder producing interleaved f32
#[derive(Debug)]
pub struct FfmpegAudioDecoder {
  ctx: DecoderContext,
  frame: Frame,
  has_frame: bool,
  resampler: Resampler,
  channels: u16,
}

impl Decoder for FfmpegAudioDecoder {
  type Unit = Packet;

  fn send_unit(&mut self, unit: Option<Packet>) -> EngineResult<()> {
    send(&mut self.ctx, unit)
  }

  fn receive(&mut self) -> EngineResult<Receive> {
    receive(&mut self.ctx, &mut self.frame, &mut self.has_frame)
  }

  fn reset(&mut self) {
    self.ctx.flush();
    self.frame.unref();
    self.has_frame = false;
    self.resampler.reset();
  }
}

impl AudioDecoder for FfmpegAudioDecoder {
  fn channels(&self) -> u16 {
    self.channels
  }

  fn resample_into(&mut self, out: &mut Vec<f32>) -> EngineResult<usize> {
    if !self.has_frame {
      out.clear();
      return Err(EngineError::Decode("no decoded frame to resample".into()));
    }
    let frame_channels = self.frame.channels();
    if frame_channels as u16 != self.channels {
      out.clear();
      return Err(EngineError::Decode(format!(
        "channel count changed from {} to {}",
        self.channels, frame_channels
      )));
    }
    Ok(self.resampler.convert(&self.frame, out)?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ffi::{media_type, FFmpegError};
  use crate::ffi::error::AVERROR_INVALIDDATA;

  #[test]
  fn test_stream_info_mapping() {
    let params = StreamParams {
      index: 1,
      codec_type: media_type::AUDIO,
      codec_id: 0,
      time_base: AVRational::new(1, 48_000),
      duration: Some(96_000),
      width: 0,
      height: 0,
      sample_rate: 48_000,
      channels: 2,
    };
    let info = stream_info(&params);
    assert_eq!(info.kind, MediaKind::Audio);
    assert_eq!(info.width, None);
    assert_eq!(info.channels, Some(2));
    assert_eq!(info.duration_time(), Some(MediaTime::from_secs(2)));
  }

  #[test]
  fn test_codec_error_mapping() {
    let err: EngineError = CodecError::Ffmpeg(FFmpegError::from_code(AVERROR_INVALIDDATA)).into();
    assert!(matches!(err, EngineError::InvalidData(_)));
    let err: EngineError = CodecError::DecoderNotFound("vp9".into()).into();
    assert!(matches!(err, EngineError::DecoderNotFound(name) if name == "vp9"));
  }

  #[test]
  fn test_probe_unknown_bytes() {
    assert!(FfmpegEngine.probe(&[]).is_none());
  }
}
