//! Media time primitives
//!
//! All playback clocks are kept in signed integer nanoseconds so that tick
//! accumulation and timestamp comparisons are exact. Seconds as `f64` only
//! appear at the host boundary.

use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::time::Duration;

const NANOS_PER_SEC: i64 = 1_000_000_000;

// ============================================================================
// MediaTime
// ============================================================================

/// A point or span on the media timeline, in nanoseconds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MediaTime(i64);

impl MediaTime {
  pub const ZERO: Self = Self(0);

  #[inline]
  pub const fn from_nanos(nanos: i64) -> Self {
    Self(nanos)
  }

  #[inline]
  pub const fn from_micros(micros: i64) -> Self {
    Self(micros.saturating_mul(1_000))
  }

  #[inline]
  pub const fn from_millis(millis: i64) -> Self {
    Self(millis.saturating_mul(1_000_000))
  }

  #[inline]
  pub const fn from_secs(secs: i64) -> Self {
    Self(secs.saturating_mul(NANOS_PER_SEC))
  }

  /// Convert from host seconds, rounding to the nearest nanosecond
  ///
  /// Non-finite input maps to zero.
  pub fn from_secs_f64(secs: f64) -> Self {
    if !secs.is_finite() {
      return Self::ZERO;
    }
    // `as` saturates on overflow
    Self((secs * NANOS_PER_SEC as f64).round() as i64)
  }

  #[inline]
  pub const fn as_nanos(self) -> i64 {
    self.0
  }

  /// Whole microseconds, rounded toward negative infinity
  #[inline]
  pub const fn as_micros(self) -> i64 {
    self.0.div_euclid(1_000)
  }

  #[inline]
  pub fn as_secs_f64(self) -> f64 {
    self.0 as f64 / NANOS_PER_SEC as f64
  }

  /// Convert a (non-negative) host duration
  pub fn from_duration(duration: Duration) -> Self {
    Self(i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX))
  }

  /// Convert to a host duration, clamping negative values to zero
  pub fn to_duration(self) -> Duration {
    Duration::from_nanos(self.0.max(0) as u64)
  }

  #[inline]
  pub const fn is_negative(self) -> bool {
    self.0 < 0
  }

  #[inline]
  pub const fn is_positive(self) -> bool {
    self.0 > 0
  }

  #[inline]
  pub fn abs_diff(self, other: Self) -> Self {
    Self(self.0.saturating_sub(other.0).saturating_abs())
  }
}

impl Add for MediaTime {
  type Output = Self;

  #[inline]
  fn add(self, rhs: Self) -> Self {
    Self(self.0.saturating_add(rhs.0))
  }
}

impl AddAssign for MediaTime {
  #[inline]
  fn add_assign(&mut self, rhs: Self) {
    *self = *self + rhs;
  }
}

impl Sub for MediaTime {
  type Output = Self;

  #[inline]
  fn sub(self, rhs: Self) -> Self {
    Self(self.0.saturating_sub(rhs.0))
  }
}

impl SubAssign for MediaTime {
  #[inline]
  fn sub_assign(&mut self, rhs: Self) {
    *self = *self - rhs;
  }
}

impl Neg for MediaTime {
  type Output = Self;

  #[inline]
  fn neg(self) -> Self {
    Self(self.0.saturating_neg())
  }
}

impl fmt::Display for MediaTime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:.3}s", self.as_secs_f64())
  }
}

// ============================================================================
// TimeBase
// ============================================================================

/// Rational unit of a stream's integer timestamps
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimeBase {
  /// Numerator
  pub num: i32,
  /// Denominator
  pub den: i32,
}

impl TimeBase {
  pub const fn new(num: i32, den: i32) -> Self {
    Self { num, den }
  }

  /// Microsecond time base (FFmpeg's `AV_TIME_BASE_Q`)
  pub const MICROSECONDS: Self = Self::new(1, 1_000_000);

  /// 90 kHz MPEG clock
  pub const MPEG: Self = Self::new(1, 90_000);

  pub fn is_valid(&self) -> bool {
    self.num > 0 && self.den > 0
  }

  /// Convert a timestamp in this base to media time (floor)
  pub fn to_media_time(self, ts: i64) -> MediaTime {
    if !self.is_valid() {
      return MediaTime::ZERO;
    }
    let nanos = (ts as i128 * self.num as i128 * NANOS_PER_SEC as i128)
      .div_euclid(self.den as i128);
    MediaTime::from_nanos(clamp_i128(nanos))
  }

  /// Convert media time to a timestamp in this base (floor)
  pub fn from_media_time(self, time: MediaTime) -> i64 {
    if !self.is_valid() {
      return 0;
    }
    let ts = (time.as_nanos() as i128 * self.den as i128)
      .div_euclid(self.num as i128 * NANOS_PER_SEC as i128);
    clamp_i128(ts)
  }

  pub fn as_f64(&self) -> f64 {
    if self.den == 0 {
      0.0
    } else {
      self.num as f64 / self.den as f64
    }
  }
}

fn clamp_i128(value: i128) -> i64 {
  value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_secs_round_trip() {
    let t = MediaTime::from_secs_f64(1.5);
    assert_eq!(t.as_nanos(), 1_500_000_000);
    assert_eq!(t.as_secs_f64(), 1.5);
    assert_eq!(MediaTime::from_secs_f64(f64::NAN), MediaTime::ZERO);
  }

  #[test]
  fn test_tick_accumulation_is_exact() {
    let tick = MediaTime::from_secs_f64(1.0 / 30.0);
    let mut time = MediaTime::ZERO;
    for _ in 0..30 {
      time += tick;
    }
    assert_eq!(time.as_nanos(), 30 * tick.as_nanos());
  }

  #[test]
  fn test_time_base_conversion() {
    let tb = TimeBase::MPEG;
    assert_eq!(tb.to_media_time(45_000), MediaTime::from_millis(500));
    assert_eq!(tb.from_media_time(MediaTime::from_millis(500)), 45_000);
    // floors toward negative infinity
    assert_eq!(tb.to_media_time(-1).as_nanos(), -11_112);
    assert_eq!(TimeBase::new(0, 0).to_media_time(100), MediaTime::ZERO);
  }

  #[test]
  fn test_saturating_arithmetic() {
    let max = MediaTime::from_nanos(i64::MAX);
    assert_eq!(max + MediaTime::from_secs(1), max);
    assert_eq!(MediaTime::from_millis(5) - MediaTime::from_millis(7), MediaTime::from_millis(-2));
    assert_eq!(MediaTime::from_millis(-2).to_duration(), Duration::ZERO);
  }
}
