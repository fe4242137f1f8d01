//! FIFO of compressed units for one elementary stream

use std::collections::VecDeque;

use crate::engine::CompressedUnit;

/// Unlocked packet queue with running count and byte totals
pub struct PacketQueue<U> {
  units: VecDeque<U>,
  bytes: usize,
}

impl<U: CompressedUnit> PacketQueue<U> {
  pub fn new() -> Self {
    Self {
      units: VecDeque::new(),
      bytes: 0,
    }
  }

  /// Append a unit. On allocation failure the unit is handed back.
  pub fn put(&mut self, unit: U) -> Result<(), U> {
    if self.units.try_reserve(1).is_err() {
      return Err(unit);
    }
    self.bytes += unit.size();
    self.units.push_back(unit);
    Ok(())
  }

  pub fn get(&mut self) -> Option<U> {
    let unit = self.units.pop_front()?;
    self.bytes -= unit.size();
    Some(unit)
  }

  /// Drop every queued unit; returns how many were released
  pub fn flush(&mut self) -> usize {
    let released = self.units.len();
    self.units.clear();
    self.bytes = 0;
    released
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.units.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.units.is_empty()
  }

  /// Total payload bytes queued
  #[inline]
  pub fn bytes(&self) -> usize {
    self.bytes
  }
}

impl<U: CompressedUnit> Default for PacketQueue<U> {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct TestUnit(usize);

  impl CompressedUnit for TestUnit {
    fn stream_index(&self) -> usize {
      0
    }

    fn size(&self) -> usize {
      self.0
    }

    fn pts(&self) -> Option<i64> {
      None
    }
  }

  #[test]
  fn test_fifo_order_and_totals() {
    let mut queue = PacketQueue::new();
    for size in [10, 20, 30] {
      assert!(queue.put(TestUnit(size)).is_ok());
    }
    assert_eq!(queue.len(), 3);
    assert_eq!(queue.bytes(), 60);

    assert_eq!(queue.get().map(|u| u.0), Some(10));
    assert_eq!(queue.len(), 2);
    assert_eq!(queue.bytes(), 50);
    assert_eq!(queue.get().map(|u| u.0), Some(20));
    assert_eq!(queue.get().map(|u| u.0), Some(30));
    assert!(queue.get().is_none());
    assert_eq!(queue.bytes(), 0);
  }

  #[test]
  fn test_flush_releases_everything() {
    let mut queue = PacketQueue::new();
    for size in 1..=5 {
      assert!(queue.put(TestUnit(size)).is_ok());
    }
    assert_eq!(queue.flush(), 5);
    assert!(queue.is_empty());
    assert_eq!(queue.bytes(), 0);
    assert_eq!(queue.flush(), 0);
  }
}
