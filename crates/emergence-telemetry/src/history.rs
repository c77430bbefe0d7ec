//! Bounded, newest-first history of accepted stream frames.

use std::collections::VecDeque;

use emergence_types::StreamFrame;

/// Maximum frames kept in memory.
pub const HISTORY_CAPACITY: usize = 500;

/// Recent stream frames, newest first.
///
/// Order is push order, not tick order: a server restart that rewinds the
/// tick counter still shows up as the newest entry.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    /// Frames, newest at the front.
    frames: VecDeque<StreamFrame>,
    /// Upper bound on `frames.len()`.
    capacity: usize,
}

impl HistoryBuffer {
    /// Create an empty buffer holding at most [`HISTORY_CAPACITY`] frames.
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// Create an empty buffer with a custom bound. A bound of zero is
    /// treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a frame at the front.
    ///
    /// If the buffer is full, the oldest frame is removed.
    pub fn push(&mut self, frame: StreamFrame) {
        self.frames.push_front(frame);
        if self.frames.len() > self.capacity {
            self.frames.truncate(self.capacity);
        }
    }

    /// The most recently pushed frame.
    pub fn latest(&self) -> Option<&StreamFrame> {
        self.frames.front()
    }

    /// Number of frames held.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no frame has been pushed yet.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The configured bound.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &StreamFrame> {
        self.frames.iter()
    }

    /// Copy out the frames, newest first.
    pub fn to_vec(&self) -> Vec<StreamFrame> {
        self.frames.iter().copied().collect()
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emergence_types::{Season, Weather};

    fn frame(tick: u64) -> StreamFrame {
        StreamFrame {
            tick,
            season: Season::Spring,
            weather: Weather::Clear,
            agents_alive: 10,
            deaths_this_tick: 0,
            actions_resolved: 10,
        }
    }

    #[test]
    fn empty_buffer_has_no_latest() {
        let buffer = HistoryBuffer::new();
        assert!(buffer.is_empty());
        assert!(buffer.latest().is_none());
    }

    #[test]
    fn push_is_newest_first() {
        let mut buffer = HistoryBuffer::new();
        for tick in 1..=3 {
            buffer.push(frame(tick));
        }
        let ticks: Vec<u64> = buffer.iter().map(|f| f.tick).collect();
        assert_eq!(ticks, vec![3, 2, 1]);
        assert_eq!(buffer.latest().map(|f| f.tick), Some(3));
    }

    #[test]
    fn caps_at_capacity_and_evicts_oldest() {
        let mut buffer = HistoryBuffer::new();
        for tick in 0..600u64 {
            buffer.push(frame(tick));
        }
        assert_eq!(buffer.len(), HISTORY_CAPACITY);
        assert_eq!(buffer.latest().map(|f| f.tick), Some(599));
        assert_eq!(buffer.iter().last().map(|f| f.tick), Some(100));
    }

    #[test]
    fn order_follows_pushes_not_ticks() {
        let mut buffer = HistoryBuffer::with_capacity(3);
        for tick in [10, 11, 2, 3] {
            buffer.push(frame(tick));
        }
        let ticks: Vec<u64> = buffer.to_vec().iter().map(|f| f.tick).collect();
        assert_eq!(ticks, vec![3, 2, 11]);
    }

    #[test]
    fn zero_capacity_keeps_one() {
        let mut buffer = HistoryBuffer::with_capacity(0);
        buffer.push(frame(1));
        buffer.push(frame(2));
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.capacity(), 1);
    }
}
