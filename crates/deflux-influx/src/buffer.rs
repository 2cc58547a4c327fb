// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Batching buffer for encoded points.
//!
//! Accumulates Line Protocol lines and hands out a batch either when the
//! batch is full or when the configured time interval has elapsed.

use crate::point::Point;
use std::time::{Duration, Instant};

/// A batching buffer that collects encoded points.
///
/// Lines are accumulated until either:
/// - The buffer reaches `max_size` (size-based flush)
/// - `flush_interval` has elapsed since the last flush (time-based flush)
pub struct BatchBuffer {
    lines: Vec<String>,
    max_size: usize,
    flush_interval: Duration,
    last_flush: Instant,
    skipped: u64,
}

impl BatchBuffer {
    /// Create a new batch buffer. A `max_size` of zero is treated as one.
    pub fn new(max_size: usize, flush_interval: Duration) -> Self {
        let max_size = max_size.max(1);
        Self {
            lines: Vec::with_capacity(max_size),
            max_size,
            flush_interval,
            last_flush: Instant::now(),
            skipped: 0,
        }
    }

    /// Encode a point and add it to the buffer.
    ///
    /// Returns `Some(batch)` if the buffer is now full and should be written,
    /// or `None` if there is still room. Points without fields are counted
    /// and discarded.
    pub fn push(&mut self, point: &Point) -> Option<Vec<String>> {
        match point.to_line_protocol() {
            Some(line) => {
                self.lines.push(line);
                if self.lines.len() >= self.max_size {
                    Some(self.flush())
                } else {
                    None
                }
            }
            None => {
                self.skipped += 1;
                tracing::debug!(
                    measurement = point.measurement(),
                    "point has no fields, not buffered"
                );
                None
            }
        }
    }

    /// Check if a time-based flush is due.
    pub fn should_flush(&self) -> bool {
        !self.lines.is_empty() && self.last_flush.elapsed() >= self.flush_interval
    }

    /// Take all accumulated lines and reset the timer.
    pub fn flush(&mut self) -> Vec<String> {
        self.last_flush = Instant::now();
        std::mem::replace(&mut self.lines, Vec::with_capacity(self.max_size))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Points discarded because they carried no fields.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}
