// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Batched, non-blocking point writer.
//!
//! ```text
//! WriteApi::write_point --> (unbounded hand-off) --> writer task
//!     writer task: BatchBuffer --> BatchTransport, with retry backlog
//! ```
//!
//! Callers never wait for a flush. Buffering, flush cadence (size and time)
//! and retries all live in the writer task.

use crate::buffer::BatchBuffer;
use crate::config::InfluxConfig;
use crate::point::Point;
use crate::transport::{BatchTransport, HttpTransport, WriteError};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// First retry delay for a failed batch.
const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Upper bound for the exponential retry delay.
const DEFAULT_MAX_RETRY_INTERVAL: Duration = Duration::from_secs(125);

/// Maximum number of lines kept for retry; oldest batches go first.
const DEFAULT_RETRY_BUFFER_LIMIT: usize = 50_000;

/// Sink for time-series points.
///
/// Submission is fire-and-forget: implementations must not block the
/// caller and report no per-point outcome.
pub trait PointWriter {
    fn write_point(&self, point: Point);
}

/// Tuning knobs for the writer task.
#[derive(Debug, Clone)]
pub struct WriterOptions {
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub max_retries: u32,
    pub retry_interval: Duration,
    pub max_retry_interval: Duration,
    pub retry_buffer_limit: usize,
}

impl WriterOptions {
    pub fn from_config(config: &InfluxConfig) -> Self {
        Self {
            batch_size: config.effective_batch_size(),
            flush_interval: config.flush_interval(),
            max_retries: config.effective_max_retries(),
            ..Self::default()
        }
    }

    /// Delay before attempt `attempts + 1`, doubling from `retry_interval`.
    fn backoff(&self, attempts: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempts.saturating_sub(1));
        self.retry_interval
            .saturating_mul(factor)
            .min(self.max_retry_interval)
    }
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            batch_size: crate::config::DEFAULT_BATCH_SIZE,
            flush_interval: Duration::from_millis(crate::config::DEFAULT_FLUSH_INTERVAL_MS),
            max_retries: crate::config::DEFAULT_MAX_RETRIES,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            max_retry_interval: DEFAULT_MAX_RETRY_INTERVAL,
            retry_buffer_limit: DEFAULT_RETRY_BUFFER_LIMIT,
        }
    }
}

/// Counters reported by the writer task when it stops.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriterStats {
    /// Points received from handles.
    pub points_received: u64,
    /// Lines acknowledged by the backend.
    pub lines_written: u64,
    /// Lines given up on (non-retryable, retries exhausted, backlog overflow).
    pub lines_dropped: u64,
    /// Failed delivery attempts.
    pub failed_attempts: u64,
    /// Points discarded because they had no fields.
    pub points_skipped: u64,
}

/// Handle used to submit points. Cheap to clone.
///
/// The writer task keeps running while at least one handle is alive. Once
/// every handle is dropped it flushes the remaining points and stops.
#[derive(Debug, Clone)]
pub struct WriteApi {
    tx: mpsc::UnboundedSender<Point>,
}

/// Join handle of the writer task.
pub struct WriterHandle {
    task: JoinHandle<WriterStats>,
}

impl WriterHandle {
    /// Wait for the writer task to drain and stop.
    pub async fn join(self) -> WriterStats {
        match self.task.await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::error!("writer task failed: {}", e);
                WriterStats::default()
            }
        }
    }
}

impl WriteApi {
    /// Start a writer posting to the configured InfluxDB server.
    pub fn http(config: &InfluxConfig) -> Result<(Self, WriterHandle), WriteError> {
        let transport = HttpTransport::new(config)?;
        tracing::info!(
            endpoint = %transport.endpoint(),
            batch_size = config.effective_batch_size(),
            "InfluxDB writer started"
        );
        Ok(Self::spawn(WriterOptions::from_config(config), transport))
    }

    /// Start a writer task on the current tokio runtime.
    pub fn spawn<T: BatchTransport>(options: WriterOptions, transport: T) -> (Self, WriterHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = WriterTask::new(options, transport, rx);
        let handle = WriterHandle {
            task: tokio::spawn(task.run()),
        };
        (Self { tx }, handle)
    }
}

impl PointWriter for WriteApi {
    fn write_point(&self, point: Point) {
        if self.tx.send(point).is_err() {
            tracing::warn!("writer task stopped, point dropped");
        }
    }
}

struct PendingBatch {
    lines: Vec<String>,
    attempts: u32,
    next_attempt: Instant,
}

struct WriterTask<T> {
    options: WriterOptions,
    transport: T,
    rx: mpsc::UnboundedReceiver<Point>,
    buffer: BatchBuffer,
    backlog: VecDeque<PendingBatch>,
    backlog_lines: usize,
    stats: WriterStats,
}

impl<T: BatchTransport> WriterTask<T> {
    fn new(options: WriterOptions, transport: T, rx: mpsc::UnboundedReceiver<Point>) -> Self {
        let buffer = BatchBuffer::new(options.batch_size, options.flush_interval);
        Self {
            options,
            transport,
            rx,
            buffer,
            backlog: VecDeque::new(),
            backlog_lines: 0,
            stats: WriterStats::default(),
        }
    }

    async fn run(mut self) -> WriterStats {
        let mut ticker = tokio::time::interval(self.options.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                received = self.rx.recv() => {
                    let Some(point) = received else { break };
                    self.stats.points_received += 1;
                    if let Some(batch) = self.buffer.push(&point) {
                        self.submit(batch).await;
                    }
                }
                _ = ticker.tick() => {
                    if self.buffer.should_flush() {
                        let batch = self.buffer.flush();
                        self.submit(batch).await;
                    }
                    self.retry_due().await;
                }
            }
        }

        let rest = self.buffer.flush();
        if !rest.is_empty() {
            self.submit(rest).await;
        }
        self.retry_remaining().await;

        self.stats.points_skipped = self.buffer.skipped();
        tracing::debug!(stats = ?self.stats, "writer task stopped");
        self.stats
    }

    /// Deliver a fresh batch, or queue it behind batches already waiting.
    async fn submit(&mut self, lines: Vec<String>) {
        if !self.backlog.is_empty() {
            self.enqueue(PendingBatch {
                lines,
                attempts: 0,
                next_attempt: Instant::now(),
            });
            return;
        }

        let attempt = PendingBatch {
            lines,
            attempts: 0,
            next_attempt: Instant::now(),
        };
        if let Some(failed) = self.attempt(attempt).await {
            self.enqueue(failed);
        }
    }

    /// Try the batches whose backoff expired, oldest first.
    async fn retry_due(&mut self) {
        while let Some(front) = self.backlog.front() {
            if front.next_attempt > Instant::now() {
                break;
            }
            let Some(batch) = self.dequeue() else { break };
            if let Some(failed) = self.attempt(batch).await {
                // backend still unhealthy, keep order and wait for the next tick
                self.backlog_lines += failed.lines.len();
                self.backlog.push_front(failed);
                break;
            }
        }
    }

    /// Last chance for queued batches on shutdown, backoff ignored.
    async fn retry_remaining(&mut self) {
        while let Some(batch) = self.dequeue() {
            if let Some(failed) = self.attempt(batch).await {
                self.drop_batch(&failed.lines, "writer stopping");
            }
        }
    }

    /// One delivery attempt. Returns the batch when it should be retried.
    async fn attempt(&mut self, mut batch: PendingBatch) -> Option<PendingBatch> {
        let count = batch.lines.len();
        match self.transport.send(batch.lines.join("\n")).await {
            Ok(()) => {
                self.stats.lines_written += count as u64;
                tracing::debug!(lines = count, "batch written");
                None
            }
            Err(e) => {
                self.stats.failed_attempts += 1;
                batch.attempts += 1;
                if !e.is_retryable() {
                    tracing::error!("InfluxDB write failed: {}", e);
                    self.drop_batch(&batch.lines, "not retryable");
                    return None;
                }
                if batch.attempts >= self.options.max_retries {
                    tracing::error!(
                        attempts = batch.attempts,
                        "InfluxDB write failed: {}",
                        e
                    );
                    self.drop_batch(&batch.lines, "retries exhausted");
                    return None;
                }
                let delay = self.options.backoff(batch.attempts);
                tracing::warn!(
                    attempts = batch.attempts,
                    retry_in = ?delay,
                    "InfluxDB write failed: {}",
                    e
                );
                batch.next_attempt = Instant::now() + delay;
                Some(batch)
            }
        }
    }

    fn enqueue(&mut self, batch: PendingBatch) {
        self.backlog_lines += batch.lines.len();
        self.backlog.push_back(batch);

        while self.backlog_lines > self.options.retry_buffer_limit && self.backlog.len() > 1 {
            if let Some(oldest) = self.dequeue() {
                self.drop_batch(&oldest.lines, "retry buffer full");
            }
        }
    }

    fn dequeue(&mut self) -> Option<PendingBatch> {
        let batch = self.backlog.pop_front()?;
        self.backlog_lines -= batch.lines.len();
        Some(batch)
    }

    fn drop_batch(&mut self, lines: &[String], reason: &str) {
        self.stats.lines_dropped += lines.len() as u64;
        tracing::warn!(lines = lines.len(), reason, "dropping batch");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::{FieldValue, Fields, Tags};
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingTransport {
        bodies: Arc<Mutex<Vec<String>>>,
        failures_left: Arc<AtomicU32>,
        failure_status: u16,
    }

    impl RecordingTransport {
        fn failing(times: u32, status: u16) -> Self {
            Self {
                failures_left: Arc::new(AtomicU32::new(times)),
                failure_status: status,
                ..Self::default()
            }
        }

        fn bodies(&self) -> Vec<String> {
            self.bodies.lock().expect("lock").clone()
        }
    }

    impl BatchTransport for RecordingTransport {
        async fn send(&self, body: String) -> Result<(), WriteError> {
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(WriteError::Status {
                    status: self.failure_status,
                    body: "unavailable".to_string(),
                });
            }
            self.bodies.lock().expect("lock").push(body);
            Ok(())
        }
    }

    fn point(value: f64) -> Point {
        let mut tags = Tags::new();
        tags.insert("id".to_string(), "1".to_string());
        let mut fields = Fields::new();
        fields.insert("temperature".to_string(), FieldValue::Float(value));
        Point::new(
            "deflux_temperature",
            tags,
            fields,
            Utc.timestamp_opt(10, 0).single().expect("ts"),
        )
        .expect("point")
    }

    fn options(batch_size: usize) -> WriterOptions {
        WriterOptions {
            batch_size,
            flush_interval: Duration::from_secs(3600),
            retry_interval: Duration::from_millis(1),
            ..WriterOptions::default()
        }
    }

    #[tokio::test]
    async fn test_full_batch_is_written() {
        let transport = RecordingTransport::default();
        let (api, handle) = WriteApi::spawn(options(2), transport.clone());

        api.write_point(point(20.5));
        api.write_point(point(21.0));
        drop(api);

        let stats = handle.join().await;
        assert_eq!(stats.points_received, 2);
        assert_eq!(stats.lines_written, 2);
        assert_eq!(
            transport.bodies(),
            vec![
                "deflux_temperature,id=1 temperature=20.5 10000000000\n\
                 deflux_temperature,id=1 temperature=21 10000000000"
                    .to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_partial_batch_flushed_on_close() {
        let transport = RecordingTransport::default();
        let (api, handle) = WriteApi::spawn(options(20), transport.clone());

        api.write_point(point(1.0));
        drop(api);

        let stats = handle.join().await;
        assert_eq!(stats.lines_written, 1);
        assert_eq!(transport.bodies().len(), 1);
    }

    #[tokio::test]
    async fn test_retryable_failure_is_retried() {
        let transport = RecordingTransport::failing(1, 503);
        let (api, handle) = WriteApi::spawn(options(1), transport.clone());

        api.write_point(point(1.0));
        drop(api);

        let stats = handle.join().await;
        assert_eq!(stats.failed_attempts, 1);
        assert_eq!(stats.lines_written, 1);
        assert_eq!(stats.lines_dropped, 0);
        assert_eq!(transport.bodies().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_batch_is_dropped() {
        let transport = RecordingTransport::failing(1, 400);
        let (api, handle) = WriteApi::spawn(options(1), transport.clone());

        api.write_point(point(1.0));
        drop(api);

        let stats = handle.join().await;
        assert_eq!(stats.failed_attempts, 1);
        assert_eq!(stats.lines_written, 0);
        assert_eq!(stats.lines_dropped, 1);
        assert!(transport.bodies().is_empty());
    }

    #[tokio::test]
    async fn test_write_never_blocks_while_backend_down() {
        let transport = RecordingTransport::failing(u32::MAX, 503);
        let (api, handle) = WriteApi::spawn(
            WriterOptions {
                max_retries: 1,
                ..options(1)
            },
            transport,
        );

        for i in 0..1000 {
            api.write_point(point(i as f64));
        }
        drop(api);

        let stats = handle.join().await;
        assert_eq!(stats.points_received, 1000);
        assert_eq!(stats.lines_written, 0);
        assert_eq!(stats.lines_dropped, 1000);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let opts = WriterOptions::default();
        assert_eq!(opts.backoff(1), Duration::from_secs(5));
        assert_eq!(opts.backoff(2), Duration::from_secs(10));
        assert_eq!(opts.backoff(3), Duration::from_secs(20));
        assert_eq!(opts.backoff(10), Duration::from_secs(125));
    }

    #[tokio::test]
    async fn test_retry_buffer_drops_oldest() {
        let transport = RecordingTransport::failing(u32::MAX, 503);
        let mut task = WriterTask::new(
            WriterOptions {
                retry_buffer_limit: 2,
                ..options(1)
            },
            transport,
            mpsc::unbounded_channel().1,
        );

        for i in 0..3 {
            task.enqueue(PendingBatch {
                lines: vec![format!("line{}", i)],
                attempts: 1,
                next_attempt: Instant::now(),
            });
        }

        assert_eq!(task.backlog.len(), 2);
        assert_eq!(task.backlog_lines, 2);
        assert_eq!(task.stats.lines_dropped, 1);
        assert_eq!(task.backlog[0].lines, vec!["line1".to_string()]);
    }
}
