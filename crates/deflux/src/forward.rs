// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Forwarding loop: sensor events in, InfluxDB points out.

use crate::normalize::to_point;
use chrono::Utc;
use deflux_deconz::SensorEvent;
use deflux_influx::{Point, PointWriter};
use std::convert::Infallible;
use thiserror::Error;
use tokio::sync::mpsc;

/// Prefix of every measurement name (`deflux_<kind>`).
pub const MEASUREMENT_PREFIX: &str = "deflux";

/// Why the forwarding loop stopped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ForwardError {
    #[error("sensor event stream closed")]
    StreamClosed,
}

/// Forwarding counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardStats {
    /// Events taken from the stream.
    pub received: u64,
    /// Points handed to the writer.
    pub forwarded: u64,
    /// Events that could not be normalized.
    pub dropped: u64,
}

/// Measurement name for a sensor kind.
pub fn measurement(kind: &str) -> String {
    format!("{}_{}", MEASUREMENT_PREFIX, kind)
}

/// Consumes sensor events and writes one point per recognized event.
pub struct Forwarder<W> {
    writer: W,
    stats: ForwardStats,
}

impl<W: PointWriter> Forwarder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            stats: ForwardStats::default(),
        }
    }

    pub fn stats(&self) -> &ForwardStats {
        &self.stats
    }

    /// Stop forwarding and hand back the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Normalize one event and submit it.
    ///
    /// Events that cannot be normalized are logged and dropped; nothing is
    /// written for them.
    pub fn handle(&mut self, event: SensorEvent) {
        self.stats.received += 1;

        let (tags, fields) = match to_point(&event) {
            Ok(tags_and_fields) => tags_and_fields,
            Err(e) => {
                self.stats.dropped += 1;
                tracing::warn!(sensor = %event.id, "not adding event to influx batch: {}", e);
                return;
            }
        };

        // processing time, the gateway's lastupdated is ignored
        match Point::new(measurement(&event.kind), tags, fields, Utc::now()) {
            Ok(point) => {
                tracing::trace!(
                    measurement = point.measurement(),
                    sensor = %event.id,
                    "point forwarded"
                );
                self.writer.write_point(point);
                self.stats.forwarded += 1;
            }
            Err(e) => {
                self.stats.dropped += 1;
                tracing::warn!(sensor = %event.id, "not adding event to influx batch: {}", e);
            }
        }
    }

    /// Forward events until the stream closes.
    ///
    /// Each event is fully handled before the next one is received, so a
    /// bounded `events` channel holds the producer back while we work.
    pub async fn run(
        &mut self,
        mut events: mpsc::Receiver<SensorEvent>,
    ) -> Result<Infallible, ForwardError> {
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
        tracing::debug!(stats = ?self.stats, "sensor event stream ended");
        Err(ForwardError::StreamClosed)
    }
}
