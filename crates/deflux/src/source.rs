// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Gateway event source.
//!
//! Opens a REST session and the websocket stream, then runs the gateway
//! reader on its own task. Events reach the forwarding loop through a
//! channel of capacity one, so the reader waits while the consumer works.

use deflux_deconz::{Api, DeconzConfig, DeconzError, EventReader, SensorEvent, SensorEventReader};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Capacity of the reader to forwarder hand-off.
pub const HANDOFF_CAPACITY: usize = 1;

/// Event source setup failures.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("unable to open deCONZ session at {addr}: {source}")]
    Session {
        addr: String,
        #[source]
        source: DeconzError,
    },

    #[error("unable to open deCONZ event stream at {url}: {source}")]
    Stream {
        url: String,
        #[source]
        source: DeconzError,
    },
}

/// Bounded hand-off between the gateway reader and the forwarding loop.
pub fn handoff() -> (mpsc::Sender<SensorEvent>, mpsc::Receiver<SensorEvent>) {
    mpsc::channel(HANDOFF_CAPACITY)
}

/// A running gateway reader and the events it produces.
pub struct EventStream {
    events: mpsc::Receiver<SensorEvent>,
    reader: JoinHandle<Result<(), DeconzError>>,
}

impl EventStream {
    /// Events channel and the reader task, whose result explains why the
    /// channel closed.
    pub fn into_parts(self) -> (mpsc::Receiver<SensorEvent>, JoinHandle<Result<(), DeconzError>>) {
        (self.events, self.reader)
    }
}

/// Connect to the gateway and start streaming sensor events.
pub async fn open_event_stream(config: &DeconzConfig) -> Result<EventStream, ConnectionError> {
    let session = |source: DeconzError| ConnectionError::Session {
        addr: config.addr.clone(),
        source,
    };

    let api = Api::new(config).map_err(session)?;
    let sensors = api.sensors().await.map_err(session)?;
    let url = api.websocket_url().await.map_err(session)?;

    let reader = EventReader::dial(&url)
        .await
        .map_err(|source| ConnectionError::Stream {
            url: url.to_string(),
            source,
        })?;

    tracing::info!(sensors = sensors.len(), "connected to deCONZ at {}", api.addr());

    let (tx, events) = handoff();
    let reader = tokio::spawn(SensorEventReader::new(reader, Some(api), sensors).run(tx));

    Ok(EventStream { events, reader })
}
