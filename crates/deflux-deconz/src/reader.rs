// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Websocket event readers.
//!
//! `EventReader` yields raw gateway notifications. `SensorEventReader`
//! filters them down to sensor state changes and resolves the sensor
//! behind each one.

use crate::api::Api;
use crate::error::{DeconzError, Result};
use crate::event::Event;
use crate::sensor::{Sensor, SensorEvent, Sensors};
use futures::StreamExt;
use reqwest::Url;
use std::collections::HashSet;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// Raw websocket notification reader.
pub struct EventReader {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    url: Url,
}

impl EventReader {
    /// Open the websocket connection.
    pub async fn dial(url: &Url) -> Result<Self> {
        let (stream, _response) = connect_async(url.as_str()).await?;
        tracing::debug!(url = %url, "websocket connected");
        Ok(Self {
            stream,
            url: url.clone(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Next notification from the gateway.
    ///
    /// Malformed frames are skipped. A close frame or the end of the stream
    /// is reported as [`DeconzError::StreamClosed`].
    pub async fn next_event(&mut self) -> Result<Event> {
        while let Some(message) = self.stream.next().await {
            match message? {
                Message::Text(text) => match serde_json::from_str::<Event>(&text) {
                    Ok(event) => return Ok(event),
                    Err(e) => tracing::warn!("ignoring malformed gateway message: {}", e),
                },
                Message::Close(frame) => {
                    let reason = frame
                        .map(|f| format!("{} {}", f.code, f.reason))
                        .unwrap_or_else(|| "close frame".to_string());
                    return Err(DeconzError::StreamClosed(reason));
                }
                // pings are answered by tungstenite itself
                _ => {}
            }
        }
        Err(DeconzError::StreamClosed("connection ended".to_string()))
    }
}

/// Turns gateway notifications into [`SensorEvent`]s.
pub struct SensorEventReader {
    reader: EventReader,
    api: Option<Api>,
    sensors: Sensors,
    /// Ids still missing after a refresh.
    unknown: HashSet<String>,
}

impl SensorEventReader {
    /// `api` is used to refresh the sensor list when an unknown sensor
    /// reports; without it unknown sensors are skipped.
    pub fn new(reader: EventReader, api: Option<Api>, sensors: Sensors) -> Self {
        Self {
            reader,
            api,
            sensors,
            unknown: HashSet::new(),
        }
    }

    /// Forward sensor events into `tx` until the stream fails.
    ///
    /// `send` waits for the consumer, so a slow consumer pauses reading
    /// from the gateway. Returns `Ok(())` only when the consumer went away.
    pub async fn run(mut self, tx: mpsc::Sender<SensorEvent>) -> Result<()> {
        tracing::debug!(
            url = %self.reader.url(),
            sensors = self.sensors.len(),
            "sensor event reader started"
        );

        loop {
            let event = self.reader.next_event().await?;
            let Some((id, state)) = event.sensor_state() else {
                continue;
            };

            let Some(sensor) = self.lookup(id).await else {
                tracing::warn!(id, "event for unknown sensor skipped");
                continue;
            };

            if tx.send(SensorEvent::new(&sensor, state.clone())).await.is_err() {
                tracing::debug!("sensor event consumer dropped, reader stopping");
                return Ok(());
            }
        }
    }

    /// Find a sensor, refreshing the list once per unknown id.
    async fn lookup(&mut self, id: &str) -> Option<Sensor> {
        if let Some(sensor) = self.sensors.get(id) {
            return Some(sensor.clone());
        }
        if self.unknown.contains(id) {
            return None;
        }

        let api = self.api.as_ref()?;
        match api.sensors().await {
            Ok(sensors) => {
                tracing::info!(count = sensors.len(), "sensor list refreshed");
                self.sensors = sensors;
                self.unknown.retain(|known| !self.sensors.contains_key(known));
            }
            Err(e) => tracing::warn!("unable to refresh sensor list: {}", e),
        }

        let found = self.sensors.get(id).cloned();
        if found.is_none() {
            self.unknown.insert(id.to_string());
        }
        found
    }
}
