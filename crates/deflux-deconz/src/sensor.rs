// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sensors known to the gateway and the events they emit.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Sensor resource as returned by `GET /api/<key>/sensors`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Sensor {
    /// Resource id. Filled from the map key, not part of the JSON object.
    #[serde(skip)]
    pub id: String,
    pub name: String,
    /// Gateway sensor type, e.g. `ZHATemperature`.
    #[serde(rename = "type")]
    pub sensor_type: String,
    #[serde(default)]
    pub uniqueid: Option<String>,
    #[serde(default, rename = "modelid")]
    pub model_id: Option<String>,
    #[serde(default, rename = "manufacturername")]
    pub manufacturer: Option<String>,
}

impl Sensor {
    /// Normalized type tag of this sensor, see [`sensor_kind`].
    pub fn kind(&self) -> String {
        sensor_kind(&self.sensor_type)
    }
}

/// Sensors by resource id.
pub type Sensors = HashMap<String, Sensor>;

/// Parse the body of `GET /api/<key>/sensors`.
pub fn parse_sensors(body: &str) -> serde_json::Result<Sensors> {
    let mut sensors: Sensors = serde_json::from_str(body)?;
    for (id, sensor) in sensors.iter_mut() {
        sensor.id = id.clone();
    }
    Ok(sensors)
}

/// Normalize a gateway sensor type into a short lowercase tag.
///
/// The Zigbee (`ZHA`) and virtual (`CLIP`) prefixes are dropped so both
/// flavours of a sensor share one tag: `ZHATemperature` and
/// `CLIPTemperature` both become `temperature`.
pub fn sensor_kind(sensor_type: &str) -> String {
    sensor_type
        .strip_prefix("ZHA")
        .or_else(|| sensor_type.strip_prefix("CLIP"))
        .unwrap_or(sensor_type)
        .to_ascii_lowercase()
}

/// One sensor state change, ready for normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorEvent {
    /// Gateway resource id.
    pub id: String,
    /// Human readable sensor name.
    pub name: String,
    /// Gateway sensor type (`ZHATemperature`).
    pub sensor_type: String,
    /// Normalized type tag (`temperature`).
    pub kind: String,
    /// State snapshot carried by the event.
    pub state: Value,
}

impl SensorEvent {
    pub fn new(sensor: &Sensor, state: Value) -> Self {
        Self {
            id: sensor.id.clone(),
            name: sensor.name.clone(),
            sensor_type: sensor.sensor_type.clone(),
            kind: sensor.kind(),
            state,
        }
    }
}
