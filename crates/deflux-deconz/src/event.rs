// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Websocket messages pushed by the gateway.
//!
//! ```json
//! {"t":"event","e":"changed","r":"sensors","id":"5","state":{"temperature":2150}}
//! ```

use serde::Deserialize;
use serde_json::Value;

/// One websocket notification.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Event {
    /// Message type, always `event` today.
    #[serde(rename = "t")]
    pub message_type: String,
    /// Event kind: `changed`, `added`, `deleted`, `scene-called`.
    #[serde(rename = "e")]
    pub event: Option<String>,
    /// Resource collection: `sensors`, `lights`, `groups`, `scenes`.
    #[serde(rename = "r")]
    pub resource: Option<String>,
    pub id: Option<String>,
    pub uniqueid: Option<String>,
    pub state: Option<Value>,
    pub config: Option<Value>,
}

impl Event {
    /// Sensor id and new state when this is a sensor state change.
    ///
    /// Config-only changes (battery, reachability) and other resources
    /// yield `None`.
    pub fn sensor_state(&self) -> Option<(&str, &Value)> {
        if self.message_type != "event"
            || self.resource.as_deref() != Some("sensors")
            || self.event.as_deref() != Some("changed")
        {
            return None;
        }
        let id = self.id.as_deref()?;
        match &self.state {
            Some(state) if state.is_object() => Some((id, state)),
            _ => None,
        }
    }
}
