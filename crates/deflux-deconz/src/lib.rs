// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! deCONZ gateway client
//!
//! The parts of the deCONZ REST and websocket APIs needed to stream sensor
//! state changes:
//! - REST session (`Api`): sensor list, gateway config, websocket port
//! - Discovery through the Phoscon service
//! - Pairing to obtain an API key
//! - Websocket readers producing [`SensorEvent`]s
//!
//! ```text
//! Api --websocket_url--> EventReader --> SensorEventReader --> mpsc::Sender<SensorEvent>
//! ```

pub mod api;
pub mod config;
pub mod discovery;
pub mod error;
pub mod event;
pub mod pairing;
pub mod reader;
pub mod sensor;

pub use api::{Api, GatewayConfig};
pub use config::DeconzConfig;
pub use discovery::{discover, DiscoveredGateway, DISCOVERY_URL};
pub use error::DeconzError;
pub use event::Event;
pub use pairing::pair;
pub use reader::{EventReader, SensorEventReader};
pub use sensor::{sensor_kind, Sensor, SensorEvent, Sensors};
