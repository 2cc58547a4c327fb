// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! deflux: deCONZ sensor events to InfluxDB v2
//!
//! Listens to a deCONZ gateway's websocket, turns every sensor state change
//! into a time-series point and writes the points to InfluxDB in batches.
//!
//! # Architecture
//!
//! ```text
//! deCONZ websocket --> SensorEventReader --(capacity 1)--> Forwarder --> WriteApi --> InfluxDB
//!                                                              |
//!                                                         normalize::to_point
//! ```
//!
//! - [`config`]: `deflux.yml` search and parsing
//! - [`bootstrap`]: default configuration through discovery and pairing
//! - [`source`]: gateway session and event stream
//! - [`normalize`]: sensor state to tags and fields
//! - [`forward`]: the forwarding loop

pub mod bootstrap;
pub mod config;
pub mod forward;
pub mod normalize;
pub mod source;

pub use bootstrap::{
    default_configuration, generate_default_configuration, DeconzProvisioner, Provisioner,
};
pub use config::{
    resolve_configuration, resolve_with, ConfigError, ConfigSearch, Configuration,
    CONFIG_FILE_NAME, SYSTEM_CONFIG_PATH,
};
pub use forward::{measurement, ForwardError, ForwardStats, Forwarder, MEASUREMENT_PREFIX};
pub use normalize::{normalizer_for, to_point, Normalizable, NormalizeError, TagsAndFields};
pub use source::{handoff, open_event_stream, ConnectionError, EventStream, HANDOFF_CAPACITY};

/// Sensor event as delivered by the gateway reader.
pub use deflux_deconz::SensorEvent as RawSensorEvent;
