// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! deflux InfluxDB writer
//!
//! Batched, non-blocking delivery of time-series points to InfluxDB v2.
//!
//! This crate provides:
//! - A `Point` model (measurement, tags, fields, timestamp)
//! - InfluxDB v2 Line Protocol encoding
//! - Batching with size and time-based flushing
//! - A background writer task with retry backlog
//!
//! # Overview
//!
//! ```text
//! Point --> WriteApi --> writer task --> BatchBuffer --> HttpTransport --> /api/v2/write
//! ```

pub mod buffer;
pub mod config;
pub mod point;
pub mod transport;
pub mod writer;

pub use config::InfluxConfig;
pub use point::{FieldValue, Fields, Point, PointError, Tags};
pub use transport::{BatchTransport, HttpTransport, WriteError};
pub use writer::{PointWriter, WriteApi, WriterHandle, WriterOptions, WriterStats};
