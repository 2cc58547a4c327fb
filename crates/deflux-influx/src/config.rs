// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! InfluxDB v2 connection and batching settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of points per flushed batch.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Default flush interval (milliseconds).
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 1000;

/// Default number of attempts for a failed batch before it is dropped.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// InfluxDB v2 connection configuration.
///
/// Serialized with the key names used in `deflux.yml`
/// (`URL`, `Org`, `Token`, `Bucket`, `BatchSize`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfluxConfig {
    /// InfluxDB URL (e.g., "http://localhost:8086/").
    #[serde(rename = "URL", alias = "url")]
    pub url: String,
    /// InfluxDB organization.
    #[serde(rename = "Org", alias = "org")]
    pub org: String,
    /// Authentication token.
    #[serde(rename = "Token", alias = "token")]
    pub token: String,
    /// InfluxDB bucket.
    #[serde(rename = "Bucket", alias = "bucket")]
    pub bucket: String,
    /// Number of points to batch before flush.
    #[serde(
        rename = "BatchSize",
        alias = "batchsize",
        default = "default_batch_size"
    )]
    pub batch_size: usize,
    /// Flush interval in milliseconds. None = default (1000).
    #[serde(
        rename = "FlushIntervalMs",
        alias = "flushintervalms",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub flush_interval_ms: Option<u64>,
    /// Attempts per failed batch. None = default (5).
    #[serde(
        rename = "MaxRetries",
        alias = "maxretries",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub max_retries: Option<u32>,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl InfluxConfig {
    /// Batch size, never below one.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }

    /// Time-based flush cadence.
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms.unwrap_or(DEFAULT_FLUSH_INTERVAL_MS))
    }

    pub fn effective_max_retries(&self) -> u32 {
        self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES)
    }
}

impl Default for InfluxConfig {
    /// Placeholder settings emitted when no configuration exists.
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8086/".to_string(),
            org: "change me".to_string(),
            token: "change me".to_string(),
            bucket: "change me".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval_ms: None,
            max_retries: None,
        }
    }
}
