// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Gateway connection settings.

use serde::{Deserialize, Serialize};

/// Gateway address used when nothing better is known.
pub const DEFAULT_ADDR: &str = "http://127.0.0.1:8080/";

/// API key placeholder written into generated configurations.
pub const PLACEHOLDER_API_KEY: &str = "change me";

/// deCONZ connection configuration (`Deconz` section of `deflux.yml`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeconzConfig {
    /// REST API base address, e.g. `http://192.168.1.20:80/api`.
    #[serde(rename = "Addr", alias = "addr")]
    pub addr: String,
    /// API key obtained by pairing.
    #[serde(rename = "APIKey", alias = "apikey")]
    pub api_key: String,
}

impl Default for DeconzConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            api_key: PLACEHOLDER_API_KEY.to_string(),
        }
    }
}
