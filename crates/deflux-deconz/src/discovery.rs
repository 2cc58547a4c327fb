// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Gateway discovery through the Phoscon discovery service.
//!
//! The service reports gateways that announced themselves from the same
//! public address as the caller.

use crate::error::{DeconzError, Result};
use reqwest::Client;
use serde::Deserialize;

/// Public discovery endpoint.
pub const DISCOVERY_URL: &str = "https://phoscon.de/discover";

/// A gateway reported by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiscoveredGateway {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "macaddress")]
    pub mac_address: Option<String>,
    #[serde(rename = "internalipaddress")]
    pub internal_ip_address: String,
    #[serde(rename = "internalport")]
    pub internal_port: u16,
}

impl DiscoveredGateway {
    /// REST API base address of this gateway.
    pub fn api_url(&self) -> String {
        format!(
            "http://{}:{}/api",
            self.internal_ip_address, self.internal_port
        )
    }
}

/// Query the discovery service. An empty list is a valid answer.
pub async fn discover(client: &Client, url: &str) -> Result<Vec<DiscoveredGateway>> {
    let response = client.get(url).send().await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(DeconzError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let gateways: Vec<DiscoveredGateway> = serde_json::from_str(&body)?;
    tracing::debug!(count = gateways.len(), "discovery answered");
    Ok(gateways)
}
