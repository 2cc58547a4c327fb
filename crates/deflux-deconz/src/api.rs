// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! REST session against the gateway.

use crate::config::DeconzConfig;
use crate::error::{DeconzError, Result};
use crate::sensor::{parse_sensors, Sensors};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;

/// Subset of `GET /api/<key>/config` used by the client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "swversion")]
    pub sw_version: Option<String>,
    #[serde(rename = "websocketport")]
    pub websocket_port: u16,
}

/// Authenticated REST session.
#[derive(Debug, Clone)]
pub struct Api {
    client: Client,
    base: Url,
    api_key: String,
}

impl Api {
    pub fn new(config: &DeconzConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Self::with_client(client, config)
    }

    /// Build a session sharing an existing HTTP client.
    pub fn with_client(client: Client, config: &DeconzConfig) -> Result<Self> {
        let base = Url::parse(&config.addr).map_err(|e| DeconzError::InvalidAddress {
            addr: config.addr.clone(),
            reason: e.to_string(),
        })?;
        if base.host_str().is_none() {
            return Err(DeconzError::InvalidAddress {
                addr: config.addr.clone(),
                reason: "missing host".to_string(),
            });
        }

        Ok(Self {
            client,
            base,
            api_key: config.api_key.clone(),
        })
    }

    /// Configured gateway address.
    pub fn addr(&self) -> &Url {
        &self.base
    }

    /// `<addr>/<key>/<resource>`
    fn resource_url(&self, resource: &str) -> Result<Url> {
        let url = format!(
            "{}/{}/{}",
            self.base.as_str().trim_end_matches('/'),
            self.api_key,
            resource
        );
        Url::parse(&url).map_err(|e| DeconzError::InvalidAddress {
            addr: url,
            reason: e.to_string(),
        })
    }

    async fn get(&self, resource: &str) -> Result<String> {
        let url = self.resource_url(resource)?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(DeconzError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    /// All sensors known to the gateway.
    pub async fn sensors(&self) -> Result<Sensors> {
        let body = self.get("sensors").await?;
        let sensors = parse_sensors(&body)?;
        tracing::debug!(count = sensors.len(), "fetched sensor list");
        Ok(sensors)
    }

    pub async fn gateway_config(&self) -> Result<GatewayConfig> {
        let body = self.get("config").await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Websocket endpoint announced by the gateway.
    pub async fn websocket_url(&self) -> Result<Url> {
        let config = self.gateway_config().await?;
        self.websocket_url_for(config.websocket_port)
    }

    /// `ws://<gateway host>:<port>`
    fn websocket_url_for(&self, port: u16) -> Result<Url> {
        let host = self.base.host().ok_or_else(|| DeconzError::InvalidAddress {
            addr: self.base.to_string(),
            reason: "missing host".to_string(),
        })?;
        let url = format!("ws://{}:{}", host, port);
        Url::parse(&url).map_err(|e| DeconzError::InvalidAddress {
            addr: url,
            reason: e.to_string(),
        })
    }
}
