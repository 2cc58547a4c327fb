// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Default configuration generation.
//!
//! When no configuration file exists, a starting point is generated: the
//! gateway address comes from discovery and the API key from pairing.
//! Anything that cannot be obtained keeps its placeholder.

use crate::config::Configuration;
use deflux_deconz::{DeconzError, DiscoveredGateway, DISCOVERY_URL};
use reqwest::Client;
use std::future::Future;
use std::time::Duration;

/// Timeout applied to discovery and pairing requests.
const PROVISIONING_TIMEOUT: Duration = Duration::from_secs(10);

/// Gateway discovery and pairing.
pub trait Provisioner {
    /// Gateways visible from this network. An empty list is not an error.
    fn discover(&self) -> impl Future<Output = Result<Vec<DiscoveredGateway>, DeconzError>> + Send;

    /// Request an API key from the gateway at `addr`.
    fn pair(&self, addr: &str) -> impl Future<Output = Result<String, DeconzError>> + Send;
}

/// [`Provisioner`] talking to the Phoscon discovery service and the
/// gateway's REST API.
#[derive(Debug, Clone)]
pub struct DeconzProvisioner {
    client: Client,
    discovery_url: String,
}

impl DeconzProvisioner {
    pub fn new() -> Result<Self, DeconzError> {
        let client = Client::builder().timeout(PROVISIONING_TIMEOUT).build()?;
        Ok(Self {
            client,
            discovery_url: DISCOVERY_URL.to_string(),
        })
    }

    /// Query another discovery endpoint.
    pub fn with_discovery_url(mut self, url: impl Into<String>) -> Self {
        self.discovery_url = url.into();
        self
    }
}

impl Provisioner for DeconzProvisioner {
    async fn discover(&self) -> Result<Vec<DiscoveredGateway>, DeconzError> {
        deflux_deconz::discover(&self.client, &self.discovery_url).await
    }

    async fn pair(&self, addr: &str) -> Result<String, DeconzError> {
        deflux_deconz::pair(&self.client, addr).await
    }
}

/// Configuration made of placeholders only.
pub fn default_configuration() -> Configuration {
    Configuration::default()
}

/// Build a default configuration, filling in what the provisioner finds.
///
/// Pairing is attempted only after discovery returned at least one
/// gateway; the first one is used. Failures are logged and leave the
/// matching placeholders in place.
pub async fn generate_default_configuration<P: Provisioner>(provisioner: &P) -> Configuration {
    let mut config = default_configuration();

    let gateways = match provisioner.discover().await {
        Ok(gateways) => gateways,
        Err(e) => {
            tracing::warn!("unable to discover deCONZ gateway: {}", e);
            tracing::warn!("please fill out the Deconz section manually");
            return config;
        }
    };

    let Some(gateway) = gateways.first() else {
        tracing::warn!("no deCONZ gateway found on this network");
        tracing::warn!("please fill out the Deconz section manually");
        return config;
    };
    if gateways.len() > 1 {
        tracing::info!(
            count = gateways.len(),
            "several deCONZ gateways found, using the first one"
        );
    }

    config.deconz.addr = gateway.api_url();
    tracing::info!(id = %gateway.id, "discovered deCONZ gateway at {}", config.deconz.addr);

    match provisioner.pair(&config.deconz.addr).await {
        Ok(api_key) => {
            tracing::info!("paired with deCONZ gateway");
            config.deconz.api_key = api_key;
        }
        Err(e) => {
            tracing::warn!("unable to pair with deCONZ gateway: {}", e);
            tracing::warn!(
                "unlock the gateway in Phoscon and run again, or fill out APIKey manually"
            );
        }
    }

    config
}
