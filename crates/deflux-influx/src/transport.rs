// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Batch delivery to the InfluxDB v2 write endpoint.

use crate::config::InfluxConfig;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Url};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while delivering a batch.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("invalid InfluxDB URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("InfluxDB rejected batch: {status} - {body}")]
    Status { status: u16, body: String },
}

impl WriteError {
    /// Whether a later attempt with the same batch may succeed.
    ///
    /// Transport failures, throttling (429) and server errors are retried;
    /// other rejections (bad token, malformed line) never will be.
    pub fn is_retryable(&self) -> bool {
        match self {
            WriteError::InvalidUrl { .. } => false,
            WriteError::Http(_) => true,
            WriteError::Status { status, .. } => *status == 429 || *status >= 500,
        }
    }
}

/// Something that can deliver a batch of Line Protocol lines.
pub trait BatchTransport: Send + Sync + 'static {
    /// Deliver one batch (newline-separated lines).
    fn send(&self, body: String) -> impl Future<Output = Result<(), WriteError>> + Send;
}

/// HTTP transport posting to `<url>/api/v2/write`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
    auth: String,
}

impl HttpTransport {
    /// Build the transport for the configured server, org and bucket.
    pub fn new(config: &InfluxConfig) -> Result<Self, WriteError> {
        let endpoint = write_endpoint(config)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            auth: format!("Token {}", config.token),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl BatchTransport for HttpTransport {
    async fn send(&self, body: String) -> Result<(), WriteError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, &self.auth)
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(WriteError::Status { status, body });
        }

        Ok(())
    }
}

/// `<url>/api/v2/write?org=..&bucket=..&precision=ns`
fn write_endpoint(config: &InfluxConfig) -> Result<Url, WriteError> {
    let base = format!("{}/api/v2/write", config.url.trim_end_matches('/'));
    let mut url = Url::parse(&base).map_err(|e| WriteError::InvalidUrl {
        url: config.url.clone(),
        reason: e.to_string(),
    })?;

    url.query_pairs_mut()
        .append_pair("org", &config.org)
        .append_pair("bucket", &config.bucket)
        .append_pair("precision", "ns");

    Ok(url)
}
