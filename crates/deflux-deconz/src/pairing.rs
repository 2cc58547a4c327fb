// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Obtain an API key from a gateway.
//!
//! The gateway only hands out keys for 60 seconds after "Authenticate app"
//! is pressed in the Phoscon UI; otherwise it answers with error 101.

use crate::error::{DeconzError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Device type announced when pairing.
pub const DEVICE_TYPE: &str = "deflux";

#[derive(Debug, Serialize)]
struct PairRequest<'a> {
    devicetype: &'a str,
}

#[derive(Debug, Deserialize)]
struct PairResponse {
    success: Option<PairSuccess>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct PairSuccess {
    username: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    code: i64,
    description: String,
}

/// `POST <addr>` and return the API key granted by the gateway.
pub async fn pair(client: &Client, addr: &str) -> Result<String> {
    let response = client
        .post(addr)
        .json(&PairRequest {
            devicetype: DEVICE_TYPE,
        })
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;

    // error entries come with a 403, so the body is inspected first
    match parse_pair_response(&body) {
        Ok(key) => Ok(key),
        Err(DeconzError::Json(_)) if !status.is_success() => Err(DeconzError::Status {
            status: status.as_u16(),
            body,
        }),
        Err(e) => Err(e),
    }
}

fn parse_pair_response(body: &str) -> Result<String> {
    let entries: Vec<PairResponse> = serde_json::from_str(body)?;

    for entry in &entries {
        if let Some(error) = &entry.error {
            return Err(DeconzError::Pairing {
                code: error.code,
                description: error.description.clone(),
            });
        }
    }

    entries
        .into_iter()
        .find_map(|entry| entry.success.map(|s| s.username))
        .ok_or_else(|| DeconzError::Pairing {
            code: 0,
            description: "gateway returned no API key".to_string(),
        })
}
