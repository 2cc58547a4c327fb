// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Gateway client errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeconzError {
    #[error("invalid gateway address '{addr}': {reason}")]
    InvalidAddress { addr: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected gateway response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("event stream closed: {0}")]
    StreamClosed(String),

    #[error("pairing rejected (error {code}): {description}")]
    Pairing { code: i64, description: String },
}

pub type Result<T> = std::result::Result<T, DeconzError>;
