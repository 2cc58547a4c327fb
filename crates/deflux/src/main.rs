// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! deflux CLI
//!
//! Forwards deCONZ sensor events to InfluxDB v2.
//!
//! # Usage
//!
//! ```bash
//! # Run the bridge with ./deflux.yml or /etc/deflux.yml
//! deflux
//!
//! # First run: no configuration yet, a default one is printed
//! deflux > /etc/deflux.yml
//!
//! # More verbose logs
//! deflux --log-level debug
//! ```

use anyhow::{anyhow, Context};
use clap::Parser;
use deflux::{
    generate_default_configuration, open_event_stream, resolve_configuration, ConfigError,
    ConfigSearch, Configuration, DeconzProvisioner, Forwarder, SYSTEM_CONFIG_PATH,
};
use deflux_influx::WriteApi;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// How long pending points may take to reach InfluxDB after Ctrl+C.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// deCONZ to InfluxDB v2 bridge
#[derive(Parser, Debug)]
#[command(name = "deflux")]
#[command(about = "deflux - Forward deCONZ sensor events to InfluxDB v2")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout is reserved for the generated configuration
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match resolve_configuration(&ConfigSearch::standard()) {
        Ok((config, _path)) => config,
        Err(ConfigError::NotFound { local, system }) => {
            tracing::warn!("no configuration could be found:");
            tracing::warn!("{}", local);
            tracing::warn!("{}", system);
            return output_default_configuration().await;
        }
        Err(e) => return Err(e.into()),
    };

    run(config).await
}

async fn output_default_configuration() -> anyhow::Result<()> {
    let provisioner = DeconzProvisioner::new().context("unable to create HTTP client")?;
    let config = generate_default_configuration(&provisioner).await;
    let yaml = config
        .to_yaml()
        .context("unable to render default configuration")?;

    tracing::info!("outputting default configuration, save this to {}", SYSTEM_CONFIG_PATH);
    print!("{}", yaml);
    Ok(())
}

async fn run(config: Configuration) -> anyhow::Result<()> {
    let stream = open_event_stream(&config.deconz)
        .await
        .context("unable to connect to deCONZ")?;
    let (api, writer) =
        WriteApi::http(&config.influxdb2).context("unable to start InfluxDB writer")?;
    let (events, reader) = stream.into_parts();

    let mut forwarder = Forwarder::new(api);
    let stream_closed = tokio::select! {
        result = forwarder.run(events) => match result {
            Ok(never) => match never {},
            Err(e) => Some(e),
        },
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                tracing::error!("unable to listen for Ctrl+C: {}", e);
            }
            tracing::info!("shutting down");
            None
        }
    };

    let stats = forwarder.stats().clone();
    tracing::info!(
        forwarded = stats.forwarded,
        dropped = stats.dropped,
        "forwarding stopped"
    );

    // the writer task drains once its last handle is gone
    drop(forwarder);
    match tokio::time::timeout(SHUTDOWN_GRACE, writer.join()).await {
        Ok(written) => tracing::info!(
            lines_written = written.lines_written,
            lines_dropped = written.lines_dropped,
            "InfluxDB writer stopped"
        ),
        Err(_) => tracing::warn!("InfluxDB writer did not finish within {:?}", SHUTDOWN_GRACE),
    }

    let Some(closed) = stream_closed else {
        reader.abort();
        return Ok(());
    };

    let cause = match reader.await {
        Ok(Err(e)) => e.to_string(),
        Ok(Ok(())) => "reader stopped".to_string(),
        Err(e) => e.to_string(),
    };
    Err(anyhow!("{}: {}", closed, cause))
}
