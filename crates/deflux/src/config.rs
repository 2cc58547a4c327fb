// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `deflux.yml` loading and location.
//!
//! The configuration is searched in the working directory first, then in
//! `/etc`. The first file that can be read and parsed wins.

use deflux_deconz::DeconzConfig;
use deflux_influx::InfluxConfig;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "deflux.yml";

/// System-wide configuration path.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/deflux.yml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not parse configuration {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("no configuration could be found:\n{local}\n{system}")]
    NotFound { local: String, system: String },
}

/// Complete process configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Gateway connection.
    #[serde(rename = "Deconz", alias = "deconz")]
    pub deconz: DeconzConfig,
    /// Time-series backend.
    #[serde(rename = "Influxdb2", alias = "influxdb2")]
    pub influxdb2: InfluxConfig,
}

impl Configuration {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        load(path, &mut |p: &Path| std::fs::read_to_string(p))
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Ordered configuration locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSearch {
    /// Tried first.
    pub local: PathBuf,
    /// Tried when `local` fails.
    pub system: PathBuf,
}

impl ConfigSearch {
    /// `<cwd>/deflux.yml`, then `/etc/deflux.yml`.
    pub fn standard() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|e| {
            tracing::debug!("unable to get current working directory: {}", e);
            PathBuf::from(".")
        });
        Self {
            local: cwd.join(CONFIG_FILE_NAME),
            system: PathBuf::from(SYSTEM_CONFIG_PATH),
        }
    }
}

/// Locate and load the configuration from the filesystem.
pub fn resolve_configuration(
    search: &ConfigSearch,
) -> Result<(Configuration, PathBuf), ConfigError> {
    resolve_with(search, |path| std::fs::read_to_string(path))
}

/// Locate and load the configuration using `read` to fetch file contents.
///
/// `system` is only read when `local` cannot be read or parsed. When both
/// fail, [`ConfigError::NotFound`] carries both causes.
pub fn resolve_with<F>(
    search: &ConfigSearch,
    mut read: F,
) -> Result<(Configuration, PathBuf), ConfigError>
where
    F: FnMut(&Path) -> io::Result<String>,
{
    let local = match load(&search.local, &mut read) {
        Ok(config) => {
            tracing::info!("using configuration {}", search.local.display());
            return Ok((config, search.local.clone()));
        }
        Err(e) => e,
    };
    tracing::debug!("{}", local);

    let system = match load(&search.system, &mut read) {
        Ok(config) => {
            tracing::info!("using configuration {}", search.system.display());
            return Ok((config, search.system.clone()));
        }
        Err(e) => e,
    };

    Err(ConfigError::NotFound {
        local: local.to_string(),
        system: system.to_string(),
    })
}

fn load<F>(path: &Path, read: &mut F) -> Result<Configuration, ConfigError>
where
    F: FnMut(&Path) -> io::Result<String>,
{
    let content = read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Configuration::from_yaml(&content).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}
