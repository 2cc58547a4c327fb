// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Configuration lookup and default configuration generation.

use deflux::{
    default_configuration, generate_default_configuration, resolve_configuration, resolve_with,
    ConfigError, ConfigSearch, Configuration, Provisioner, CONFIG_FILE_NAME,
};
use deflux_deconz::{DeconzError, DiscoveredGateway};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const VALID_CONFIG: &str = "\
Deconz:
  Addr: http://192.168.1.20:80/api
  APIKey: 0A1B2C3D4E
Influxdb2:
  URL: http://influx.local:8086/
  Org: home
  Token: s3cr3t
  Bucket: sensors
  BatchSize: 20
";

#[test]
fn test_config_in_working_directory_skips_system_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let local = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&local, VALID_CONFIG).expect("write config");

    let search = ConfigSearch {
        local: local.clone(),
        system: PathBuf::from("/etc/deflux.yml"),
    };

    let mut consulted = Vec::new();
    let (config, path) = resolve_with(&search, |p: &Path| {
        consulted.push(p.to_path_buf());
        std::fs::read_to_string(p)
    })
    .expect("resolve");

    assert_eq!(path, local);
    assert_eq!(consulted, vec![local]);
    assert_eq!(config.deconz.api_key, "0A1B2C3D4E");
    assert_eq!(config.influxdb2.bucket, "sensors");
}

#[test]
fn test_system_path_used_when_local_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let system = dir.path().join("etc-deflux.yml");
    std::fs::write(&system, VALID_CONFIG).expect("write config");

    let search = ConfigSearch {
        local: dir.path().join(CONFIG_FILE_NAME),
        system: system.clone(),
    };
    let (_, path) = resolve_configuration(&search).expect("resolve");
    assert_eq!(path, system);
}

#[test]
fn test_both_locations_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let search = ConfigSearch {
        local: dir.path().join(CONFIG_FILE_NAME),
        system: dir.path().join("system.yml"),
    };

    let err = resolve_configuration(&search).unwrap_err();
    let ConfigError::NotFound { local, system } = &err else {
        panic!("expected NotFound, got: {}", err);
    };
    assert!(local.contains(CONFIG_FILE_NAME));
    assert!(system.contains("system.yml"));
}

#[derive(Default)]
struct FakeProvisioner {
    gateways: Option<Vec<DiscoveredGateway>>,
    api_key: Option<String>,
    paired: Mutex<Vec<String>>,
}

impl FakeProvisioner {
    fn pair_calls(&self) -> Vec<String> {
        self.paired.lock().expect("lock").clone()
    }
}

impl Provisioner for FakeProvisioner {
    async fn discover(&self) -> Result<Vec<DiscoveredGateway>, DeconzError> {
        self.gateways.clone().ok_or_else(|| DeconzError::Status {
            status: 500,
            body: "discovery down".to_string(),
        })
    }

    async fn pair(&self, addr: &str) -> Result<String, DeconzError> {
        self.paired.lock().expect("lock").push(addr.to_string());
        self.api_key.clone().ok_or_else(|| DeconzError::Pairing {
            code: 101,
            description: "link button not pressed".to_string(),
        })
    }
}

fn gateway(ip: &str, port: u16) -> DiscoveredGateway {
    DiscoveredGateway {
        id: format!("00212EFFFF{}", port),
        name: Some("Phoscon-GW".to_string()),
        mac_address: None,
        internal_ip_address: ip.to_string(),
        internal_port: port,
    }
}

#[tokio::test]
async fn test_no_gateway_keeps_placeholders_without_pairing() {
    let provisioner = FakeProvisioner {
        gateways: Some(Vec::new()),
        api_key: Some("UNUSED".to_string()),
        ..FakeProvisioner::default()
    };

    let config = generate_default_configuration(&provisioner).await;

    assert_eq!(config.deconz.addr, "http://127.0.0.1:8080/");
    assert_eq!(config.deconz.api_key, "change me");
    assert!(provisioner.pair_calls().is_empty());
}

#[tokio::test]
async fn test_discovery_error_keeps_placeholders_without_pairing() {
    let provisioner = FakeProvisioner::default();

    let config = generate_default_configuration(&provisioner).await;

    assert_eq!(config, default_configuration());
    assert!(provisioner.pair_calls().is_empty());
}

#[tokio::test]
async fn test_first_gateway_is_paired() {
    let provisioner = FakeProvisioner {
        gateways: Some(vec![
            gateway("192.168.1.20", 80),
            gateway("192.168.1.30", 8080),
            gateway("192.168.1.40", 8080),
        ]),
        api_key: Some("83B7780291".to_string()),
        ..FakeProvisioner::default()
    };

    let config = generate_default_configuration(&provisioner).await;

    assert_eq!(config.deconz.addr, "http://192.168.1.20:80/api");
    assert_eq!(config.deconz.api_key, "83B7780291");
    assert_eq!(provisioner.pair_calls(), vec!["http://192.168.1.20:80/api".to_string()]);
    assert_eq!(config.influxdb2, default_configuration().influxdb2);
}

#[tokio::test]
async fn test_pairing_failure_keeps_key_placeholder() {
    let provisioner = FakeProvisioner {
        gateways: Some(vec![gateway("10.0.0.2", 80)]),
        ..FakeProvisioner::default()
    };

    let config = generate_default_configuration(&provisioner).await;

    assert_eq!(config.deconz.addr, "http://10.0.0.2:80/api");
    assert_eq!(config.deconz.api_key, "change me");
    assert_eq!(provisioner.pair_calls().len(), 1);
}

#[tokio::test]
async fn test_generated_configuration_is_loadable() {
    let provisioner = FakeProvisioner {
        gateways: Some(vec![gateway("10.0.0.2", 80)]),
        api_key: Some("ABCDEF".to_string()),
        ..FakeProvisioner::default()
    };
    let generated = generate_default_configuration(&provisioner).await;
    let yaml = generated.to_yaml().expect("render");

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, &yaml).expect("write config");

    let loaded = Configuration::from_file(&path).expect("load");
    assert_eq!(loaded, generated);
}
