use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use nukible_api::models::DeviceType;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::configs::AddonOptions;
use crate::errors::ConfigError;

pub const CONF_FILE_NAME: &str = "nukible.toml";

/// Add-on installs mount a persistent volume here; bare installs fall back
/// to the working directory.
const DATA_DIR: &str = "/data";

pub const DEFAULT_RETRY: u32 = 5;
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub app_id: u32,
    pub token: String,
}

/// Pins first-run pairing to one address when several devices are in range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pairing {
    pub address: String,
}

/// Persisted record of one device, written at pairing time. Identity fields
/// stay `None` until the handshake completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nuki_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<DeviceType>,
    pub bridge_public_key: String,
    pub bridge_private_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nuki_public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_timeout: Option<u64>,
}

/// Resolved per-device timing, handed to the wireless driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceTiming {
    pub retry: u32,
    pub connection_timeout: Duration,
    pub command_timeout: Duration,
}

impl DeviceConfig {
    /// Fresh record for a device about to be paired, seeded with the stock
    /// timing values so they end up spelled out in the config file.
    pub fn unpaired(
        address: impl Into<String>,
        bridge_public_key: impl Into<String>,
        bridge_private_key: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            nuki_id: None,
            name: None,
            device_type: None,
            bridge_public_key: bridge_public_key.into(),
            bridge_private_key: bridge_private_key.into(),
            nuki_public_key: None,
            auth_id: None,
            retry: Some(DEFAULT_RETRY),
            connection_timeout: Some(DEFAULT_CONNECTION_TIMEOUT_SECS),
            command_timeout: Some(DEFAULT_COMMAND_TIMEOUT_SECS),
        }
    }

    pub fn is_paired(&self) -> bool {
        self.nuki_id.is_some()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.address)
    }

    pub fn timing(&self) -> DeviceTiming {
        DeviceTiming {
            retry: self.retry.unwrap_or(DEFAULT_RETRY),
            connection_timeout: Duration::from_secs(
                self.connection_timeout
                    .unwrap_or(DEFAULT_CONNECTION_TIMEOUT_SECS),
            ),
            command_timeout: Duration::from_secs(
                self.command_timeout.unwrap_or(DEFAULT_COMMAND_TIMEOUT_SECS),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub server: Server,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pairing: Option<Pairing>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub smartlock: Vec<DeviceConfig>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_or_init(&Self::config_dir())
    }

    pub fn config_dir() -> PathBuf {
        if Path::new(DATA_DIR).is_dir() {
            PathBuf::from(DATA_DIR)
        } else {
            PathBuf::from(".")
        }
    }

    /// Reads the config file when present, otherwise mints a fresh bridge
    /// identity in memory. Nothing is written to disk here; the file only
    /// appears once pairing has succeeded.
    pub fn load_or_init(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONF_FILE_NAME);
        let mut settings = if path.is_file() {
            let raw = fs::read_to_string(&path)?;
            toml::from_str::<Settings>(&raw)?
        } else {
            tracing::info!("no configuration found, generating a new bridge identity");
            Self::first_run()
        };
        let options = AddonOptions::load(dir)?;
        settings.apply_options(&options);
        Ok(settings)
    }

    pub fn persist(&self, dir: &Path) -> Result<(), ConfigError> {
        let rendered = toml::to_string_pretty(self)?;
        fs::write(dir.join(CONF_FILE_NAME), rendered)?;
        Ok(())
    }

    /// Add-on options fill in per-device timing a record leaves unset;
    /// values already in the file always win.
    pub fn apply_options(&mut self, options: &AddonOptions) {
        for device in &mut self.smartlock {
            device.retry = device.retry.or(options.retry);
            device.connection_timeout = device.connection_timeout.or(options.connection_timeout);
            device.command_timeout = device.command_timeout.or(options.command_timeout);
        }
    }

    fn first_run() -> Self {
        let mut rng = OsRng;
        let mut token = [0u8; 32];
        rng.fill_bytes(&mut token);
        let token = hex::encode(token);
        // Printed exactly once, at generation time, so the operator can
        // copy it into their clients.
        tracing::info!("generated bridge api token: {token}");
        Self {
            server: Server {
                host: "0.0.0.0".to_string(),
                port: 8080,
                name: "nukible".to_string(),
                app_id: rng.next_u32(),
                token,
            },
            pairing: None,
            smartlock: Vec::new(),
        }
    }
}
