use async_trait::async_trait;
use nukible_api::models::{DeviceType, LockState, LogEntry};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::configs::DeviceConfig;

/// A single wireless advertisement as seen by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    pub address: String,
    pub local_name: Option<String>,
    pub rssi: Option<i16>,
    pub manufacturer_data: Vec<u8>,
}

/// Identity material a device hands back once a pairing handshake completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairedIdentity {
    pub nuki_id: u32,
    pub name: String,
    pub device_type: DeviceType,
    pub nuki_public_key: String,
    pub auth_id: String,
}

#[derive(Debug, Error)]
pub enum LinkError {
    /// The device answered and rejected the request with its own error code.
    #[error("device rejected the command with code {code}")]
    Protocol { code: String },
    #[error("device unreachable: {0}")]
    Unreachable(String),
    #[error("malformed advertisement payload")]
    BadAdvertisement,
}

#[derive(Debug, Error)]
pub enum ScanError {
    /// Adapter hiccup worth retrying after a short delay.
    #[error("transient adapter error: {0}")]
    Transient(String),
    #[error("scanner was not started")]
    NotStarted,
    #[error("adapter unavailable: {0}")]
    Adapter(String),
}

/// Session with one paired (or pairable) device. Implementations own the
/// transport; callers never see connection management.
#[async_trait]
pub trait DeviceLink: Send + Sync {
    /// Runs the pairing handshake against a device in pairing mode.
    async fn pair(&self) -> Result<PairedIdentity, LinkError>;

    /// Feeds one advertisement into the session's protocol state.
    fn parse_advertisement(&self, advertisement: &Advertisement) -> Result<(), LinkError>;

    /// True when the last advertisement indicated the cached state is stale.
    fn needs_refresh(&self) -> bool;

    /// Reads the full state from the device.
    async fn refresh_state(&self) -> Result<LockState, LinkError>;

    async fn lock(&self) -> Result<(), LinkError>;

    async fn unlock(&self) -> Result<(), LinkError>;

    async fn lock_action(&self, action: u8) -> Result<(), LinkError>;

    /// Checks a security PIN; a device-reported rejection surfaces as
    /// `LinkError::Protocol`.
    async fn verify_pin(&self, pin: u16) -> Result<bool, LinkError>;

    async fn fetch_log(
        &self,
        pin: u16,
        count: u16,
        start_index: u32,
    ) -> Result<Vec<LogEntry>, LinkError>;
}

/// Passive advertisement source shared by discovery and the registry.
#[async_trait]
pub trait AdvertisementScanner: Send + Sync {
    async fn start(&self) -> Result<(), ScanError>;

    async fn stop(&self) -> Result<(), ScanError>;

    fn subscribe(&self) -> broadcast::Receiver<Advertisement>;
}

/// Factory for the wireless stack: one scanner per adapter, one link per
/// configured device.
pub trait DeviceDriver: Send + Sync {
    fn scanner(&self) -> Arc<dyn AdvertisementScanner>;

    fn open(&self, config: &DeviceConfig) -> Arc<dyn DeviceLink>;
}
