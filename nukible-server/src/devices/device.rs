use std::sync::Arc;

use nukible_api::models::{DeviceType, LockState, LogEntry};
use tokio::sync::{Mutex, MutexGuard, RwLock};

use crate::configs::DeviceConfig;
use crate::devices::link::{Advertisement, DeviceLink, LinkError};

/// One known device: its persisted record, the live wireless session and the
/// last state snapshot read over it. Snapshots are replaced wholesale, never
/// mutated, so a handler holding an `Arc<LockState>` keeps a consistent view.
pub struct LockDevice {
    config: DeviceConfig,
    link: Arc<dyn DeviceLink>,
    last_state: RwLock<Option<Arc<LockState>>>,
    last_rssi: RwLock<Option<i16>>,
    refresh_serial: Mutex<()>,
}

impl LockDevice {
    pub fn new(config: DeviceConfig, link: Arc<dyn DeviceLink>) -> Self {
        Self {
            config,
            link,
            last_state: RwLock::new(None),
            last_rssi: RwLock::new(None),
            refresh_serial: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn address(&self) -> &str {
        &self.config.address
    }

    pub fn display_name(&self) -> &str {
        self.config.display_name()
    }

    pub fn nuki_id(&self) -> Option<u32> {
        self.config.nuki_id
    }

    pub fn is_paired(&self) -> bool {
        self.config.is_paired()
    }

    pub fn device_type(&self) -> DeviceType {
        self.config.device_type.unwrap_or(DeviceType::Smartlock)
    }

    pub async fn last_state(&self) -> Option<Arc<LockState>> {
        self.last_state.read().await.clone()
    }

    pub async fn rssi(&self) -> Option<i16> {
        *self.last_rssi.read().await
    }

    pub async fn battery_critical(&self) -> bool {
        self.last_state()
            .await
            .map(|state| state.battery_critical)
            .unwrap_or(false)
    }

    pub(crate) async fn record_rssi(&self, rssi: Option<i16>) {
        if rssi.is_some() {
            *self.last_rssi.write().await = rssi;
        }
    }

    /// Feeds an advertisement into the session and reports whether the
    /// cached state is now stale.
    pub(crate) fn observe_advertisement(
        &self,
        advertisement: &Advertisement,
    ) -> Result<bool, LinkError> {
        self.link.parse_advertisement(advertisement)?;
        Ok(self.link.needs_refresh())
    }

    /// Refreshes for one device are serialized so observers always see
    /// snapshots in the order they were read from the device.
    pub(crate) async fn refresh_order(&self) -> MutexGuard<'_, ()> {
        self.refresh_serial.lock().await
    }

    /// Reads the state over the link and replaces the cached snapshot.
    pub async fn refresh(&self) -> Result<Arc<LockState>, LinkError> {
        let state = Arc::new(self.link.refresh_state().await?);
        *self.last_state.write().await = Some(Arc::clone(&state));
        Ok(state)
    }

    pub async fn lock(&self) -> Result<(), LinkError> {
        self.link.lock().await
    }

    pub async fn unlock(&self) -> Result<(), LinkError> {
        self.link.unlock().await
    }

    pub async fn lock_action(&self, action: u8) -> Result<(), LinkError> {
        self.link.lock_action(action).await
    }

    pub async fn verify_pin(&self, pin: u16) -> Result<bool, LinkError> {
        self.link.verify_pin(pin).await
    }

    pub async fn fetch_log(
        &self,
        pin: u16,
        count: u16,
        start_index: u32,
    ) -> Result<Vec<LogEntry>, LinkError> {
        self.link.fetch_log(pin, count, start_index).await
    }
}
