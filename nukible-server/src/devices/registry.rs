use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nukible_api::models::LockState;
use tokio::sync::{RwLock, broadcast};

use crate::devices::device::LockDevice;
use crate::devices::link::{Advertisement, AdvertisementScanner, ScanError};
use crate::errors::DeviceError;

const SCAN_START_ATTEMPTS: u32 = 8;
const SCAN_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Receives a snapshot every time a device refresh completes, plus one
/// replay per device when installed.
#[async_trait]
pub trait StateObserver: Send + Sync {
    async fn state_changed(&self, device: Arc<LockDevice>, state: Arc<LockState>);
}

/// Owns every known device and routes scanner traffic to them. Devices are
/// keyed by wireless address; lookups by paired id scan the (small) set.
pub struct DeviceRegistry {
    scanner: Arc<dyn AdvertisementScanner>,
    devices: RwLock<Vec<Arc<LockDevice>>>,
    observer: RwLock<Option<Arc<dyn StateObserver>>>,
}

impl DeviceRegistry {
    pub fn new(scanner: Arc<dyn AdvertisementScanner>) -> Self {
        Self {
            scanner,
            devices: RwLock::new(Vec::new()),
            observer: RwLock::new(None),
        }
    }

    /// Adds a device, replacing any earlier registration of the same address.
    pub async fn register(&self, device: Arc<LockDevice>) {
        let mut devices = self.devices.write().await;
        if let Some(slot) = devices
            .iter_mut()
            .find(|known| known.address() == device.address())
        {
            *slot = device;
        } else {
            devices.push(device);
        }
    }

    /// Devices in registration order.
    pub async fn devices(&self) -> Vec<Arc<LockDevice>> {
        self.devices.read().await.clone()
    }

    /// Resolves a paired device by its id. Unpaired registrations never
    /// match, so callers see `DeviceNotFound` until pairing completes.
    pub async fn by_nuki_id(&self, nuki_id: u32) -> Result<Arc<LockDevice>, DeviceError> {
        self.devices
            .read()
            .await
            .iter()
            .find(|device| device.nuki_id() == Some(nuki_id))
            .cloned()
            .ok_or(DeviceError::DeviceNotFound)
    }

    async fn by_address(&self, address: &str) -> Option<Arc<LockDevice>> {
        self.devices
            .read()
            .await
            .iter()
            .find(|device| device.address() == address)
            .cloned()
    }

    pub async fn has_observer(&self) -> bool {
        self.observer.read().await.is_some()
    }

    /// Installs the observer and replays the current snapshot of every
    /// device that already has one, so a late subscriber starts in sync.
    pub async fn set_state_observer(&self, observer: Arc<dyn StateObserver>) {
        *self.observer.write().await = Some(Arc::clone(&observer));
        for device in self.devices().await {
            if let Some(state) = device.last_state().await {
                let observer = Arc::clone(&observer);
                tokio::spawn(async move {
                    observer.state_changed(device, state).await;
                });
            }
        }
    }

    /// Routes one advertisement to the device it belongs to. Unknown
    /// addresses are simply ignored; a stale-state signal spawns a refresh.
    pub async fn handle_advertisement(self: &Arc<Self>, advertisement: Advertisement) {
        let Some(device) = self.by_address(&advertisement.address).await else {
            tracing::trace!(
                address = %advertisement.address,
                "advertisement from unknown device ignored"
            );
            return;
        };
        device.record_rssi(advertisement.rssi).await;
        match device.observe_advertisement(&advertisement) {
            Ok(true) => {
                let registry = Arc::clone(self);
                tokio::spawn(async move {
                    registry.refresh_device(device).await;
                });
            }
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(
                    address = %device.address(),
                    error = %err,
                    "discarded advertisement"
                );
            }
        }
    }

    async fn refresh_device(&self, device: Arc<LockDevice>) {
        let _ordered = device.refresh_order().await;
        match device.refresh().await {
            Ok(state) => {
                tracing::debug!(
                    address = %device.address(),
                    state = state.lock_state.name(),
                    "device state refreshed"
                );
                let observer = self.observer.read().await.clone();
                if let Some(observer) = observer {
                    observer.state_changed(Arc::clone(&device), state).await;
                }
            }
            Err(err) => {
                tracing::warn!(
                    address = %device.address(),
                    error = %err,
                    "state refresh failed"
                );
            }
        }
    }

    /// Drains the scanner's advertisement stream until it closes.
    pub async fn listen(self: Arc<Self>) {
        let mut advertisements = self.scanner.subscribe();
        loop {
            match advertisements.recv().await {
                Ok(advertisement) => self.handle_advertisement(advertisement).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "advertisement listener lagging");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// Starts the scanner, retrying transient adapter errors a bounded
    /// number of times. Every attempt up to the bound actually runs; the
    /// final failure is returned to the caller.
    pub async fn start_scanning(&self) -> Result<(), ScanError> {
        tracing::info!("starting advertisement scan");
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.scanner.start().await {
                Ok(()) => {
                    tracing::info!(attempt, "advertisement scan running");
                    return Ok(());
                }
                Err(ScanError::Transient(reason)) if attempt < SCAN_START_ATTEMPTS => {
                    tracing::warn!(attempt, reason, "scan start failed, retrying");
                    tokio::time::sleep(SCAN_RETRY_DELAY).await;
                }
                Err(err) => {
                    tracing::error!(attempt, error = %err, "could not start scanning");
                    return Err(err);
                }
            }
        }
    }

    /// Best-effort scanner shutdown. A scanner that was never started is a
    /// no-op; every other failure (including a hung adapter) is logged and
    /// swallowed so shutdown always proceeds.
    pub async fn stop_scanning(&self, timeout: Duration) {
        tracing::info!("stopping advertisement scan");
        match tokio::time::timeout(timeout, self.scanner.stop()).await {
            Ok(Ok(())) => tracing::info!("advertisement scan stopped"),
            Ok(Err(ScanError::NotStarted)) => {
                tracing::warn!("scan was never started");
            }
            Ok(Err(err)) => {
                tracing::error!(error = %err, "error while stopping scan");
            }
            Err(_) => {
                tracing::error!("timed out stopping scan");
            }
        }
    }
}
