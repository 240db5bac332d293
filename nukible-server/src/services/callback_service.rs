use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nukible_api::models::LockState;
use nukible_api::restful::{BridgeStateObject, CallbackEntry, CallbackEvent};
use nukible_api::wire;
use tokio::sync::RwLock;
use url::Url;

use crate::devices::{LockDevice, StateObserver};
use crate::errors::DeviceError;

pub const MAX_CALLBACKS: usize = 3;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Holds the registered webhook URLs and pushes a state object to each of
/// them whenever a device reports fresh state. Slot ids are stable: removing
/// a callback frees its slot for the next registration.
pub struct CallbackService {
    client: reqwest::Client,
    slots: RwLock<[Option<Url>; MAX_CALLBACKS]>,
}

impl CallbackService {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            slots: RwLock::new([None, None, None]),
        }
    }

    /// Stores the URL in the first free slot. With all slots taken the
    /// registration is dropped; the HTTP layer still reports success, so
    /// the only trace is the log line.
    pub async fn add(&self, url: Url) -> Option<usize> {
        let mut slots = self.slots.write().await;
        match slots.iter_mut().enumerate().find(|(_, slot)| slot.is_none()) {
            Some((id, slot)) => {
                tracing::info!(id, url = %url, "callback registered");
                *slot = Some(url);
                Some(id)
            }
            None => {
                tracing::warn!(url = %url, "callback list full, registration dropped");
                None
            }
        }
    }

    pub async fn list(&self) -> Vec<CallbackEntry> {
        self.slots
            .read()
            .await
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| {
                slot.as_ref().map(|url| CallbackEntry {
                    id,
                    url: url.to_string(),
                })
            })
            .collect()
    }

    /// Clears a slot. Ids outside the slot range are a caller error;
    /// clearing an already empty slot is not.
    pub async fn remove(&self, id: usize) -> Result<(), DeviceError> {
        if id >= MAX_CALLBACKS {
            return Err(DeviceError::InvalidRequest);
        }
        self.slots.write().await[id] = None;
        tracing::info!(id, "callback removed");
        Ok(())
    }

    /// Best-effort fan-out: one POST per registered URL, one attempt each.
    /// A failing subscriber is logged and never blocks the others.
    async fn deliver(&self, event: &CallbackEvent) {
        let targets: Vec<(usize, Url)> = self
            .slots
            .read()
            .await
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|url| (id, url.clone())))
            .collect();
        for (id, url) in targets {
            match self
                .client
                .post(url.clone())
                .timeout(DELIVERY_TIMEOUT)
                .json(event)
                .send()
                .await
            {
                Ok(_) => tracing::debug!(id, url = %url, "callback delivered"),
                Err(err) => {
                    tracing::warn!(id, url = %url, error = %err, "callback delivery failed");
                }
            }
        }
    }
}

impl Default for CallbackService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateObserver for CallbackService {
    async fn state_changed(&self, device: Arc<LockDevice>, state: Arc<LockState>) {
        let Some(nuki_id) = device.nuki_id() else {
            return;
        };
        tracing::info!(
            address = %device.address(),
            state = state.lock_state.name(),
            "pushing state change to subscribers"
        );
        let event = CallbackEvent {
            nuki_id: wire::hex_id(nuki_id),
            device_type: device.device_type().code(),
            state: BridgeStateObject::from_state(&state),
        };
        self.deliver(&event).await;
    }
}
