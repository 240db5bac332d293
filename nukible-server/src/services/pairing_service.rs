use std::sync::Arc;
use std::time::Duration;

use nukible_api::wire;
use rand::rngs::OsRng;
use tokio::sync::broadcast;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::configs::{DeviceConfig, Settings};
use crate::devices::DeviceDriver;
use crate::errors::ConfigError;

/// Advertised name prefix shared by all pairable devices.
const DEVICE_NAME_PREFIX: &str = "Nuki_";

/// How long discovery listens for advertisements before deciding.
const DISCOVERY_WINDOW: Duration = Duration::from_secs(8);

/// First-run pairing: discovers exactly one device in pairing range and
/// runs the handshake against it. The caller persists the updated settings
/// afterwards, so a failure here leaves nothing on disk.
pub struct PairingService {
    driver: Arc<dyn DeviceDriver>,
}

impl PairingService {
    pub fn new(driver: Arc<dyn DeviceDriver>) -> Self {
        Self { driver }
    }

    pub async fn bootstrap(&self, settings: &mut Settings) -> Result<(), ConfigError> {
        tracing::info!("no paired device on record, starting discovery");
        let pinned = settings
            .pairing
            .as_ref()
            .map(|pairing| pairing.address.clone());
        let candidates = self.discover(pinned.as_deref()).await?;
        let address = match candidates.as_slice() {
            [] => return Err(ConfigError::NoDeviceFound),
            [address] => address.clone(),
            _ => {
                return Err(ConfigError::AmbiguousDevice {
                    addresses: candidates,
                });
            }
        };

        tracing::info!(address = %address, "generating bridge key pair");
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        let mut record = DeviceConfig::unpaired(
            &address,
            hex::encode(public.as_bytes()),
            hex::encode(secret.to_bytes()),
        );

        let link = self.driver.open(&record);
        let identity = link.pair().await?;
        tracing::info!(
            nuki_id = %wire::hex_id(identity.nuki_id),
            name = %identity.name,
            "pairing completed"
        );

        record.nuki_id = Some(identity.nuki_id);
        record.name = Some(identity.name);
        record.device_type = Some(identity.device_type);
        record.nuki_public_key = Some(identity.nuki_public_key);
        record.auth_id = Some(identity.auth_id);
        settings.smartlock.push(record);
        Ok(())
    }

    /// Collects pairable addresses seen within the discovery window. With a
    /// pinned address only that device counts; everything else is skipped.
    async fn discover(&self, pinned: Option<&str>) -> Result<Vec<String>, ConfigError> {
        let scanner = self.driver.scanner();
        let mut advertisements = scanner.subscribe();
        scanner.start().await?;

        let deadline = tokio::time::sleep(DISCOVERY_WINDOW);
        tokio::pin!(deadline);
        let mut found: Vec<String> = Vec::new();
        loop {
            tokio::select! {
                _ = &mut deadline => break,
                received = advertisements.recv() => match received {
                    Ok(advertisement) => {
                        let Some(name) = advertisement.local_name.as_deref() else {
                            continue;
                        };
                        if !name.starts_with(DEVICE_NAME_PREFIX) {
                            continue;
                        }
                        if pinned.is_some_and(|pin| pin != advertisement.address) {
                            continue;
                        }
                        if !found.contains(&advertisement.address) {
                            tracing::info!(
                                address = %advertisement.address,
                                name,
                                "discovered candidate device"
                            );
                            found.push(advertisement.address);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }

        if let Err(err) = scanner.stop().await {
            tracing::warn!(error = %err, "could not stop discovery scan");
        }
        Ok(found)
    }
}
