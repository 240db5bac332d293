use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use nukible_api::restful::{
    BridgeIds, BridgeInfoResponse, BridgeStateObject, BridgeVersions, DeviceListItem, ScanResult,
    SOFTWARE_BRIDGE_TYPE,
};
use nukible_api::wire;
use time::OffsetDateTime;

use crate::configs::Server;
use crate::devices::DeviceRegistry;

#[derive(Clone)]
pub struct BridgeState {
    pub server: Server,
    pub registry: Arc<DeviceRegistry>,
    pub started_at: Instant,
}

/// `/info`: bridge identity and one scan-result row per paired device.
pub async fn bridge_info(State(state): State<BridgeState>) -> impl IntoResponse {
    let mut scan_results = Vec::new();
    for device in state.registry.devices().await {
        let Some(nuki_id) = device.nuki_id() else {
            continue;
        };
        scan_results.push(ScanResult {
            nuki_id: wire::hex_id(nuki_id),
            device_type: device.device_type().code(),
            name: device.display_name().to_string(),
            rssi: device.rssi().await,
            paired: true,
        });
    }

    Json(BridgeInfoResponse {
        bridge_type: SOFTWARE_BRIDGE_TYPE,
        ids: BridgeIds {
            hardware_id: state.server.app_id,
            server_id: state.server.app_id,
        },
        versions: BridgeVersions {
            app_version: env!("CARGO_PKG_VERSION").to_string(),
        },
        uptime: state.started_at.elapsed().as_secs(),
        current_time: wire::timestamp_utc(OffsetDateTime::now_utc()),
        server_connected: false,
        scan_results,
    })
}

/// `/list`: every paired device with its last known state. The state field
/// stays null until the first refresh completes.
pub async fn list_devices(State(state): State<BridgeState>) -> impl IntoResponse {
    let mut items = Vec::new();
    for device in state.registry.devices().await {
        let Some(nuki_id) = device.nuki_id() else {
            continue;
        };
        let last_known_state = device
            .last_state()
            .await
            .map(|snapshot| BridgeStateObject::from_state(&snapshot));
        items.push(DeviceListItem {
            nuki_id: wire::hex_id(nuki_id),
            device_type: device.device_type().code(),
            name: device.display_name().to_string(),
            last_known_state,
        });
    }

    Json(items)
}
