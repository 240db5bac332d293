use serde::{Deserialize, Serialize};

use super::lock::BridgeStateObject;

/// `bridgeType` value for software bridges.
pub const SOFTWARE_BRIDGE_TYPE: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeIds {
    pub hardware_id: u32,
    pub server_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeVersions {
    pub app_version: String,
}

/// One row of the `/info` scan result table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub nuki_id: String,
    #[serde(rename = "type")]
    pub device_type: u8,
    pub name: String,
    pub rssi: Option<i16>,
    pub paired: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeInfoResponse {
    pub bridge_type: u8,
    pub ids: BridgeIds,
    pub versions: BridgeVersions,
    /// Whole seconds since the bridge process started.
    pub uptime: u64,
    pub current_time: String,
    pub server_connected: bool,
    pub scan_results: Vec<ScanResult>,
}

/// One element of the `/list` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceListItem {
    pub nuki_id: String,
    pub device_type: u8,
    pub name: String,
    /// Null until the first state refresh completes.
    pub last_known_state: Option<BridgeStateObject>,
}
