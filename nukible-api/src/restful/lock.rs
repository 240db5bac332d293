use serde::{Deserialize, Serialize};

use crate::models::LockState;
use crate::wire;

/// The bridge state object, rendered by `/lockState`, embedded in `/list`
/// items and pushed to webhook subscribers.
///
/// Field names and order follow the vendor HTTP API. `keypadBatteryCritical`
/// is a wire-compatibility constant; the wireless API does not expose it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeStateObject {
    pub mode: u8,
    pub state: u8,
    pub state_name: String,
    pub battery_critical: bool,
    pub battery_charging: bool,
    pub battery_charge_state: u8,
    pub keypad_battery_critical: bool,
    #[serde(rename = "doorsensorState")]
    pub doorsensor_state: u8,
    #[serde(rename = "doorsensorStateName")]
    pub doorsensor_state_name: String,
    #[serde(rename = "ringactionTimestamp")]
    pub ringaction_timestamp: Option<String>,
    #[serde(rename = "ringactionState")]
    pub ringaction_state: Option<u8>,
    pub timestamp: String,
    pub success: bool,
}

impl BridgeStateObject {
    pub fn from_state(state: &LockState) -> Self {
        Self {
            mode: state.mode,
            state: state.lock_state.code(),
            state_name: state.lock_state.name().to_string(),
            battery_critical: state.battery_critical,
            battery_charging: state.battery_charging,
            battery_charge_state: state.battery_percentage,
            keypad_battery_critical: false,
            doorsensor_state: state.door_sensor.code(),
            doorsensor_state_name: state.door_sensor.name().to_string(),
            ringaction_timestamp: state.ring_action_timestamp.map(wire::timestamp),
            ringaction_state: state.ring_action_state,
            timestamp: wire::timestamp(state.timestamp),
            success: true,
        }
    }
}

/// `/lock`, `/unlock` and `/lockAction` acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    pub success: bool,
    pub battery_critical: bool,
}
