use serde::{Deserialize, Serialize};

use super::lock::BridgeStateObject;

/// One registered webhook as listed by `/callback/list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackEntry {
    pub id: usize,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackListResponse {
    pub callbacks: Vec<CallbackEntry>,
}

/// Payload POSTed to every subscriber when a device state changes: the
/// device identity followed by the flattened bridge state object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackEvent {
    pub nuki_id: String,
    pub device_type: u8,
    #[serde(flatten)]
    pub state: BridgeStateObject,
}
