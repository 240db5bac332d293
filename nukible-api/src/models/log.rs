use serde::{Serialize, Serializer};
use serde_json::Value;
use time::OffsetDateTime;

use crate::wire;

/// One record of a device's activity log.
///
/// Fields the device could not supply render as empty strings rather than
/// `null`, which is what existing bridge clients parse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub index: u32,
    #[serde(serialize_with = "timestamp_or_empty")]
    pub timestamp: Option<OffsetDateTime>,
    #[serde(serialize_with = "string_or_empty")]
    pub auth_id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub log_type: String,
    pub data: Value,
}

fn timestamp_or_empty<S: Serializer>(
    value: &Option<OffsetDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(at) => serializer.serialize_str(&wire::timestamp(*at)),
        None => serializer.serialize_str(""),
    }
}

fn string_or_empty<S: Serializer>(
    value: &Option<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(text) => serializer.serialize_str(text),
        None => serializer.serialize_str(""),
    }
}
