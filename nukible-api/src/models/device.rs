use serde::{Deserialize, Serialize};

/// Device categories understood by the bridge, carried on the wire as the
/// numeric codes of the HTTP API (`deviceType` / `type` fields).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum DeviceType {
    Smartlock,
    Opener,
    SmartDoor,
    Smartlock3,
}

impl DeviceType {
    pub fn code(&self) -> u8 {
        u8::from(*self)
    }

    /// Openers report ring events and use a different action code table.
    pub fn is_opener(&self) -> bool {
        matches!(self, DeviceType::Opener)
    }
}

impl From<DeviceType> for u8 {
    fn from(value: DeviceType) -> Self {
        match value {
            DeviceType::Smartlock => 0,
            DeviceType::Opener => 2,
            DeviceType::SmartDoor => 3,
            DeviceType::Smartlock3 => 4,
        }
    }
}

impl TryFrom<u8> for DeviceType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DeviceType::Smartlock),
            2 => Ok(DeviceType::Opener),
            3 => Ok(DeviceType::SmartDoor),
            4 => Ok(DeviceType::Smartlock3),
            other => Err(format!("unknown device type code: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_type_codes_round_trip() {
        for code in [0u8, 2, 3, 4] {
            let device_type = DeviceType::try_from(code).unwrap();
            assert_eq!(device_type.code(), code);
        }
    }

    #[test]
    fn test_device_type_rejects_unknown_code() {
        assert!(DeviceType::try_from(1).is_err());
        assert!(DeviceType::try_from(255).is_err());
    }

    #[test]
    fn test_device_type_serializes_as_number() {
        let json = serde_json::to_string(&DeviceType::Smartlock3).unwrap();
        assert_eq!(json, "4");
        let parsed: DeviceType = serde_json::from_str("2").unwrap();
        assert_eq!(parsed, DeviceType::Opener);
    }
}
