use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Keyturner lock states as reported by the device.
///
/// Codes outside the published table are preserved verbatim in `Other` so a
/// firmware we have never seen still round-trips through the HTTP API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub enum LockStateCode {
    Uncalibrated,
    Locked,
    Unlocking,
    Unlocked,
    Locking,
    Unlatched,
    UnlockedLockAndGo,
    Unlatching,
    MotorBlocked,
    Undefined,
    Other(u8),
}

impl LockStateCode {
    /// Display name used for the `stateName` field of state objects.
    pub fn name(&self) -> &'static str {
        match self {
            LockStateCode::Uncalibrated => "uncalibrated",
            LockStateCode::Locked => "locked",
            LockStateCode::Unlocking => "unlocking",
            LockStateCode::Unlocked => "unlocked",
            LockStateCode::Locking => "locking",
            LockStateCode::Unlatched => "unlatched",
            LockStateCode::UnlockedLockAndGo => "unlocked (lock 'n' go)",
            LockStateCode::Unlatching => "unlatching",
            LockStateCode::MotorBlocked => "motor blocked",
            LockStateCode::Undefined | LockStateCode::Other(_) => "undefined",
        }
    }

    pub fn code(&self) -> u8 {
        u8::from(*self)
    }
}

impl From<u8> for LockStateCode {
    fn from(value: u8) -> Self {
        match value {
            0 => LockStateCode::Uncalibrated,
            1 => LockStateCode::Locked,
            2 => LockStateCode::Unlocking,
            3 => LockStateCode::Unlocked,
            4 => LockStateCode::Locking,
            5 => LockStateCode::Unlatched,
            6 => LockStateCode::UnlockedLockAndGo,
            7 => LockStateCode::Unlatching,
            254 => LockStateCode::MotorBlocked,
            255 => LockStateCode::Undefined,
            other => LockStateCode::Other(other),
        }
    }
}

impl From<LockStateCode> for u8 {
    fn from(value: LockStateCode) -> Self {
        match value {
            LockStateCode::Uncalibrated => 0,
            LockStateCode::Locked => 1,
            LockStateCode::Unlocking => 2,
            LockStateCode::Unlocked => 3,
            LockStateCode::Locking => 4,
            LockStateCode::Unlatched => 5,
            LockStateCode::UnlockedLockAndGo => 6,
            LockStateCode::Unlatching => 7,
            LockStateCode::MotorBlocked => 254,
            LockStateCode::Undefined => 255,
            LockStateCode::Other(code) => code,
        }
    }
}

/// Door sensor states of locks with a paired door sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub enum DoorSensorState {
    Deactivated,
    DoorClosed,
    DoorOpened,
    DoorStateUnknown,
    Calibrating,
    Uncalibrated,
    Removed,
    Unknown,
    Other(u8),
}

impl DoorSensorState {
    /// Display name used for the `doorsensorStateName` field of state objects.
    pub fn name(&self) -> &'static str {
        match self {
            DoorSensorState::Deactivated => "deactivated",
            DoorSensorState::DoorClosed => "door closed",
            DoorSensorState::DoorOpened => "door opened",
            DoorSensorState::DoorStateUnknown => "door state unknown",
            DoorSensorState::Calibrating => "calibrating",
            DoorSensorState::Uncalibrated => "uncalibrated",
            DoorSensorState::Removed => "removed",
            DoorSensorState::Unknown | DoorSensorState::Other(_) => "unknown",
        }
    }

    pub fn code(&self) -> u8 {
        u8::from(*self)
    }
}

impl From<u8> for DoorSensorState {
    fn from(value: u8) -> Self {
        match value {
            1 => DoorSensorState::Deactivated,
            2 => DoorSensorState::DoorClosed,
            3 => DoorSensorState::DoorOpened,
            4 => DoorSensorState::DoorStateUnknown,
            5 => DoorSensorState::Calibrating,
            16 => DoorSensorState::Uncalibrated,
            240 => DoorSensorState::Removed,
            255 => DoorSensorState::Unknown,
            other => DoorSensorState::Other(other),
        }
    }
}

impl From<DoorSensorState> for u8 {
    fn from(value: DoorSensorState) -> Self {
        match value {
            DoorSensorState::Deactivated => 1,
            DoorSensorState::DoorClosed => 2,
            DoorSensorState::DoorOpened => 3,
            DoorSensorState::DoorStateUnknown => 4,
            DoorSensorState::Calibrating => 5,
            DoorSensorState::Uncalibrated => 16,
            DoorSensorState::Removed => 240,
            DoorSensorState::Unknown => 255,
            DoorSensorState::Other(code) => code,
        }
    }
}

/// Snapshot of a device's keyturner state as last read over the radio link.
#[derive(Debug, Clone, PartialEq)]
pub struct LockState {
    pub mode: u8,
    pub lock_state: LockStateCode,
    pub battery_critical: bool,
    pub battery_charging: bool,
    pub battery_percentage: u8,
    pub door_sensor: DoorSensorState,
    /// Ring events are only reported by openers.
    pub ring_action_timestamp: Option<OffsetDateTime>,
    pub ring_action_state: Option<u8>,
    /// Moment the snapshot was taken, bridge clock.
    pub timestamp: OffsetDateTime,
}
