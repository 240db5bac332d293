use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use nukible_api::models::{DeviceType, DoorSensorState, LockState, LockStateCode, LogEntry};
use rand::RngCore;
use rand::rngs::OsRng;
use serde_json::json;
use time::OffsetDateTime;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::configs::{DeviceConfig, DeviceTiming};
use crate::devices::link::{
    Advertisement, AdvertisementScanner, DeviceDriver, DeviceLink, LinkError, PairedIdentity,
    ScanError,
};

/// How often the simulated adapter re-advertises each attached device.
pub const SIM_ADVERTISE_PERIOD: Duration = Duration::from_secs(5);

const SIM_RSSI: i16 = -60;

pub const BAD_PIN_CODE: &str = "K_ERROR_BAD_PIN";
pub const BAD_PARAMETER_CODE: &str = "K_ERROR_BAD_PARAMETER";

/// In-memory device the simulated driver talks to. It tracks a change
/// counter the way a real lock does: every state mutation bumps it, the
/// counter rides along in advertisements, and a mismatch against the counter
/// seen at the last refresh marks the cached state stale.
pub struct SimulatedLock {
    address: String,
    name: String,
    nuki_id: u32,
    device_type: DeviceType,
    pin: u16,
    state: StdMutex<SimLockState>,
}

struct SimLockState {
    mode: u8,
    lock_state: LockStateCode,
    battery_critical: bool,
    battery_charging: bool,
    battery_percentage: u8,
    door_sensor: DoorSensorState,
    ring_action_timestamp: Option<OffsetDateTime>,
    ring_action_state: Option<u8>,
    change_counter: u8,
    synced_counter: Option<u8>,
    refresh_pending: bool,
    last_action: Option<u8>,
    log: Vec<LogEntry>,
    next_log_index: u32,
    reject_code: Option<String>,
    unreachable: bool,
    timing: Option<DeviceTiming>,
}

/// Last six hex digits of the address double as serial number: they become
/// the device id and the advertised name, the way real hardware does it.
fn derive_identity(address: &str) -> (u32, String) {
    let digits: String = address.chars().filter(|c| c.is_ascii_hexdigit()).collect();
    let tail = &digits[digits.len().saturating_sub(6)..];
    let nuki_id = u32::from_str_radix(tail, 16).unwrap_or(0x10_0000);
    let name = format!("Nuki_{}", tail.to_uppercase());
    (nuki_id, name)
}

impl SimulatedLock {
    pub fn new(address: impl Into<String>) -> Self {
        let address = address.into();
        let (nuki_id, name) = derive_identity(&address);
        let log = vec![LogEntry {
            index: 0,
            timestamp: None,
            auth_id: None,
            name: name.clone(),
            log_type: "LOGGING_ENABLED".to_string(),
            data: json!({}),
        }];
        Self {
            address,
            name,
            nuki_id,
            device_type: DeviceType::Smartlock,
            pin: 0,
            state: StdMutex::new(SimLockState {
                mode: 2,
                lock_state: LockStateCode::Unlocked,
                battery_critical: false,
                battery_charging: false,
                battery_percentage: 87,
                door_sensor: DoorSensorState::Deactivated,
                ring_action_timestamp: None,
                ring_action_state: None,
                change_counter: 0,
                synced_counter: None,
                refresh_pending: false,
                last_action: None,
                log,
                next_log_index: 1,
                reject_code: None,
                unreachable: false,
                timing: None,
            }),
        }
    }

    pub fn with_nuki_id(mut self, nuki_id: u32) -> Self {
        self.nuki_id = nuki_id;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_device_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = device_type;
        self
    }

    pub fn with_pin(mut self, pin: u16) -> Self {
        self.pin = pin;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn nuki_id(&self) -> u32 {
        self.nuki_id
    }

    pub fn lock_state(&self) -> LockStateCode {
        self.state.lock().unwrap().lock_state
    }

    pub fn last_action(&self) -> Option<u8> {
        self.state.lock().unwrap().last_action
    }

    /// Timing handed over by the driver at `open` time. The simulation only
    /// records it; a radio driver would use it for its connect logic.
    pub fn timing(&self) -> Option<DeviceTiming> {
        self.state.lock().unwrap().timing
    }

    pub fn set_lock_state(&self, lock_state: LockStateCode) {
        let mut state = self.state.lock().unwrap();
        state.lock_state = lock_state;
        state.change_counter = state.change_counter.wrapping_add(1);
    }

    pub fn set_battery(&self, critical: bool, charging: bool, percentage: u8) {
        let mut state = self.state.lock().unwrap();
        state.battery_critical = critical;
        state.battery_charging = charging;
        state.battery_percentage = percentage;
        state.change_counter = state.change_counter.wrapping_add(1);
    }

    pub fn set_door_sensor(&self, door_sensor: DoorSensorState) {
        let mut state = self.state.lock().unwrap();
        state.door_sensor = door_sensor;
        state.change_counter = state.change_counter.wrapping_add(1);
    }

    pub fn set_ring_action(&self, timestamp: OffsetDateTime, ring_state: u8) {
        let mut state = self.state.lock().unwrap();
        state.ring_action_timestamp = Some(timestamp);
        state.ring_action_state = Some(ring_state);
        state.change_counter = state.change_counter.wrapping_add(1);
    }

    pub fn make_unreachable(&self) {
        self.state.lock().unwrap().unreachable = true;
    }

    /// Makes every subsequent command fail with the given device error code.
    pub fn reject_commands(&self, code: &str) {
        self.state.lock().unwrap().reject_code = Some(code.to_string());
    }

    pub fn advertisement(&self) -> Advertisement {
        let state = self.state.lock().unwrap();
        Advertisement {
            address: self.address.clone(),
            local_name: Some(self.name.clone()),
            rssi: Some(SIM_RSSI),
            manufacturer_data: vec![state.change_counter],
        }
    }

    fn apply_timing(&self, timing: DeviceTiming) {
        self.state.lock().unwrap().timing = Some(timing);
    }

    fn checked(&self) -> Result<MutexGuard<'_, SimLockState>, LinkError> {
        let state = self.state.lock().unwrap();
        if state.unreachable {
            return Err(LinkError::Unreachable(
                "simulated device offline".to_string(),
            ));
        }
        if let Some(code) = &state.reject_code {
            return Err(LinkError::Protocol { code: code.clone() });
        }
        Ok(state)
    }

    fn apply_action(&self, action: u8) -> Result<(), LinkError> {
        let mut state = self.checked()?;
        let next = match action {
            1 => LockStateCode::Unlocked,
            2 => LockStateCode::Locked,
            3 => LockStateCode::Unlatched,
            4 => LockStateCode::UnlockedLockAndGo,
            5 => LockStateCode::Unlatched,
            6 => LockStateCode::Locked,
            _ => {
                return Err(LinkError::Protocol {
                    code: BAD_PARAMETER_CODE.to_string(),
                });
            }
        };
        state.lock_state = next;
        state.last_action = Some(action);
        state.change_counter = state.change_counter.wrapping_add(1);
        let index = state.next_log_index;
        state.next_log_index += 1;
        state.log.push(LogEntry {
            index,
            timestamp: Some(OffsetDateTime::now_utc()),
            auth_id: Some("2b".to_string()),
            name: self.name.clone(),
            log_type: "LOCK_ACTION".to_string(),
            data: json!({ "lock_action": action, "trigger": 0 }),
        });
        Ok(())
    }
}

#[async_trait]
impl DeviceLink for SimulatedLock {
    async fn pair(&self) -> Result<PairedIdentity, LinkError> {
        let _state = self.checked()?;
        let mut rng = OsRng;
        let mut key = [0u8; 32];
        rng.fill_bytes(&mut key);
        let mut auth = [0u8; 4];
        rng.fill_bytes(&mut auth);
        Ok(PairedIdentity {
            nuki_id: self.nuki_id,
            name: self.name.clone(),
            device_type: self.device_type,
            nuki_public_key: hex::encode(key),
            auth_id: hex::encode(auth),
        })
    }

    fn parse_advertisement(&self, advertisement: &Advertisement) -> Result<(), LinkError> {
        let Some(&counter) = advertisement.manufacturer_data.first() else {
            return Err(LinkError::BadAdvertisement);
        };
        let mut state = self.state.lock().unwrap();
        if state.synced_counter != Some(counter) {
            state.refresh_pending = true;
        }
        Ok(())
    }

    fn needs_refresh(&self) -> bool {
        self.state.lock().unwrap().refresh_pending
    }

    async fn refresh_state(&self) -> Result<LockState, LinkError> {
        let mut state = self.checked()?;
        state.synced_counter = Some(state.change_counter);
        state.refresh_pending = false;
        let is_opener = self.device_type.is_opener();
        Ok(LockState {
            mode: state.mode,
            lock_state: state.lock_state,
            battery_critical: state.battery_critical,
            battery_charging: state.battery_charging,
            battery_percentage: state.battery_percentage,
            door_sensor: state.door_sensor,
            ring_action_timestamp: is_opener.then_some(state.ring_action_timestamp).flatten(),
            ring_action_state: is_opener.then_some(state.ring_action_state).flatten(),
            timestamp: OffsetDateTime::now_utc(),
        })
    }

    async fn lock(&self) -> Result<(), LinkError> {
        self.apply_action(2)
    }

    async fn unlock(&self) -> Result<(), LinkError> {
        self.apply_action(1)
    }

    async fn lock_action(&self, action: u8) -> Result<(), LinkError> {
        self.apply_action(action)
    }

    async fn verify_pin(&self, pin: u16) -> Result<bool, LinkError> {
        let _state = self.checked()?;
        if pin == self.pin {
            Ok(true)
        } else {
            Err(LinkError::Protocol {
                code: BAD_PIN_CODE.to_string(),
            })
        }
    }

    async fn fetch_log(
        &self,
        pin: u16,
        count: u16,
        start_index: u32,
    ) -> Result<Vec<LogEntry>, LinkError> {
        let state = self.checked()?;
        if pin != self.pin {
            return Err(LinkError::Protocol {
                code: BAD_PIN_CODE.to_string(),
            });
        }
        Ok(state
            .log
            .iter()
            .rev()
            .skip(start_index as usize)
            .take(count as usize)
            .cloned()
            .collect())
    }
}

/// Simulated adapter: a broadcast channel plus a ticker that re-advertises
/// every attached lock. Failure injection hooks cover the retry and
/// shutdown paths of the registry.
pub struct SimulatedScanner {
    advertisements: broadcast::Sender<Advertisement>,
    attached: Arc<StdMutex<Vec<Arc<SimulatedLock>>>>,
    started: AtomicBool,
    start_attempts: AtomicUsize,
    failing_starts: AtomicUsize,
    fail_stop: AtomicBool,
    hang_stop: AtomicBool,
    ticker: StdMutex<Option<JoinHandle<()>>>,
}

impl SimulatedScanner {
    pub fn new() -> Self {
        let (advertisements, _) = broadcast::channel(100);
        Self {
            advertisements,
            attached: Arc::new(StdMutex::new(Vec::new())),
            started: AtomicBool::new(false),
            start_attempts: AtomicUsize::new(0),
            failing_starts: AtomicUsize::new(0),
            fail_stop: AtomicBool::new(false),
            hang_stop: AtomicBool::new(false),
            ticker: StdMutex::new(None),
        }
    }

    pub fn attach(&self, lock: Arc<SimulatedLock>) {
        self.attached.lock().unwrap().push(lock);
    }

    /// Injects one advertisement, bypassing the ticker.
    pub fn emit(&self, advertisement: Advertisement) {
        let _ = self.advertisements.send(advertisement);
    }

    pub fn fail_next_starts(&self, count: usize) {
        self.failing_starts.store(count, Ordering::SeqCst);
    }

    pub fn start_attempts(&self) -> usize {
        self.start_attempts.load(Ordering::SeqCst)
    }

    pub fn fail_on_stop(&self) {
        self.fail_stop.store(true, Ordering::SeqCst);
    }

    pub fn hang_on_stop(&self) {
        self.hang_stop.store(true, Ordering::SeqCst);
    }
}

impl Default for SimulatedScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdvertisementScanner for SimulatedScanner {
    async fn start(&self) -> Result<(), ScanError> {
        self.start_attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing_starts.load(Ordering::SeqCst) > 0 {
            self.failing_starts.fetch_sub(1, Ordering::SeqCst);
            return Err(ScanError::Transient(
                "simulated adapter busy".to_string(),
            ));
        }
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let sender = self.advertisements.clone();
        let attached = Arc::clone(&self.attached);
        let handle = tokio::spawn(async move {
            let mut tick = tokio::time::interval(SIM_ADVERTISE_PERIOD);
            loop {
                tick.tick().await;
                let roster: Vec<Arc<SimulatedLock>> = attached.lock().unwrap().clone();
                for lock in roster {
                    let _ = sender.send(lock.advertisement());
                }
            }
        });
        *self.ticker.lock().unwrap() = Some(handle);
        Ok(())
    }

    async fn stop(&self) -> Result<(), ScanError> {
        if self.hang_stop.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if !self.started.swap(false, Ordering::SeqCst) {
            return Err(ScanError::NotStarted);
        }
        if let Some(handle) = self.ticker.lock().unwrap().take() {
            handle.abort();
        }
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(ScanError::Transient(
                "simulated adapter reset".to_string(),
            ));
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<Advertisement> {
        self.advertisements.subscribe()
    }
}

/// Driver used when no radio hardware is present: the bridge runs its full
/// lifecycle against simulated devices.
pub struct SimulatedDriver {
    scanner: Arc<SimulatedScanner>,
    locks: StdMutex<HashMap<String, Arc<SimulatedLock>>>,
}

impl SimulatedDriver {
    pub fn new() -> Self {
        Self {
            scanner: Arc::new(SimulatedScanner::new()),
            locks: StdMutex::new(HashMap::new()),
        }
    }

    /// Seeds a device so discovery and `open` find it.
    pub fn add_lock(&self, lock: Arc<SimulatedLock>) {
        self.scanner.attach(lock.clone());
        self.locks
            .lock()
            .unwrap()
            .insert(lock.address().to_string(), lock);
    }

    pub fn lock(&self, address: &str) -> Option<Arc<SimulatedLock>> {
        self.locks.lock().unwrap().get(address).cloned()
    }

    pub fn scanner_handle(&self) -> Arc<SimulatedScanner> {
        Arc::clone(&self.scanner)
    }
}

impl Default for SimulatedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceDriver for SimulatedDriver {
    fn scanner(&self) -> Arc<dyn AdvertisementScanner> {
        self.scanner.clone()
    }

    fn open(&self, config: &DeviceConfig) -> Arc<dyn DeviceLink> {
        let mut locks = self.locks.lock().unwrap();
        let lock = locks
            .entry(config.address.clone())
            .or_insert_with(|| {
                let mut lock = SimulatedLock::new(&config.address);
                if let Some(nuki_id) = config.nuki_id {
                    lock = lock.with_nuki_id(nuki_id);
                }
                if let Some(name) = &config.name {
                    lock = lock.with_name(name);
                }
                if let Some(device_type) = config.device_type {
                    lock = lock.with_device_type(device_type);
                }
                let lock = Arc::new(lock);
                self.scanner.attach(Arc::clone(&lock));
                lock
            })
            .clone();
        lock.apply_timing(config.timing());
        lock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "54:D2:72:1A:2B:3C";

    #[test]
    fn test_identity_derived_from_address() {
        let lock = SimulatedLock::new(ADDRESS);

        assert_eq!(lock.nuki_id(), 0x1a2b3c);
        assert_eq!(lock.advertisement().local_name.unwrap(), "Nuki_1A2B3C");
    }

    #[tokio::test]
    async fn test_change_counter_drives_refresh_flag() {
        let lock = SimulatedLock::new(ADDRESS);

        // Never refreshed: the first advertisement always marks it stale.
        lock.parse_advertisement(&lock.advertisement()).unwrap();
        assert!(lock.needs_refresh());

        lock.refresh_state().await.unwrap();
        assert!(!lock.needs_refresh());

        lock.parse_advertisement(&lock.advertisement()).unwrap();
        assert!(!lock.needs_refresh());

        lock.set_lock_state(LockStateCode::Locked);
        lock.parse_advertisement(&lock.advertisement()).unwrap();
        assert!(lock.needs_refresh());
    }

    #[tokio::test]
    async fn test_empty_advertisement_payload_is_rejected() {
        let lock = SimulatedLock::new(ADDRESS);
        let mut advertisement = lock.advertisement();
        advertisement.manufacturer_data.clear();

        assert!(matches!(
            lock.parse_advertisement(&advertisement),
            Err(LinkError::BadAdvertisement)
        ));
    }

    #[tokio::test]
    async fn test_commands_update_state_and_log() {
        let lock = SimulatedLock::new(ADDRESS).with_pin(1234);

        lock.lock().await.unwrap();
        assert_eq!(lock.lock_state(), LockStateCode::Locked);
        assert_eq!(lock.last_action(), Some(2));

        lock.unlock().await.unwrap();
        assert_eq!(lock.lock_state(), LockStateCode::Unlocked);

        // Newest first, then the initial LOGGING_ENABLED marker.
        let entries = lock.fetch_log(1234, 10, 0).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].log_type, "LOCK_ACTION");
        assert_eq!(entries[0].data["lock_action"], 1);
        assert_eq!(entries[2].log_type, "LOGGING_ENABLED");
        assert_eq!(entries[2].timestamp, None);
    }

    #[tokio::test]
    async fn test_wrong_pin_is_rejected_with_device_code() {
        let lock = SimulatedLock::new(ADDRESS).with_pin(1234);

        assert!(lock.verify_pin(1234).await.unwrap());
        match lock.verify_pin(9999).await {
            Err(LinkError::Protocol { code }) => assert_eq!(code, BAD_PIN_CODE),
            other => panic!("expected a protocol rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_action_is_rejected() {
        let lock = SimulatedLock::new(ADDRESS);

        match lock.lock_action(42).await {
            Err(LinkError::Protocol { code }) => assert_eq!(code, BAD_PARAMETER_CODE),
            other => panic!("expected a protocol rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_open_reuses_seeded_lock_and_applies_timing() {
        let driver = SimulatedDriver::new();
        let seeded = Arc::new(SimulatedLock::new(ADDRESS));
        driver.add_lock(seeded.clone());
        let config = DeviceConfig {
            retry: Some(3),
            ..DeviceConfig::unpaired(ADDRESS, "aa".repeat(32), "bb".repeat(32))
        };

        let opened = driver.open(&config);

        assert!(Arc::ptr_eq(
            &seeded,
            &driver.lock(ADDRESS).expect("seeded lock present")
        ));
        drop(opened);
        assert_eq!(seeded.timing().unwrap().retry, 3);
    }
}
