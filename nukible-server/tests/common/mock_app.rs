use std::sync::Arc;

use axum::Router;

use nukible_api::models::DeviceType;
use nukible_server::app::create_app;
use nukible_server::configs::{DeviceConfig, Server, Settings};
use nukible_server::devices::{
    DeviceDriver, DeviceRegistry, LockDevice, SimulatedDriver, SimulatedLock, SimulatedScanner,
};

pub const TEST_TOKEN: &str = "3f9c71d24a86e05b3f9c71d24a86e05b3f9c71d24a86e05b3f9c71d24a86e05b";
pub const TEST_ADDRESS: &str = "54:D2:72:1A:2B:3C";
pub const TEST_NUKI_ID: u32 = 0x1a2b3c;
pub const TEST_PIN: u16 = 1234;

pub struct MockApp {
    pub settings: Arc<Settings>,
    pub driver: Arc<SimulatedDriver>,
    pub registry: Arc<DeviceRegistry>,
    pub router: Router,
    pub token: String,
}

impl MockApp {
    /// Bridge with one paired smartlock, reachable and idle.
    pub async fn new() -> Self {
        let driver = Arc::new(SimulatedDriver::new());
        driver.add_lock(Arc::new(SimulatedLock::new(TEST_ADDRESS).with_pin(TEST_PIN)));

        Self::build(driver, vec![paired_config()]).await
    }

    /// Bridge with an empty device table.
    pub async fn without_devices() -> Self {
        Self::build(Arc::new(SimulatedDriver::new()), Vec::new()).await
    }

    async fn build(driver: Arc<SimulatedDriver>, devices: Vec<DeviceConfig>) -> Self {
        let settings = Arc::new(Settings {
            server: Server {
                host: "127.0.0.1".to_string(),
                port: 0,
                name: "nukible-test".to_string(),
                app_id: 0x0070_f8d2,
                token: TEST_TOKEN.to_string(),
            },
            pairing: None,
            smartlock: devices,
        });

        let registry = Arc::new(DeviceRegistry::new(driver.scanner()));
        for config in &settings.smartlock {
            let link = driver.open(config);
            registry
                .register(Arc::new(LockDevice::new(config.clone(), link)))
                .await;
        }

        let router = create_app(&settings, registry.clone()).await;

        Self {
            settings,
            driver,
            registry,
            router,
            token: TEST_TOKEN.to_string(),
        }
    }

    /// The simulated lock behind the default paired device.
    pub fn sim_lock(&self) -> Arc<SimulatedLock> {
        self.driver.lock(TEST_ADDRESS).expect("device is seeded")
    }

    pub fn scanner(&self) -> Arc<SimulatedScanner> {
        self.driver.scanner_handle()
    }

    /// The registry-side handle of the default paired device.
    pub async fn device(&self) -> Arc<LockDevice> {
        self.registry
            .by_nuki_id(TEST_NUKI_ID)
            .await
            .expect("device is registered")
    }
}

fn paired_config() -> DeviceConfig {
    DeviceConfig {
        address: TEST_ADDRESS.to_string(),
        nuki_id: Some(TEST_NUKI_ID),
        name: Some("Front Door".to_string()),
        device_type: Some(DeviceType::Smartlock),
        bridge_public_key: "aa".repeat(32),
        bridge_private_key: "bb".repeat(32),
        nuki_public_key: Some("cc".repeat(32)),
        auth_id: Some("0d0e0f10".to_string()),
        retry: Some(5),
        connection_timeout: Some(10),
        command_timeout: Some(30),
    }
}
