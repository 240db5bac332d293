pub mod options;
pub mod settings;

pub use options::{AddonOptions, ADDON_CONF_FILE_NAME};
pub use settings::{DeviceConfig, DeviceTiming, Pairing, Server, Settings, CONF_FILE_NAME};
