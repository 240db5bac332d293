use crate::devices::{LinkError, ScanError};

/// Startup and bootstrap failures. These are fatal: the process reports them
/// and exits rather than serving with a half-built configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No device found during discovery")]
    NoDeviceFound,

    #[error("Multiple candidate devices found: {}", addresses.join(", "))]
    AmbiguousDevice { addresses: Vec<String> },

    #[error("Pairing handshake failed: {0}")]
    PairingFailed(#[from] LinkError),

    #[error("Scanner unavailable: {0}")]
    ScanFailed(#[from] ScanError),

    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to render config file: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("Malformed add-on options: {0}")]
    Options(#[from] serde_json::Error),
}
