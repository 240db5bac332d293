use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

pub const ADDON_CONF_FILE_NAME: &str = "options.json";

/// Timing knobs exposed through the supervisor's add-on options file.
/// Absent file or absent keys simply mean "no override".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonOptions {
    #[serde(default)]
    pub retry: Option<u32>,
    #[serde(default)]
    pub connection_timeout: Option<u64>,
    #[serde(default)]
    pub command_timeout: Option<u64>,
}

impl AddonOptions {
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(ADDON_CONF_FILE_NAME);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}
