//! HSM configuration
//!
//! Loaded from a JSON file and then overridden by environment variables.
//! The file is looked up at an explicit path, else `$HSM_SIM_CONFIG`, else
//! `~/.hsm-sim/config.json`.
//!
//! ```json
//! {
//!   "lmk": "00112233445566778899AABBCCDDEEFF",
//!   "lmkId": "00",
//!   "serialNumber": "PMSIM000001",
//!   "maxKeys": 1000
//! }
//! ```
//!
//! There is no default LMK: it must come from the file or `HSM_LMK`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::keys::Lmk;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "HSM_SIM_CONFIG";

const DEFAULT_CONFIG_DIR: &str = ".hsm-sim";
const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no LMK configured (set \"lmk\" in the config file or HSM_LMK)")]
    MissingLmk,

    #[error("invalid LMK: {0}")]
    InvalidLmk(String),

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

/// HSM identity and key hierarchy settings
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HsmConfig {
    /// LMK as hex (16, 24 or 32 bytes)
    pub lmk: Option<String>,
    pub lmk_id: String,
    pub firmware_version: String,
    pub serial_number: String,
    /// Operating mode reported by the status command
    pub mode: String,
    /// Capacity of the key store
    pub max_keys: usize,
}

impl Default for HsmConfig {
    fn default() -> Self {
        Self {
            lmk: None,
            lmk_id: "00".to_string(),
            firmware_version: "PED-SIM-1.0.0".to_string(),
            serial_number: "PMSIM000001".to_string(),
            mode: "AUTHORIZED".to_string(),
            max_keys: 1000,
        }
    }
}

impl HsmConfig {
    /// Default config file location
    fn default_config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::home_dir().map(|home| home.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE))
    }

    /// Load configuration
    ///
    /// An explicit `path` must exist. The default locations may be absent, in
    /// which case built-in defaults are used. Environment overrides are
    /// applied last.
    pub fn load(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Read a JSON config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Apply `HSM_*` overrides using `lookup` to read variables
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(lmk) = lookup("HSM_LMK") {
            self.lmk = Some(lmk);
        }
        if let Some(value) = lookup("HSM_LMK_ID") {
            self.lmk_id = value;
        }
        if let Some(value) = lookup("HSM_FIRMWARE_VERSION") {
            self.firmware_version = value;
        }
        if let Some(value) = lookup("HSM_SERIAL_NUMBER") {
            self.serial_number = value;
        }
        if let Some(value) = lookup("HSM_MODE") {
            self.mode = value;
        }
        if let Some(value) = lookup("HSM_MAX_KEYS") {
            self.max_keys = value.parse().map_err(|_| ConfigError::InvalidValue {
                field: "maxKeys",
                value,
            })?;
        }
        Ok(())
    }

    /// Build the LMK from the configured hex value
    pub fn lmk(&self) -> Result<Lmk, ConfigError> {
        let encoded = self.lmk.as_deref().ok_or(ConfigError::MissingLmk)?;
        let bytes = Zeroizing::new(
            hex::decode(encoded.trim())
                .map_err(|_| ConfigError::InvalidLmk("not valid hex".to_string()))?,
        );
        Lmk::new(&bytes).map_err(|e| ConfigError::InvalidLmk(e.to_string()))
    }
}

impl fmt::Debug for HsmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HsmConfig")
            .field("lmk", &self.lmk.as_ref().map(|_| "<redacted>"))
            .field("lmk_id", &self.lmk_id)
            .field("firmware_version", &self.firmware_version)
            .field("serial_number", &self.serial_number)
            .field("mode", &self.mode)
            .field("max_keys", &self.max_keys)
            .finish()
    }
}
