use crate::controller::emulator::EmulatorConnectionMode;
use crate::controller::shim::DEFAULT_SHIM_LIBRARY;
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = "vrcontroller";
const CONFIG_FILE: &str = "controller.toml";

/// Settings of the controller input owner
///
/// Stored as TOML; every field is optional in the file.
///
/// ```toml
/// emulator_connection_mode = "wifi"
/// shim_library = "libgvrunity.so"
/// stick_deadzone = 0.05
/// poll_interval_ms = 16
/// ```
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ControllerInputConfig {
    /// How the editor emulator is reached
    pub emulator_connection_mode: EmulatorConnectionMode,

    /// Native shim library probed on mobile builds
    pub shim_library: String,

    /// Deadzone applied to emulator gamepad sticks (0.0-1.0)
    pub stick_deadzone: f32,

    /// Interval between state reads in the host loop
    pub poll_interval_ms: u64,
}

impl Default for ControllerInputConfig {
    fn default() -> Self {
        Self {
            emulator_connection_mode: EmulatorConnectionMode::Usb,
            shim_library: DEFAULT_SHIM_LIBRARY.to_string(),
            stick_deadzone: 0.05,
            poll_interval_ms: 16, // ~60 Hz
        }
    }
}

impl ControllerInputConfig {
    /// Loads from the user config directory, falling back to defaults when
    /// the file does not exist
    pub async fn load() -> Result<Self> {
        Self::load_from(&default_config_path()).await
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
        {
            warn!(
                "Config file {} does not exist, using default",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read config file: {}", e))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| eyre!("Failed to parse config file: {}", e))?;
        config.validate()?;

        info!("Loaded controller config from {}", path.display());
        debug!("Controller config: {:?}", config);
        Ok(config)
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| eyre!("Failed to serialize controller config: {}", e))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| eyre!("Failed to write config file: {}", e))?;
        info!("Controller config saved to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.stick_deadzone) {
            return Err(eyre!(
                "stick_deadzone must be in [0.0, 1.0), got {}",
                self.stick_deadzone
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(eyre!("poll_interval_ms must be greater than zero"));
        }
        if self.shim_library.is_empty() {
            return Err(eyre!("shim_library must not be empty"));
        }
        Ok(())
    }
}

pub fn default_config_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| {
        warn!("Could not determine config directory, using current directory");
        PathBuf::from(".")
    });
    path.push(CONFIG_DIR);
    path.push(CONFIG_FILE);
    path
}
