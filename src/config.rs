//! Configuration for the lidar bridge
//!
//! Loads configuration from a TOML file with the few parameters the
//! bridge needs: how to detect the device, how to launch the scanner,
//! and how long a stop() may wait on the reader thread.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level bridge configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LidarConfig {
    pub device: DeviceConfig,
    pub process: ProcessConfig,
    pub server: ServerConfig,
}

/// Device detection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// Command that lists serial device identifiers, one per line
    pub list_command: Vec<String>,
    /// Exact identifier the lidar presents in the listing
    pub id: String,
}

/// Scanner process configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessConfig {
    /// Scanner invocation; the first element is the executable path,
    /// the rest are arguments. Production deployments use the bare
    /// path; test harnesses substitute scripted stand-ins.
    pub command: Vec<String>,
}

/// Supervision tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Upper bound in milliseconds on waiting for the reader thread
    /// to exit during stop()
    pub stop_timeout_ms: u64,
}

impl LidarConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: LidarConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Default configuration for the stock CP2102-bridged scanner
    ///
    /// Suitable for testing and development. Production deployments
    /// should use a proper TOML configuration file.
    pub fn cp2102_defaults() -> Self {
        Self {
            device: DeviceConfig {
                list_command: vec!["/bin/ls".to_string(), "/dev/serial/by-id/".to_string()],
                id: "usb-Silicon_Labs_CP2102_USB_to_UART_Bridge_Controller_0001-if00-port0"
                    .to_string(),
            },
            process: ProcessConfig {
                command: vec!["/usr/local/bin/lidar-scanner".to_string()],
            },
            server: ServerConfig {
                stop_timeout_ms: 2000,
            },
        }
    }
}

impl Default for LidarConfig {
    fn default() -> Self {
        Self::cp2102_defaults()
    }
}
