//! Device presence check
//!
//! Shells out to a host device-listing command and scans its output for
//! the exact identifier the lidar presents. A failing listing command is
//! indistinguishable from an absent device and degrades to "not
//! connected"; the check never propagates an error.

use std::process::Command;

/// Checks whether the expected lidar device is present on the host
#[derive(Debug, Clone)]
pub struct ConnectivityChecker {
    list_command: Vec<String>,
    device_id: String,
}

impl ConnectivityChecker {
    /// Create a checker for a listing command and an exact identifier
    pub fn new(list_command: Vec<String>, device_id: String) -> Self {
        Self {
            list_command,
            device_id,
        }
    }

    /// Run the listing command and look for the device identifier.
    ///
    /// Returns `true` on the first exactly-matching output line; `false`
    /// when there is no match or the command itself fails.
    pub fn is_connected(&self) -> bool {
        let Some((program, args)) = self.list_command.split_first() else {
            log::warn!("Device listing command is empty");
            return false;
        };

        let output = match Command::new(program).args(args).output() {
            Ok(output) => output,
            Err(e) => {
                log::warn!("Device listing command {:?} failed: {}", program, e);
                return false;
            }
        };

        String::from_utf8_lossy(&output.stdout)
            .lines()
            .any(|line| line == self.device_id)
    }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;

    const DEVICE_ID: &str = "usb-Test_Lidar_0001-if00-port0";

    fn checker(list_command: Vec<&str>) -> ConnectivityChecker {
        ConnectivityChecker::new(
            list_command.into_iter().map(String::from).collect(),
            DEVICE_ID.to_string(),
        )
    }

    #[test]
    fn test_device_present() {
        assert!(checker(vec!["/bin/echo", DEVICE_ID]).is_connected());
    }

    #[test]
    fn test_match_is_exact() {
        assert!(!checker(vec!["/bin/echo", "usb-Test_Lidar_0001"]).is_connected());
        assert!(!checker(vec!["/bin/echo", " usb-Test_Lidar_0001-if00-port0"]).is_connected());
    }

    #[test]
    fn test_multiline_listing() {
        let listing = format!("some-other-device\n{}\nthird-device", DEVICE_ID);
        assert!(checker(vec!["/bin/echo", &listing]).is_connected());
    }

    #[test]
    fn test_listing_command_failure_degrades_to_false() {
        assert!(!checker(vec!["/nonexistent/listing-command"]).is_connected());
        assert!(!checker(vec!["/bin/false"]).is_connected());
        assert!(!checker(vec![]).is_connected());
    }
}
