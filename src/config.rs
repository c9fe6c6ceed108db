//! Bridge-wide settings.
//!
//! Everything here has a sensible default; the device build overrides the
//! hostname with a chip-id suffix and loads persisted values from NVS at
//! boot.

use std::net::Ipv4Addr;
use std::time::Duration;

/// Default hostname prefix; the device appends its chip id.
pub const DEFAULT_HOSTNAME: &str = "sparkbridge";

/// Runtime configuration for the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Hostname, also used as the access-point SSID.
    pub hostname: String,
    /// Access-point address; also the wildcard DNS answer.
    pub ap_ip: Ipv4Addr,
    /// Access-point subnet mask.
    pub ap_subnet: Ipv4Addr,
    /// How long one station connect attempt may take before the next
    /// candidate is tried.
    pub connection_timeout: Duration,
    /// Printer keep-alive cadence.
    pub keep_alive_interval: Duration,
    /// How long the access point stays up. `None` keeps it up forever.
    pub portal_timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_HOSTNAME.to_string(),
            ap_ip: Ipv4Addr::new(192, 168, 4, 1),
            ap_subnet: Ipv4Addr::new(255, 255, 255, 0),
            connection_timeout: Duration::from_secs(5),
            keep_alive_interval: Duration::from_secs(10),
            portal_timeout: None,
        }
    }
}
