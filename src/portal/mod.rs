//! WiFi provisioning and the captive configuration portal.
//!
//! The bridge always raises its own access point first so it can be
//! configured, then joins a known network when one is visible. While the
//! access point is up, a wildcard DNS responder steers every hostname to
//! the portal's HTTP surface.

pub mod bootstrap;
pub mod credentials;
pub mod dns;
pub mod http;

#[cfg(feature = "esp32")]
pub mod storage;
#[cfg(feature = "esp32")]
pub mod wifi;

pub use bootstrap::{BootstrapState, NetworkBootstrap, RadioControl, RadioError, ScanNetwork};
pub use credentials::{Credential, CredentialError, CredentialStore};
pub use dns::DnsRedirect;
pub use http::ControlServer;
