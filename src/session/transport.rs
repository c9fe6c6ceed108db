//! Transport capability interface for the printer link.
//!
//! The session state machine is written against this small trait instead of
//! the NimBLE API directly, so the discovery/handshake/keep-alive logic can
//! be driven by a mock on the host. The real BLE binding lives in
//! [`crate::session::ble`] (esp32 feature).

use std::fmt;

/// Errors from the transport-level connect sequence.
///
/// All of these are recoverable: the session reacts by returning to
/// scanning, never by failing the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// No discovered device to connect to.
    NoDevice,
    /// The transport-level connect itself failed.
    ConnectFailed,
    /// A required GATT service is absent on the peer.
    ServiceMissing(&'static str),
    /// A required characteristic is absent on the peer.
    CharacteristicMissing(&'static str),
    /// The inbound characteristic does not support notifications.
    NotifyUnsupported,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDevice => write!(f, "no device discovered"),
            Self::ConnectFailed => write!(f, "transport connect failed"),
            Self::ServiceMissing(which) => write!(f, "service missing: {}", which),
            Self::CharacteristicMissing(which) => {
                write!(f, "characteristic missing: {}", which)
            }
            Self::NotifyUnsupported => write!(f, "notify characteristic cannot notify"),
        }
    }
}

impl std::error::Error for LinkError {}

/// What the session needs from a wireless link.
///
/// Implementations own the radio handles. `teardown` must invalidate the
/// write handle before anything else so a late notification observing the
/// transport sees the session as already dead.
pub trait LinkTransport {
    /// Kick off (or re-arm) a scan for the printer's advertisement.
    fn start_scan(&mut self);

    /// Connect to the most recently discovered device and resolve the
    /// notify and write characteristics, registering the notify
    /// subscription.
    fn connect(&mut self) -> Result<(), LinkError>;

    /// Best-effort write to the outbound characteristic. Returns `false`
    /// when no write handle is present; the data is then dropped.
    fn write(&mut self, data: &[u8]) -> bool;

    /// Whether an outbound write handle is currently resolved.
    fn has_writer(&self) -> bool;

    /// Drop all transport handles and close any open connection.
    fn teardown(&mut self);
}
