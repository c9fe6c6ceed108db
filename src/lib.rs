//! SparkMaker printer bridge firmware library.
//!
//! This library contains the platform-independent components: the printer
//! protocol, the link session state machine, the status model and the
//! provisioning portal logic. All of it runs under test on the host; the
//! ESP32 radio bindings are gated behind the `esp32` feature.

pub mod config;
pub mod portal;
pub mod protocol;
pub mod session;
pub mod status;

// Re-export commonly used items
pub use config::Settings;
pub use portal::{BootstrapState, CredentialStore, NetworkBootstrap};
pub use protocol::{Command, Frame, LineReassembler};
pub use session::{LinkTransport, Session, SessionState};
pub use status::{Printer, PrinterStatus};
