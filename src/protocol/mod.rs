//! Wire protocol of the printer's BLE link.
//!
//! The printer speaks a newline-delimited ASCII line protocol over a GATT
//! notify characteristic. Notifications arrive as arbitrarily sized byte
//! fragments, so inbound data goes through three stages:
//!
//! 1. [`line::LineReassembler`] - fragments to complete lines
//! 2. [`frame::Frame`] - lines to typed protocol frames
//! 3. [`crate::session`] - frames to state transitions and model updates
//!
//! Outbound traffic is the fixed command vocabulary in [`command`].

pub mod command;
pub mod frame;
pub mod line;

pub use command::Command;
pub use frame::Frame;
pub use line::LineReassembler;
