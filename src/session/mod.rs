//! Printer link session state machine.
//!
//! Drives discovery, connection, handshake and keep-alive for the printer's
//! BLE link, and translates the inbound line protocol into status model
//! updates. The machine is platform-independent: the radio sits behind
//! [`LinkTransport`] and time is passed in explicitly, so the whole thing
//! runs under test on the host.
//!
//! # State flow
//!
//! ```text
//! Idle -> Scanning -> Found -> Connecting -> Connected -> Handshaking
//!                                                      -> ListingFiles -> Online
//! ```
//!
//! Any state at `Connected` or above falls back to `Scanning` on a
//! transport disconnect; every failure path lands in a well-defined state
//! and nothing here is fatal to the process.

mod transport;

#[cfg(feature = "esp32")]
pub mod ble;

pub use transport::{LinkError, LinkTransport};

use crate::protocol::{Command, Frame, LineReassembler};
use crate::status::{Printer, PrinterStatus};
use log::{debug, info, warn};
use std::time::{Duration, Instant};

/// How often the scan is re-armed while no printer has been found.
pub const SCAN_REARM_INTERVAL: Duration = Duration::from_secs(5);

/// Default keep-alive / status request interval.
pub const DEFAULT_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(10);

/// Session state, ordered: everything at `Connected` or above holds live
/// transport handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    /// Not scanning, not connected.
    Idle,
    /// Scanning for the printer's advertisement.
    Scanning,
    /// Advertisement seen; connect pending.
    Found,
    /// Transport connect in progress.
    Connecting,
    /// Characteristics resolved, waiting for the handshake challenge.
    Connected,
    /// Handshake challenge received, acknowledgement pending.
    Handshaking,
    /// File listing request pending.
    ListingFiles,
    /// Steady state.
    Online,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Scanning => "SCANNING",
            Self::Found => "FOUND",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
            Self::Handshaking => "HANDSHAKING",
            Self::ListingFiles => "LISTING_FILES",
            Self::Online => "ONLINE",
        }
    }
}

/// The printer link session.
///
/// Owns the transport, the status model and the line reassembler. One
/// instance lives for the process lifetime; the control loop calls
/// [`tick`](Session::tick) every iteration and forwards transport events.
pub struct Session<T: LinkTransport> {
    transport: T,
    state: SessionState,
    printer: Printer,
    lines: LineReassembler,
    keep_alive_interval: Duration,
    /// When the scan was last (re-)armed.
    last_scan: Option<Instant>,
}

impl<T: LinkTransport> Session<T> {
    /// Create an idle session.
    pub fn new(transport: T, keep_alive_interval: Duration) -> Self {
        Self {
            transport,
            state: SessionState::Idle,
            printer: Printer::new(),
            lines: LineReassembler::new(),
            keep_alive_interval,
            last_scan: None,
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Read access to the status model.
    pub fn printer(&self) -> &Printer {
        &self.printer
    }

    /// Read access to the transport, for draining its event queue.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable transport access, for drivers whose event drain needs it.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // ==================== Public contract ====================

    /// Reset the model and begin scanning for the printer.
    pub fn connect(&mut self) {
        info!("session: reconnect requested");
        self.transport.teardown();
        self.printer.reset();
        self.lines.clear();
        self.state = SessionState::Scanning;
        self.last_scan = None;
    }

    /// Force the session idle. Handles are invalidated before the state
    /// write so a racing notification sees a dead transport.
    pub fn disconnect(&mut self) {
        info!("session: disconnect requested");
        self.transport.teardown();
        self.state = SessionState::Idle;
        self.printer.status = PrinterStatus::Disconnected;
    }

    /// Best-effort raw write; silently dropped when not connected.
    pub fn send(&mut self, cmd: &Command) {
        self.write(cmd);
    }

    /// Send a status request immediately, independent of the timer.
    pub fn request_status(&mut self, now: Instant) {
        if self.write(&Command::Handshake) {
            self.printer.last_status_request = Some(now);
        }
    }

    /// Print a file by catalog name. Dropped entirely when the name is not
    /// in the catalog or the printer is not ready.
    pub fn print(&mut self, name: &str) {
        if !Command::StartPrint.allowed_from(self.printer.status) {
            debug!("print rejected in status {}", self.printer.status);
            return;
        }
        let Some(id) = self.printer.file_id(name) else {
            warn!("print: unknown file {:?}", name);
            return;
        };
        self.write(&Command::SelectFile(id));
        self.write(&Command::StartPrint);
    }

    /// Stop the running print.
    pub fn stop_print(&mut self) {
        self.guarded(Command::StopPrint);
    }

    /// Pause the running print.
    pub fn pause_print(&mut self) {
        self.guarded(Command::PausePrint);
    }

    /// Resume a paused print.
    pub fn resume_print(&mut self) {
        self.guarded(Command::ResumePrint);
    }

    /// Emergency stop; not status-gated.
    pub fn emergency_stop(&mut self) {
        self.guarded(Command::EmergencyStop);
    }

    /// Relative Z move; no-op for zero or out-of-range deltas.
    pub fn move_z(&mut self, delta: i16) {
        self.guarded(Command::MoveZ(delta));
    }

    /// Home the Z axis.
    pub fn home(&mut self) {
        self.guarded(Command::Home);
    }

    // ==================== Transport events ====================

    /// A scan result matched the printer's service identifier.
    pub fn on_advertisement(&mut self) {
        if self.state == SessionState::Scanning {
            info!("printer advertisement found");
            self.state = SessionState::Found;
        }
    }

    /// The transport reported a disconnect.
    pub fn on_disconnect(&mut self) {
        info!("link disconnected");
        self.transport.teardown();
        if self.state != SessionState::Idle {
            self.state = SessionState::Scanning;
            // Rescan right away on the next tick.
            self.last_scan = None;
        }
        self.printer.status = PrinterStatus::Disconnected;
    }

    /// Inbound notification bytes from the transport.
    pub fn on_notify(&mut self, data: &[u8], now: Instant) {
        // Guard against acting on a stale session: a notification that
        // arrives after teardown finds no write handle and must not touch
        // the model.
        if !self.transport.has_writer() {
            if self.state != SessionState::Idle {
                self.state = SessionState::Scanning;
            }
            return;
        }
        for line in self.lines.push(data) {
            let frame = Frame::parse(&line);
            self.apply_frame(frame, now);
        }
    }

    // ==================== Control loop ====================

    /// Advance the state machine. Call once per control loop iteration.
    pub fn tick(&mut self, now: Instant) {
        match self.state {
            SessionState::Idle | SessionState::Connecting | SessionState::Connected => {}

            SessionState::Scanning => {
                let rearm_due = match self.last_scan {
                    Some(at) => now.saturating_duration_since(at) >= SCAN_REARM_INTERVAL,
                    None => true,
                };
                if rearm_due {
                    debug!("re-arming scan");
                    self.printer.status = PrinterStatus::Disconnected;
                    self.printer.files.clear();
                    self.transport.start_scan();
                    self.last_scan = Some(now);
                }
            }

            SessionState::Found => {
                self.state = SessionState::Connecting;
                match self.transport.connect() {
                    Ok(()) => {
                        info!("link established");
                        self.state = SessionState::Connected;
                        self.lines.clear();
                        // Grace period before the first keep-alive.
                        self.printer.last_status_request = Some(now);
                    }
                    Err(e) => {
                        // Never retry the same address in place; go back to
                        // scanning and find the printer again.
                        warn!("connect failed: {}", e);
                        self.transport.teardown();
                        self.state = SessionState::Scanning;
                        self.last_scan = None;
                    }
                }
            }

            SessionState::Handshaking => {
                debug!("sending handshake acknowledgement");
                self.write(&Command::Handshake);
                self.printer.last_status_request = Some(now);
                self.state = SessionState::ListingFiles;
            }

            SessionState::ListingFiles => {
                debug!("requesting file listing");
                self.printer.status = PrinterStatus::FileListing;
                self.printer.files.clear();
                self.write(&Command::ListFiles);
                self.state = SessionState::Online;
            }

            SessionState::Online => {}
        }

        self.tick_keep_alive(now);
    }

    /// Periodic keep-alive while the link is up.
    fn tick_keep_alive(&mut self, now: Instant) {
        if self.state < SessionState::Connected {
            return;
        }
        let due = match self.printer.last_status_request {
            Some(at) => now.saturating_duration_since(at) > self.keep_alive_interval,
            None => true,
        };
        if !due {
            return;
        }
        if !self.transport.has_writer() {
            // Write handle vanished under us: treat the session as broken
            // instead of retrying in place.
            warn!("keep-alive with no write handle, dropping session");
            self.transport.teardown();
            self.state = SessionState::Scanning;
            self.printer.status = PrinterStatus::Disconnected;
            return;
        }
        debug!("sending keep-alive");
        self.write(&Command::Handshake);
        self.printer.last_status_request = Some(now);
    }

    // ==================== Internals ====================

    /// Write a command when the link is up; `false` means it was dropped.
    fn write(&mut self, cmd: &Command) -> bool {
        if self.state < SessionState::Connected {
            return false;
        }
        self.transport.write(cmd.encode().as_bytes())
    }

    /// Apply the well-formedness and status guards, then write.
    fn guarded(&mut self, cmd: Command) {
        if !cmd.well_formed() {
            debug!("command rejected (malformed): {:?}", cmd);
            return;
        }
        if !cmd.allowed_from(self.printer.status) {
            debug!(
                "command rejected in status {}: {:?}",
                self.printer.status, cmd
            );
            return;
        }
        self.write(&cmd);
    }

    /// One complete inbound frame to a model update and/or transition.
    fn apply_frame(&mut self, frame: Frame, now: Instant) {
        match frame {
            Frame::Online => {
                self.printer.heartbeat = Some(now);
            }
            Frame::Handshake => {
                if self.state < SessionState::Handshaking {
                    info!("handshake challenge received");
                    self.state = SessionState::Handshaking;
                    self.printer.status = PrinterStatus::Connecting;
                }
            }
            Frame::SelectedFile(name) => {
                debug!("selected file: {}", name);
                self.printer.current_file = name;
            }
            Frame::FileEntry { name, id } => {
                debug!("file list: #{} {}", id, name);
                self.printer.files.insert(name, id);
            }
            Frame::Progress { current, total } => {
                self.printer.current_layer = current;
                self.printer.total_layers = total;
            }
            Frame::Standby => {
                let had_no_card = self.printer.status == PrinterStatus::NoCard;
                self.printer.status = PrinterStatus::Standby;
                if had_no_card {
                    // The card came back; the old catalog is stale.
                    info!("card reinserted, re-listing files");
                    self.printer.files.clear();
                    self.write(&Command::ListFiles);
                }
            }
            Frame::Printing | Frame::PauseOver => {
                self.printer.mark_printing(now);
            }
            Frame::Paused => {
                self.printer.status = PrinterStatus::Paused;
            }
            Frame::Stopping => {
                self.printer.status = PrinterStatus::Stopping;
            }
            Frame::Finished => {
                self.printer.status = PrinterStatus::Finished;
                self.printer.finish_time = Some(now);
            }
            Frame::Updating => {
                self.printer.status = PrinterStatus::Updating;
            }
            Frame::NoCard => {
                self.printer.status = PrinterStatus::NoCard;
                self.printer.files.clear();
            }
            Frame::ScanFinish => {
                debug!("file listing complete ({} files)", self.printer.files.len());
            }
            Frame::Ack => {}
            Frame::Unknown(line) => {
                debug!("unknown frame: {:?}", line);
            }
        }
    }
}
