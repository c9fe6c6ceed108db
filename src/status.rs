//! Shared printer status model.
//!
//! This is the single record of what we believe about the printer. It is
//! mutated by the frame dispatcher and the command layer, and read by the
//! HTTP control surface. It carries no BLE state of its own; the session
//! invariant (status is `Disconnected` exactly while the link is below
//! `Connected`) is enforced by [`crate::session`].

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

/// Minimum layer count before the total-time estimate is considered stable.
/// Below this the estimate is reported as zero.
const MIN_LAYERS_FOR_ESTIMATE: i32 = 3;

/// Printer status as derived from the wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrinterStatus {
    /// No active session with the printer.
    Disconnected,
    /// Session established, printer-side handshake in progress.
    Connecting,
    /// Idle and ready for commands.
    Standby,
    /// A file listing is being received.
    FileListing,
    /// Actively printing.
    Printing,
    /// Print paused.
    Paused,
    /// Print completed.
    Finished,
    /// Stop requested, printer winding down.
    Stopping,
    /// No SD card present.
    NoCard,
    /// Firmware update in progress.
    Updating,
}

impl PrinterStatus {
    /// Wire/display name, matching the names the printer UI uses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "DISCONNECTED",
            Self::Connecting => "CONNECTING",
            Self::Standby => "STANDBY",
            Self::FileListing => "FILELIST",
            Self::Printing => "PRINTING",
            Self::Paused => "PAUSE",
            Self::Finished => "FINISHED",
            Self::Stopping => "STOPPING",
            Self::NoCard => "NO_CARD",
            Self::Updating => "UPDATING",
        }
    }
}

impl fmt::Display for PrinterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything we currently believe about the printer.
///
/// Created once at process start and owned by the session; external callers
/// only ever see snapshots.
#[derive(Debug)]
pub struct Printer {
    /// Current status.
    pub status: PrinterStatus,
    /// Layer currently being printed (0 when unknown).
    pub current_layer: i32,
    /// Total layers of the selected file (0 when unknown).
    pub total_layers: i32,
    /// File currently selected on the printer, empty when none.
    pub current_file: String,
    /// File catalog: name -> printer-assigned numeric id.
    pub files: HashMap<String, u16>,
    /// Last `online` heartbeat.
    pub heartbeat: Option<Instant>,
    /// Last keep-alive / status request we sent.
    pub last_status_request: Option<Instant>,
    /// When the current print started.
    pub start_time: Option<Instant>,
    /// When the current print finished.
    pub finish_time: Option<Instant>,
}

impl Printer {
    /// Create a fresh model in the disconnected state.
    pub fn new() -> Self {
        Self {
            status: PrinterStatus::Disconnected,
            current_layer: 0,
            total_layers: 0,
            current_file: String::new(),
            files: HashMap::new(),
            heartbeat: None,
            last_status_request: None,
            start_time: None,
            finish_time: None,
        }
    }

    /// Reset everything learned from the printer. Used on explicit reconnect.
    pub fn reset(&mut self) {
        self.status = PrinterStatus::Disconnected;
        self.current_layer = 0;
        self.total_layers = 0;
        self.current_file.clear();
        self.files.clear();
        self.heartbeat = None;
        self.start_time = None;
        self.finish_time = None;
    }

    /// Record entry into the printing state, keeping the start time across
    /// pause/resume cycles.
    pub fn mark_printing(&mut self, now: Instant) {
        if self.status != PrinterStatus::Printing && self.status != PrinterStatus::Paused {
            self.start_time = Some(now);
            self.finish_time = None;
        }
        self.status = PrinterStatus::Printing;
    }

    /// Elapsed print time in seconds: now minus start, frozen at finish time
    /// once the print completed. Zero when no print was started.
    pub fn print_time_secs(&self, now: Instant) -> u64 {
        let Some(start) = self.start_time else {
            return 0;
        };
        let end = match (self.status, self.finish_time) {
            (PrinterStatus::Finished, Some(finish)) => finish,
            _ => now,
        };
        end.saturating_duration_since(start).as_secs()
    }

    /// Estimated total print time in seconds, extrapolated from layer
    /// progress. Zero until more than `MIN_LAYERS_FOR_ESTIMATE` layers are
    /// done (early estimates are unstable). If the printer misreports the
    /// layer counts (current > total) the estimate is clamped to the elapsed
    /// time instead of shrinking below it.
    pub fn estimated_total_secs(&self, now: Instant) -> u64 {
        if self.current_layer <= MIN_LAYERS_FOR_ESTIMATE || self.total_layers <= 0 {
            return 0;
        }
        let elapsed = self.print_time_secs(now);
        let estimate = elapsed * self.total_layers as u64 / self.current_layer as u64;
        estimate.max(elapsed)
    }

    /// Look up a file id by name.
    pub fn file_id(&self, name: &str) -> Option<u16> {
        self.files.get(name).copied()
    }
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}
