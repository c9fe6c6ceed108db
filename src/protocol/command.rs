//! Outbound command vocabulary and its guard rules.
//!
//! All commands are fixed literal strings, newline-terminated on the wire.
//! Whether a command may be sent depends on the printer's current status;
//! the guard predicates live here so the rules are testable without a
//! session. A command rejected by a guard is silently dropped - the link is
//! fire-and-forget by design and callers get no error channel.

use crate::status::PrinterStatus;

/// Largest relative Z move accepted, in printer units either direction.
pub const MAX_Z_MOVE: i16 = 50;

/// One outbound printer command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Handshake acknowledgement; doubles as the keep-alive probe.
    Handshake,
    /// Request the file listing.
    ListFiles,
    /// Select a file by its catalog id.
    SelectFile(u16),
    /// Start printing the selected file.
    StartPrint,
    /// Stop the running print.
    StopPrint,
    /// Pause the running print.
    PausePrint,
    /// Resume a paused print.
    ResumePrint,
    /// Emergency stop.
    EmergencyStop,
    /// Relative Z move.
    MoveZ(i16),
    /// Home the Z axis.
    Home,
    /// Raw passthrough for diagnostics; sent verbatim.
    Raw(String),
}

impl Command {
    /// Wire encoding, including the line terminator.
    pub fn encode(&self) -> String {
        match self {
            Self::Handshake => "PWD-OK\n".to_string(),
            Self::ListFiles => "scan-file\n".to_string(),
            Self::SelectFile(id) => format!("file-{}\n", id),
            Self::StartPrint => "Start Printing;\n".to_string(),
            Self::StopPrint => "Stop Printing;\n".to_string(),
            Self::PausePrint => "Pause Printing;\n".to_string(),
            Self::ResumePrint => "Keep Printing;\n".to_string(),
            Self::EmergencyStop => "Emergency;\n".to_string(),
            Self::MoveZ(delta) => format!("G1 Z{};\n", delta),
            Self::Home => "G28 Z0;\n".to_string(),
            Self::Raw(cmd) => format!("{}\n", cmd),
        }
    }

    /// Whether the command's parameters are acceptable at all.
    ///
    /// Only `MoveZ` carries a parameter worth checking: zero deltas are
    /// pointless and large ones risk crashing the build plate.
    pub fn well_formed(&self) -> bool {
        match self {
            Self::MoveZ(delta) => *delta != 0 && delta.abs() <= MAX_Z_MOVE,
            _ => true,
        }
    }

    /// Whether the command may be sent while the printer reports `status`.
    pub fn allowed_from(&self, status: PrinterStatus) -> bool {
        use PrinterStatus::*;
        match self {
            // Session plumbing and diagnostics are not status-gated.
            Self::Handshake | Self::ListFiles | Self::SelectFile(_) | Self::Raw(_) => true,
            // The emergency stop must always get through.
            Self::EmergencyStop => true,
            Self::StartPrint => matches!(status, Standby | Finished),
            Self::StopPrint => matches!(status, Printing | Paused),
            Self::PausePrint => matches!(status, Printing),
            Self::ResumePrint => matches!(status, Paused),
            Self::MoveZ(_) | Self::Home => matches!(status, Standby | Finished | Paused),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PrinterStatus::*;

    // ==================== Encoding Tests ====================

    #[test]
    fn test_encodings() {
        assert_eq!(Command::Handshake.encode(), "PWD-OK\n");
        assert_eq!(Command::ListFiles.encode(), "scan-file\n");
        assert_eq!(Command::SelectFile(12).encode(), "file-12\n");
        assert_eq!(Command::StartPrint.encode(), "Start Printing;\n");
        assert_eq!(Command::StopPrint.encode(), "Stop Printing;\n");
        assert_eq!(Command::PausePrint.encode(), "Pause Printing;\n");
        assert_eq!(Command::ResumePrint.encode(), "Keep Printing;\n");
        assert_eq!(Command::EmergencyStop.encode(), "Emergency;\n");
        assert_eq!(Command::Home.encode(), "G28 Z0;\n");
    }

    #[test]
    fn test_move_encoding_keeps_sign() {
        assert_eq!(Command::MoveZ(40).encode(), "G1 Z40;\n");
        assert_eq!(Command::MoveZ(-5).encode(), "G1 Z-5;\n");
    }

    #[test]
    fn test_raw_passthrough() {
        assert_eq!(Command::Raw("G28 Z0;".to_string()).encode(), "G28 Z0;\n");
    }

    // ==================== Well-formedness Tests ====================

    #[test]
    fn test_move_bounds() {
        assert!(!Command::MoveZ(0).well_formed());
        assert!(Command::MoveZ(1).well_formed());
        assert!(Command::MoveZ(50).well_formed());
        assert!(!Command::MoveZ(51).well_formed());
        assert!(Command::MoveZ(-50).well_formed());
        assert!(!Command::MoveZ(-51).well_formed());
    }

    #[test]
    fn test_other_commands_always_well_formed() {
        assert!(Command::Handshake.well_formed());
        assert!(Command::StartPrint.well_formed());
        assert!(Command::Raw(String::new()).well_formed());
    }

    // ==================== Guard Tests ====================

    #[test]
    fn test_start_print_guard() {
        assert!(Command::StartPrint.allowed_from(Standby));
        assert!(Command::StartPrint.allowed_from(Finished));
        assert!(!Command::StartPrint.allowed_from(Paused));
        assert!(!Command::StartPrint.allowed_from(Printing));
        assert!(!Command::StartPrint.allowed_from(Disconnected));
    }

    #[test]
    fn test_pause_resume_guards() {
        assert!(Command::PausePrint.allowed_from(Printing));
        assert!(!Command::PausePrint.allowed_from(Paused));
        assert!(Command::ResumePrint.allowed_from(Paused));
        assert!(!Command::ResumePrint.allowed_from(Printing));
    }

    #[test]
    fn test_stop_guard() {
        assert!(Command::StopPrint.allowed_from(Printing));
        assert!(Command::StopPrint.allowed_from(Paused));
        assert!(!Command::StopPrint.allowed_from(Standby));
    }

    #[test]
    fn test_move_and_home_guards() {
        for status in [Standby, Finished, Paused] {
            assert!(Command::MoveZ(10).allowed_from(status));
            assert!(Command::Home.allowed_from(status));
        }
        for status in [Printing, Disconnected, Stopping, NoCard, Updating] {
            assert!(!Command::MoveZ(10).allowed_from(status));
            assert!(!Command::Home.allowed_from(status));
        }
    }

    #[test]
    fn test_emergency_always_allowed() {
        for status in [Disconnected, Printing, Updating, NoCard] {
            assert!(Command::EmergencyStop.allowed_from(status));
        }
    }
}
