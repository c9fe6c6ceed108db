//! Typed frames of the inbound line protocol.
//!
//! Each complete line maps to exactly one [`Frame`] variant via fixed-prefix
//! or exact-token matching. The patterns are mutually exclusive, so match
//! order carries no meaning. Parsing never fails: lines that match no
//! pattern become [`Frame::Unknown`] and numeric fields that fail to parse
//! degrade to zero - the stream comes from the printer and is best-effort,
//! not trusted.
//!
//! # Example
//!
//! ```
//! use sparkbridge::protocol::Frame;
//!
//! assert_eq!(
//!     Frame::parse("F/S=3/120"),
//!     Frame::Progress { current: 3, total: 120 }
//! );
//! ```

/// One parsed inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Heartbeat, sent by the printer while the session is alive.
    Online,
    /// `P-*` handshake challenge.
    Handshake,
    /// `pf_<name>`: file currently selected on the printer.
    SelectedFile(String),
    /// `f-<name>.<id>`: one entry of the file listing.
    FileEntry { name: String, id: u16 },
    /// `F/S=<current>/<total>`: layer progress.
    Progress { current: i32, total: i32 },
    /// `standby_sts`
    Standby,
    /// `printing_sts`
    Printing,
    /// `pause_sts`
    Paused,
    /// `pause-over`: print resumed.
    PauseOver,
    /// `stop_sts`
    Stopping,
    /// `printo_sts`: print finished.
    Finished,
    /// `nocard_sts`: no SD card.
    NoCard,
    /// `scan-finish`: end-of-listing marker.
    ScanFinish,
    /// `update_sts`: firmware update.
    Updating,
    /// `OK` acknowledgement.
    Ack,
    /// Anything else; logged and dropped by the dispatcher.
    Unknown(String),
}

impl Frame {
    /// Parse one complete line (terminator already stripped).
    pub fn parse(line: &str) -> Self {
        match line {
            "online" => return Self::Online,
            "standby_sts" => return Self::Standby,
            "printing_sts" => return Self::Printing,
            "pause_sts" => return Self::Paused,
            "pause-over" => return Self::PauseOver,
            "stop_sts" => return Self::Stopping,
            "printo_sts" => return Self::Finished,
            "nocard_sts" => return Self::NoCard,
            "scan-finish" => return Self::ScanFinish,
            "update_sts" => return Self::Updating,
            "OK" => return Self::Ack,
            _ => {}
        }

        if line.starts_with("P-") {
            return Self::Handshake;
        }
        if let Some(name) = line.strip_prefix("pf_") {
            return Self::SelectedFile(name.to_string());
        }
        if let Some(entry) = line.strip_prefix("f-") {
            // The id follows the last dot; names may contain dots themselves.
            // A dotless entry still names a file and keeps id 0.
            let (name, id) = match entry.rsplit_once('.') {
                Some((name, id)) => (name, id.parse().unwrap_or(0)),
                None => (entry, 0),
            };
            return Self::FileEntry {
                name: name.to_string(),
                id,
            };
        }
        if let Some(progress) = line.strip_prefix("F/S=") {
            let (current, total) = match progress.split_once('/') {
                Some((cur, tot)) => (cur.parse().unwrap_or(0), tot.parse().unwrap_or(0)),
                None => (progress.parse().unwrap_or(0), 0),
            };
            return Self::Progress { current, total };
        }

        Self::Unknown(line.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Exact Token Tests ====================

    #[test]
    fn test_exact_tokens() {
        assert_eq!(Frame::parse("online"), Frame::Online);
        assert_eq!(Frame::parse("standby_sts"), Frame::Standby);
        assert_eq!(Frame::parse("printing_sts"), Frame::Printing);
        assert_eq!(Frame::parse("pause_sts"), Frame::Paused);
        assert_eq!(Frame::parse("pause-over"), Frame::PauseOver);
        assert_eq!(Frame::parse("stop_sts"), Frame::Stopping);
        assert_eq!(Frame::parse("printo_sts"), Frame::Finished);
        assert_eq!(Frame::parse("nocard_sts"), Frame::NoCard);
        assert_eq!(Frame::parse("scan-finish"), Frame::ScanFinish);
        assert_eq!(Frame::parse("update_sts"), Frame::Updating);
        assert_eq!(Frame::parse("OK"), Frame::Ack);
    }

    #[test]
    fn test_tokens_are_case_sensitive() {
        assert_eq!(
            Frame::parse("ONLINE"),
            Frame::Unknown("ONLINE".to_string())
        );
        assert_eq!(Frame::parse("ok"), Frame::Unknown("ok".to_string()));
    }

    // ==================== Prefix Pattern Tests ====================

    #[test]
    fn test_handshake_prefix() {
        assert_eq!(Frame::parse("P-ABC123"), Frame::Handshake);
        assert_eq!(Frame::parse("P-"), Frame::Handshake);
    }

    #[test]
    fn test_selected_file() {
        assert_eq!(
            Frame::parse("pf_cube.stl"),
            Frame::SelectedFile("cube.stl".to_string())
        );
        assert_eq!(Frame::parse("pf_"), Frame::SelectedFile(String::new()));
    }

    #[test]
    fn test_file_entry() {
        assert_eq!(
            Frame::parse("f-cube.12"),
            Frame::FileEntry {
                name: "cube".to_string(),
                id: 12
            }
        );
    }

    #[test]
    fn test_file_entry_name_with_dots() {
        // Id comes from the last dot; earlier dots belong to the name.
        assert_eq!(
            Frame::parse("f-tower.v2.7"),
            Frame::FileEntry {
                name: "tower.v2".to_string(),
                id: 7
            }
        );
    }

    #[test]
    fn test_file_entry_non_numeric_id_degrades_to_zero() {
        assert_eq!(
            Frame::parse("f-cube.stl"),
            Frame::FileEntry {
                name: "cube".to_string(),
                id: 0
            }
        );
    }

    #[test]
    fn test_file_entry_without_dot_gets_id_zero() {
        assert_eq!(
            Frame::parse("f-noext"),
            Frame::FileEntry {
                name: "noext".to_string(),
                id: 0
            }
        );
    }

    #[test]
    fn test_progress() {
        assert_eq!(
            Frame::parse("F/S=3/120"),
            Frame::Progress {
                current: 3,
                total: 120
            }
        );
    }

    #[test]
    fn test_progress_non_numeric_degrades_to_zero() {
        assert_eq!(
            Frame::parse("F/S=x/120"),
            Frame::Progress {
                current: 0,
                total: 120
            }
        );
        assert_eq!(
            Frame::parse("F/S=3/"),
            Frame::Progress {
                current: 3,
                total: 0
            }
        );
        assert_eq!(
            Frame::parse("F/S="),
            Frame::Progress {
                current: 0,
                total: 0
            }
        );
    }

    #[test]
    fn test_unknown_line() {
        assert_eq!(
            Frame::parse("garbage"),
            Frame::Unknown("garbage".to_string())
        );
        assert_eq!(Frame::parse(""), Frame::Unknown(String::new()));
    }
}
