//! Line reassembly for fragmented BLE notifications.
//!
//! The transport delivers the printer's line protocol in arbitrary chunks:
//! a single notification may carry half a line, one line, or several. The
//! reassembler keeps one fixed-capacity append buffer and yields every
//! complete newline-terminated line.
//!
//! When a line exceeds the buffer capacity the buffered prefix is discarded
//! and the rest of that line is skipped up to its terminator. The oversized
//! frame is lost, but the buffer can never grow without bound and the next
//! frame always starts fresh.
//!
//! # Example
//!
//! ```
//! use sparkbridge::protocol::LineReassembler;
//!
//! let mut lines = LineReassembler::new();
//! assert!(lines.push(b"f-cu").is_empty());
//! assert_eq!(lines.push(b"be.12\n"), vec!["f-cube.12"]);
//! ```

/// Buffer capacity in bytes. Matches the largest line the printer is known
/// to send with plenty of headroom.
pub const LINE_BUFFER_CAPACITY: usize = 256;

/// Reassembles byte fragments into complete protocol lines.
#[derive(Debug)]
pub struct LineReassembler {
    /// Bytes of the line currently being assembled.
    buf: Vec<u8>,
    /// Maximum line length before the lossy reset kicks in.
    capacity: usize,
    /// Set after an overflow; input is skipped until the next terminator.
    discarding: bool,
}

impl LineReassembler {
    /// Create a reassembler with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(LINE_BUFFER_CAPACITY)
    }

    /// Create a reassembler with a custom capacity (mostly for tests).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity.min(LINE_BUFFER_CAPACITY)),
            capacity,
            discarding: false,
        }
    }

    /// Feed one inbound fragment, returning every line completed by it.
    ///
    /// Lines are returned without their terminator. Non-UTF-8 bytes are
    /// replaced; the protocol is plain ASCII so this only triggers on
    /// corrupted input, which the dispatcher drops as unknown anyway.
    pub fn push(&mut self, fragment: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();

        for &byte in fragment {
            if byte == b'\n' {
                if self.discarding {
                    // End of an oversized line; drop it and recover.
                    self.discarding = false;
                } else {
                    lines.push(String::from_utf8_lossy(&self.buf).into_owned());
                }
                self.buf.clear();
                continue;
            }

            if self.discarding {
                continue;
            }

            if self.buf.len() >= self.capacity {
                // Lossy-but-safe recovery: the frame under assembly cannot
                // fit, so discard it entirely rather than emit a torn line.
                self.buf.clear();
                self.discarding = true;
                continue;
            }

            self.buf.push(byte);
        }

        lines
    }

    /// Discard any partially assembled line.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.discarding = false;
    }

    /// Number of buffered bytes awaiting a terminator.
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }
}

impl Default for LineReassembler {
    fn default() -> Self {
        Self::new()
    }
}
