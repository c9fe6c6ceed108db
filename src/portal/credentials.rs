//! Known-network credential store.
//!
//! Maps SSIDs to their secrets. Insertion order is preserved only for
//! serialization stability; connection attempts follow radio scan order,
//! not store order. Secrets are zeroized when an entry is removed or
//! replaced.
//!
//! The byte format used for NVS persistence is length-prefixed:
//! `[count:1]` then per entry `[ssid_len:1][ssid][secret_len:1][secret]`.

use std::fmt;
use zeroize::Zeroize;

/// Maximum SSID length per IEEE 802.11.
pub const MAX_SSID_LEN: usize = 32;

/// Maximum password length for WPA2.
pub const MAX_PASSWORD_LEN: usize = 64;

/// Minimum password length for WPA2 (empty means an open network).
pub const MIN_PASSWORD_LEN: usize = 8;

/// One stored credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Network SSID (1-32 bytes).
    pub ssid: String,
    /// Network secret (8-64 bytes for WPA2, empty for open networks).
    pub secret: String,
}

impl Drop for Credential {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

/// Errors from credential validation or deserialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// SSID is empty.
    SsidEmpty,
    /// SSID exceeds maximum length.
    SsidTooLong { len: usize, max: usize },
    /// Secret is too short for WPA2.
    SecretTooShort { len: usize, min: usize },
    /// Secret exceeds maximum length.
    SecretTooLong { len: usize, max: usize },
    /// Invalid data during deserialization.
    InvalidFormat(String),
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SsidEmpty => write!(f, "SSID cannot be empty"),
            Self::SsidTooLong { len, max } => {
                write!(f, "SSID too long: {} bytes (max {})", len, max)
            }
            Self::SecretTooShort { len, min } => {
                write!(f, "password too short: {} bytes (min {})", len, min)
            }
            Self::SecretTooLong { len, max } => {
                write!(f, "password too long: {} bytes (max {})", len, max)
            }
            Self::InvalidFormat(msg) => write!(f, "invalid format: {}", msg),
        }
    }
}

impl std::error::Error for CredentialError {}

/// Validate an SSID/secret pair.
fn validate(ssid: &str, secret: &str) -> Result<(), CredentialError> {
    if ssid.is_empty() {
        return Err(CredentialError::SsidEmpty);
    }
    if ssid.len() > MAX_SSID_LEN {
        return Err(CredentialError::SsidTooLong {
            len: ssid.len(),
            max: MAX_SSID_LEN,
        });
    }
    if !secret.is_empty() && secret.len() < MIN_PASSWORD_LEN {
        return Err(CredentialError::SecretTooShort {
            len: secret.len(),
            min: MIN_PASSWORD_LEN,
        });
    }
    if secret.len() > MAX_PASSWORD_LEN {
        return Err(CredentialError::SecretTooLong {
            len: secret.len(),
            max: MAX_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// The set of networks we may connect to.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CredentialStore {
    entries: Vec<Credential>,
}

impl CredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a credential. A replaced secret is zeroized.
    pub fn add(
        &mut self,
        ssid: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<(), CredentialError> {
        let ssid = ssid.into();
        let secret = secret.into();
        validate(&ssid, &secret)?;
        if let Some(existing) = self.entries.iter_mut().find(|c| c.ssid == ssid) {
            existing.secret.zeroize();
            existing.secret = secret;
        } else {
            self.entries.push(Credential { ssid, secret });
        }
        Ok(())
    }

    /// Remove a credential; returns whether it existed. Drop zeroizes it.
    pub fn remove(&mut self, ssid: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|c| c.ssid != ssid);
        self.entries.len() != before
    }

    /// Secret for an SSID, if stored.
    pub fn secret_for(&self, ssid: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|c| c.ssid == ssid)
            .map(|c| c.secret.as_str())
    }

    /// Whether credentials for this SSID exist.
    pub fn contains(&self, ssid: &str) -> bool {
        self.entries.iter().any(|c| c.ssid == ssid)
    }

    /// Iterate over stored credentials.
    pub fn iter(&self) -> impl Iterator<Item = &Credential> {
        self.entries.iter()
    }

    /// Number of stored credentials.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize for NVS storage.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + self.entries.len() * 2);
        bytes.push(self.entries.len() as u8);
        for entry in &self.entries {
            bytes.push(entry.ssid.len() as u8);
            bytes.extend_from_slice(entry.ssid.as_bytes());
            bytes.push(entry.secret.len() as u8);
            bytes.extend_from_slice(entry.secret.as_bytes());
        }
        bytes
    }

    /// Deserialize from NVS bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CredentialError> {
        let take_str = |bytes: &[u8], pos: &mut usize| -> Result<String, CredentialError> {
            let len = *bytes
                .get(*pos)
                .ok_or_else(|| CredentialError::InvalidFormat("truncated length".into()))?
                as usize;
            *pos += 1;
            let end = *pos + len;
            let slice = bytes
                .get(*pos..end)
                .ok_or_else(|| CredentialError::InvalidFormat("truncated string".into()))?;
            *pos = end;
            String::from_utf8(slice.to_vec())
                .map_err(|_| CredentialError::InvalidFormat("invalid UTF-8".into()))
        };

        if bytes.is_empty() {
            return Err(CredentialError::InvalidFormat("empty data".into()));
        }
        let count = bytes[0] as usize;
        let mut pos = 1;
        let mut store = Self::new();
        for _ in 0..count {
            let ssid = take_str(bytes, &mut pos)?;
            let secret = take_str(bytes, &mut pos)?;
            store.add(ssid, secret)?;
        }
        Ok(store)
    }
}
