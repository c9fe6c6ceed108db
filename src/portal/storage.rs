//! NVS persistence for portal settings.
//!
//! Credentials and the hostname are stored in ESP32 Non-Volatile Storage
//! so they survive reboots. Only compiled for device builds.

use crate::portal::credentials::{CredentialStore, MAX_PASSWORD_LEN, MAX_SSID_LEN};
use esp_idf_svc::nvs::{EspNvs, EspNvsPartition, NvsDefault};
use esp_idf_sys::EspError;

/// NVS namespace for the bridge.
const NVS_NAMESPACE: &str = "sparkbridge";

/// NVS key for the credential store.
const CREDENTIALS_KEY: &str = "credentials";

/// NVS key for the hostname.
const HOSTNAME_KEY: &str = "hostname";

/// Largest serialized credential store we read back: up to 8 networks of
/// `[len:1][ssid:32][len:1][password:64]` plus the count byte.
const MAX_CREDENTIALS_BUFFER: usize = 1 + 8 * (1 + MAX_SSID_LEN + 1 + MAX_PASSWORD_LEN);

/// Open the default NVS partition under the bridge namespace.
pub fn init_nvs() -> Result<EspNvs<NvsDefault>, EspError> {
    let partition = EspNvsPartition::<NvsDefault>::take()?;
    EspNvs::new(partition, NVS_NAMESPACE, true)
}

/// Load the credential store. Returns an empty store when nothing is
/// persisted or the blob is corrupted.
pub fn load_credentials(nvs: &EspNvs<NvsDefault>) -> CredentialStore {
    let mut buf = [0u8; MAX_CREDENTIALS_BUFFER];
    match nvs.get_raw(CREDENTIALS_KEY, &mut buf) {
        Ok(Some(bytes)) => CredentialStore::from_bytes(bytes).unwrap_or_default(),
        _ => CredentialStore::default(),
    }
}

/// Persist the credential store.
pub fn save_credentials(
    nvs: &mut EspNvs<NvsDefault>,
    store: &CredentialStore,
) -> Result<(), EspError> {
    nvs.set_raw(CREDENTIALS_KEY, &store.to_bytes())?;
    Ok(())
}

/// Load the hostname, if one was persisted.
pub fn load_hostname(nvs: &EspNvs<NvsDefault>) -> Option<String> {
    let mut buf = [0u8; 64];
    let hostname = nvs.get_str(HOSTNAME_KEY, &mut buf).ok()??;
    (!hostname.is_empty()).then(|| hostname.to_string())
}

/// Persist the hostname.
pub fn save_hostname(nvs: &mut EspNvs<NvsDefault>, hostname: &str) -> Result<(), EspError> {
    nvs.set_str(HOSTNAME_KEY, hostname)?;
    Ok(())
}
