//! Access-point lifecycle and station connection chain.
//!
//! On boot the bridge raises its own access point so the portal is always
//! reachable, then scans for known networks and walks the candidates in
//! the order the radio reported them, with a deadline per attempt. The state
//! machine is written against [`RadioControl`] so the whole chain is
//! host-testable; the esp-idf binding lives in [`crate::portal::wifi`].
//!
//! Connect attempts never block: `begin_connect` starts the association and
//! `tick` polls it against a deadline, so DNS and HTTP stay responsive
//! while the radio works.

use crate::config::Settings;
use crate::portal::credentials::CredentialStore;
use log::{debug, info, warn};
use std::fmt;
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

/// How long to wait before retrying the scan-connect chain after every
/// candidate failed.
pub const RETRY_INTERVAL: Duration = Duration::from_secs(60);

/// One network seen during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanNetwork {
    pub ssid: String,
    /// Signal strength in dBm.
    pub rssi: i8,
    pub encrypted: bool,
}

/// Errors from the radio layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioError(pub String);

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for RadioError {}

/// What the bootstrap needs from the WiFi radio.
///
/// The radio runs access point and station concurrently; stopping the
/// access point must not drop an established station association.
pub trait RadioControl {
    /// Raise (or re-raise) the access point.
    fn start_ap(&mut self, ssid: &str, ip: Ipv4Addr, subnet: Ipv4Addr) -> Result<(), RadioError>;

    /// Tear the access point down, keeping the station side alive.
    fn stop_ap(&mut self) -> Result<(), RadioError>;

    /// Scan for visible networks, in the radio's own result order.
    fn scan(&mut self) -> Result<Vec<ScanNetwork>, RadioError>;

    /// Start a station connect attempt. Returns once the attempt is
    /// underway; completion is observed via [`RadioControl::is_connected`].
    fn begin_connect(&mut self, ssid: &str, secret: &str) -> Result<(), RadioError>;

    /// Whether the station side is currently associated.
    fn is_connected(&self) -> bool;

    /// SSID of the current association, if any.
    fn current_ssid(&self) -> Option<String>;

    /// Station address, if associated.
    fn station_ip(&self) -> Option<Ipv4Addr>;

    /// Drop the station association.
    fn disconnect(&mut self);
}

/// Where the bootstrap currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    /// Access point up, no station attempt in progress.
    ApOnly,
    /// Access point up, scan-connect chain about to run.
    ApPlusScanning,
    /// Station connect attempt in flight.
    Connecting,
    /// Station associated.
    Connected,
    /// Access point timed out and was torn down; station only.
    ApExpired,
}

impl BootstrapState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApOnly => "AP_ONLY",
            Self::ApPlusScanning => "SCANNING",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
            Self::ApExpired => "AP_EXPIRED",
        }
    }
}

/// Drives the access point and the station connection chain.
pub struct NetworkBootstrap<R: RadioControl> {
    radio: R,
    store: CredentialStore,
    hostname: String,
    ap_ip: Ipv4Addr,
    ap_subnet: Ipv4Addr,
    connection_timeout: Duration,
    portal_timeout: Option<Duration>,
    state: BootstrapState,
    /// Candidates left in the current attempt cycle, radio order.
    candidates: Vec<(String, String)>,
    /// When the in-flight connect attempt gives up.
    deadline: Option<Instant>,
    /// Whether exhaustion of `candidates` falls back to a rescan. Set for
    /// direct attempts triggered by a credential add.
    fallback_rescan: bool,
    ap_active: bool,
    ap_raised_at: Option<Instant>,
    last_attempt: Option<Instant>,
}

impl<R: RadioControl> NetworkBootstrap<R> {
    pub fn new(radio: R, store: CredentialStore, settings: &Settings) -> Self {
        Self {
            radio,
            store,
            hostname: settings.hostname.clone(),
            ap_ip: settings.ap_ip,
            ap_subnet: settings.ap_subnet,
            connection_timeout: settings.connection_timeout,
            portal_timeout: settings.portal_timeout,
            state: BootstrapState::ApOnly,
            candidates: Vec::new(),
            deadline: None,
            fallback_rescan: false,
            ap_active: false,
            ap_raised_at: None,
            last_attempt: None,
        }
    }

    pub fn state(&self) -> BootstrapState {
        self.state
    }

    pub fn ap_active(&self) -> bool {
        self.ap_active
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn ap_ip(&self) -> Ipv4Addr {
        self.ap_ip
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn current_ssid(&self) -> Option<String> {
        self.radio.current_ssid()
    }

    pub fn station_ip(&self) -> Option<Ipv4Addr> {
        self.radio.station_ip()
    }

    /// Scan for visible networks on behalf of the portal UI.
    pub fn scan_networks(&mut self) -> Result<Vec<ScanNetwork>, RadioError> {
        self.radio.scan()
    }

    /// Raise the access point and kick off the scan-connect chain.
    pub fn start(&mut self, now: Instant) {
        self.raise_ap(now);
        self.state = if self.store.is_empty() {
            BootstrapState::ApOnly
        } else {
            BootstrapState::ApPlusScanning
        };
    }

    fn raise_ap(&mut self, now: Instant) {
        match self
            .radio
            .start_ap(&self.hostname, self.ap_ip, self.ap_subnet)
        {
            Ok(()) => {
                info!("access point '{}' up at {}", self.hostname, self.ap_ip);
                self.ap_active = true;
                self.ap_raised_at = Some(now);
            }
            Err(e) => warn!("failed to raise access point: {}", e),
        }
    }

    /// Advance the state machine. Called from the main control loop.
    pub fn tick(&mut self, now: Instant) {
        self.tick_portal_timeout(now);
        match self.state {
            BootstrapState::ApPlusScanning => self.run_scan_chain(now),
            BootstrapState::Connecting => self.poll_connect(now),
            BootstrapState::Connected => {
                if !self.radio.is_connected() {
                    info!("station link lost, rescanning");
                    self.state = BootstrapState::ApPlusScanning;
                }
            }
            BootstrapState::ApOnly | BootstrapState::ApExpired => {
                self.tick_retry(now);
            }
        }
    }

    fn tick_portal_timeout(&mut self, now: Instant) {
        let Some(timeout) = self.portal_timeout else {
            return;
        };
        if !self.ap_active {
            return;
        }
        let Some(raised) = self.ap_raised_at else {
            return;
        };
        if now.duration_since(raised) < timeout {
            return;
        }
        info!("portal timeout reached, stopping access point");
        if let Err(e) = self.radio.stop_ap() {
            warn!("failed to stop access point: {}", e);
        }
        self.ap_active = false;
        if self.state == BootstrapState::ApOnly {
            self.state = BootstrapState::ApExpired;
        }
    }

    fn tick_retry(&mut self, now: Instant) {
        if self.store.is_empty() || self.radio.is_connected() {
            return;
        }
        let due = match self.last_attempt {
            Some(last) => now.duration_since(last) >= RETRY_INTERVAL,
            None => true,
        };
        if due {
            self.state = BootstrapState::ApPlusScanning;
        }
    }

    /// Scan, keep the known networks in whatever order the radio reported
    /// them, start the first candidate. No visible candidate leaves us in
    /// access-point mode until the next retry cycle.
    fn run_scan_chain(&mut self, now: Instant) {
        self.last_attempt = Some(now);
        let visible = match self.radio.scan() {
            Ok(networks) => networks,
            Err(e) => {
                warn!("scan failed: {}", e);
                self.state = BootstrapState::ApOnly;
                return;
            }
        };
        self.candidates = visible
            .iter()
            .filter_map(|network| {
                self.store
                    .secret_for(&network.ssid)
                    .map(|secret| (network.ssid.clone(), secret.to_string()))
            })
            .collect();
        debug!(
            "scan saw {} networks, {} known",
            visible.len(),
            self.candidates.len()
        );
        self.fallback_rescan = false;
        if !self.try_next_candidate(now) {
            self.state = BootstrapState::ApOnly;
        }
    }

    /// Start the next candidate attempt. Returns whether one was started.
    fn try_next_candidate(&mut self, now: Instant) -> bool {
        while !self.candidates.is_empty() {
            let (ssid, secret) = self.candidates.remove(0);
            info!("connecting to '{}'", ssid);
            match self.radio.begin_connect(&ssid, &secret) {
                Ok(()) => {
                    self.deadline = Some(now + self.connection_timeout);
                    self.state = BootstrapState::Connecting;
                    return true;
                }
                Err(e) => warn!("connect to '{}' failed to start: {}", ssid, e),
            }
        }
        false
    }

    fn poll_connect(&mut self, now: Instant) {
        if self.radio.is_connected() {
            match self.radio.station_ip() {
                Some(ip) => info!("station connected, address {}", ip),
                None => info!("station connected"),
            }
            self.state = BootstrapState::Connected;
            self.deadline = None;
            return;
        }
        let expired = self.deadline.is_some_and(|deadline| now >= deadline);
        if !expired {
            return;
        }
        debug!("connect attempt timed out");
        self.radio.disconnect();
        if self.try_next_candidate(now) {
            return;
        }
        self.deadline = None;
        if self.fallback_rescan {
            self.fallback_rescan = false;
            self.state = BootstrapState::ApPlusScanning;
        } else {
            self.state = BootstrapState::ApOnly;
            self.last_attempt = Some(now);
        }
    }

    /// Store a credential and try it immediately. Falls back to the full
    /// rescan chain when the direct attempt fails.
    pub fn add_credential(
        &mut self,
        ssid: &str,
        secret: &str,
        now: Instant,
    ) -> Result<(), crate::portal::credentials::CredentialError> {
        self.store.add(ssid, secret)?;
        if self.radio.current_ssid().as_deref() == Some(ssid) && self.radio.is_connected() {
            // Already on that network; nothing to do.
            return Ok(());
        }
        self.radio.disconnect();
        self.candidates = vec![(ssid.to_string(), secret.to_string())];
        self.fallback_rescan = true;
        self.last_attempt = Some(now);
        if !self.try_next_candidate(now) {
            self.state = BootstrapState::ApPlusScanning;
        }
        Ok(())
    }

    /// Forget a credential. Dropping the network we are on triggers a
    /// rescan for the remaining candidates.
    pub fn remove_credential(&mut self, ssid: &str, now: Instant) -> bool {
        if !self.store.remove(ssid) {
            return false;
        }
        if self.radio.current_ssid().as_deref() == Some(ssid) {
            info!("dropping current network '{}'", ssid);
            self.radio.disconnect();
            self.last_attempt = Some(now);
            self.state = if self.store.is_empty() {
                BootstrapState::ApOnly
            } else {
                BootstrapState::ApPlusScanning
            };
        }
        true
    }

    /// Rename the device. The access point restarts under the new name and
    /// its timeout starts over, re-raising it if it had expired.
    pub fn set_hostname(&mut self, hostname: &str, now: Instant) {
        self.hostname = hostname.to_string();
        if self.ap_active {
            if let Err(e) = self.radio.stop_ap() {
                warn!("failed to stop access point: {}", e);
            }
        }
        self.raise_ap(now);
        if self.state == BootstrapState::ApExpired {
            self.state = BootstrapState::ApOnly;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    // ==================== Mock Radio ====================

    #[derive(Default)]
    struct MockRadio {
        visible: Vec<ScanNetwork>,
        /// SSIDs for which an association completes.
        joinable: Vec<String>,
        attempting: Option<String>,
        connected: Option<String>,
        ap_up: bool,
        ap_ssid: String,
        scans: usize,
        connect_attempts: Vec<String>,
        disconnects: usize,
    }

    impl MockRadio {
        fn with_visible(networks: &[(&str, i8)]) -> Self {
            Self {
                visible: networks
                    .iter()
                    .map(|(ssid, rssi)| ScanNetwork {
                        ssid: ssid.to_string(),
                        rssi: *rssi,
                        encrypted: true,
                    })
                    .collect(),
                ..Default::default()
            }
        }

        /// Complete the in-flight attempt if the network is joinable.
        fn settle(&mut self) {
            if let Some(ssid) = self.attempting.take() {
                if self.joinable.iter().any(|j| *j == ssid) {
                    self.connected = Some(ssid);
                }
            }
        }
    }

    impl RadioControl for MockRadio {
        fn start_ap(
            &mut self,
            ssid: &str,
            _ip: Ipv4Addr,
            _subnet: Ipv4Addr,
        ) -> Result<(), RadioError> {
            self.ap_up = true;
            self.ap_ssid = ssid.to_string();
            Ok(())
        }

        fn stop_ap(&mut self) -> Result<(), RadioError> {
            self.ap_up = false;
            Ok(())
        }

        fn scan(&mut self) -> Result<Vec<ScanNetwork>, RadioError> {
            self.scans += 1;
            Ok(self.visible.clone())
        }

        fn begin_connect(&mut self, ssid: &str, _secret: &str) -> Result<(), RadioError> {
            self.connect_attempts.push(ssid.to_string());
            self.attempting = Some(ssid.to_string());
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected.is_some()
        }

        fn current_ssid(&self) -> Option<String> {
            self.connected.clone()
        }

        fn station_ip(&self) -> Option<Ipv4Addr> {
            self.connected.as_ref().map(|_| Ipv4Addr::new(10, 0, 0, 9))
        }

        fn disconnect(&mut self) {
            self.attempting = None;
            self.connected = None;
            self.disconnects += 1;
        }
    }

    fn settings() -> Settings {
        Settings::default()
    }

    fn store_with(entries: &[(&str, &str)]) -> CredentialStore {
        let mut store = CredentialStore::new();
        for (ssid, secret) in entries {
            store.add(*ssid, *secret).unwrap();
        }
        store
    }

    // ==================== Startup Tests ====================

    #[test]
    fn test_start_raises_ap() {
        let mut bootstrap =
            NetworkBootstrap::new(MockRadio::default(), CredentialStore::new(), &settings());
        bootstrap.start(Instant::now());
        assert!(bootstrap.ap_active());
        assert!(bootstrap.radio.ap_up);
        assert_eq!(bootstrap.radio.ap_ssid, "sparkbridge");
        assert_eq!(bootstrap.state(), BootstrapState::ApOnly);
    }

    #[test]
    fn test_start_with_credentials_enters_scanning() {
        let mut bootstrap = NetworkBootstrap::new(
            MockRadio::with_visible(&[("HomeNet", -40)]),
            store_with(&[("HomeNet", "password123")]),
            &settings(),
        );
        bootstrap.start(Instant::now());
        assert_eq!(bootstrap.state(), BootstrapState::ApPlusScanning);
    }

    // ==================== Scan Chain Tests ====================

    #[test]
    fn test_scan_connects_to_known_network() {
        let mut radio = MockRadio::with_visible(&[("Stranger", -30), ("HomeNet", -50)]);
        radio.joinable = vec!["HomeNet".to_string()];
        let mut bootstrap = NetworkBootstrap::new(
            radio,
            store_with(&[("HomeNet", "password123")]),
            &settings(),
        );
        let now = Instant::now();
        bootstrap.start(now);

        bootstrap.tick(now);
        assert_eq!(bootstrap.state(), BootstrapState::Connecting);
        assert_eq!(bootstrap.radio.connect_attempts, vec!["HomeNet"]);

        bootstrap.radio.settle();
        bootstrap.tick(now + Duration::from_secs(1));
        assert_eq!(bootstrap.state(), BootstrapState::Connected);
    }

    #[test]
    fn test_candidates_follow_radio_order() {
        // Both networks are known; attempts must follow the radio's order.
        let mut radio = MockRadio::with_visible(&[("NearNet", -30), ("FarNet", -70)]);
        radio.joinable = vec![];
        let mut bootstrap = NetworkBootstrap::new(
            radio,
            store_with(&[("FarNet", "password123"), ("NearNet", "password456")]),
            &settings(),
        );
        let now = Instant::now();
        bootstrap.start(now);
        bootstrap.tick(now);
        // First attempt fails at its deadline, second candidate follows.
        bootstrap.tick(now + Duration::from_secs(6));
        assert_eq!(bootstrap.radio.connect_attempts, vec!["NearNet", "FarNet"]);
    }

    #[test]
    fn test_no_known_network_stays_ap_only() {
        let mut bootstrap = NetworkBootstrap::new(
            MockRadio::with_visible(&[("Stranger", -40)]),
            store_with(&[("HomeNet", "password123")]),
            &settings(),
        );
        let now = Instant::now();
        bootstrap.start(now);
        bootstrap.tick(now);
        assert_eq!(bootstrap.state(), BootstrapState::ApOnly);
        assert!(bootstrap.ap_active());
    }

    #[test]
    fn test_all_candidates_exhausted_returns_to_ap_only() {
        let radio = MockRadio::with_visible(&[("HomeNet", -40)]);
        let mut bootstrap = NetworkBootstrap::new(
            radio,
            store_with(&[("HomeNet", "password123")]),
            &settings(),
        );
        let now = Instant::now();
        bootstrap.start(now);
        bootstrap.tick(now);
        assert_eq!(bootstrap.state(), BootstrapState::Connecting);
        // Deadline passes without association.
        bootstrap.tick(now + Duration::from_secs(6));
        assert_eq!(bootstrap.state(), BootstrapState::ApOnly);
        assert_eq!(bootstrap.radio.disconnects, 1);
    }

    #[test]
    fn test_retry_after_interval() {
        let mut bootstrap = NetworkBootstrap::new(
            MockRadio::with_visible(&[]),
            store_with(&[("HomeNet", "password123")]),
            &settings(),
        );
        let now = Instant::now();
        bootstrap.start(now);
        bootstrap.tick(now);
        assert_eq!(bootstrap.state(), BootstrapState::ApOnly);
        assert_eq!(bootstrap.radio.scans, 1);

        // Not yet due.
        bootstrap.tick(now + Duration::from_secs(30));
        assert_eq!(bootstrap.radio.scans, 1);

        bootstrap.tick(now + RETRY_INTERVAL);
        assert_eq!(bootstrap.state(), BootstrapState::ApPlusScanning);
        bootstrap.tick(now + RETRY_INTERVAL);
        assert_eq!(bootstrap.radio.scans, 2);
    }

    #[test]
    fn test_lost_link_triggers_rescan() {
        let mut radio = MockRadio::with_visible(&[("HomeNet", -40)]);
        radio.joinable = vec!["HomeNet".to_string()];
        let mut bootstrap = NetworkBootstrap::new(
            radio,
            store_with(&[("HomeNet", "password123")]),
            &settings(),
        );
        let now = Instant::now();
        bootstrap.start(now);
        bootstrap.tick(now);
        bootstrap.radio.settle();
        bootstrap.tick(now);
        assert_eq!(bootstrap.state(), BootstrapState::Connected);

        bootstrap.radio.connected = None;
        bootstrap.tick(now + Duration::from_secs(1));
        assert_eq!(bootstrap.state(), BootstrapState::ApPlusScanning);
    }

    // ==================== Credential Change Tests ====================

    #[test]
    fn test_add_credential_attempts_directly() {
        let mut radio = MockRadio::default();
        radio.joinable = vec!["NewNet".to_string()];
        let mut bootstrap = NetworkBootstrap::new(radio, CredentialStore::new(), &settings());
        let now = Instant::now();
        bootstrap.start(now);

        bootstrap.add_credential("NewNet", "password123", now).unwrap();
        assert_eq!(bootstrap.state(), BootstrapState::Connecting);
        assert_eq!(bootstrap.radio.connect_attempts, vec!["NewNet"]);
        assert!(bootstrap.store().contains("NewNet"));

        bootstrap.radio.settle();
        bootstrap.tick(now + Duration::from_secs(1));
        assert_eq!(bootstrap.state(), BootstrapState::Connected);
    }

    #[test]
    fn test_add_credential_falls_back_to_rescan() {
        let mut bootstrap =
            NetworkBootstrap::new(MockRadio::default(), CredentialStore::new(), &settings());
        let now = Instant::now();
        bootstrap.start(now);
        bootstrap.add_credential("NewNet", "password123", now).unwrap();

        // Direct attempt times out; the full chain runs next.
        bootstrap.tick(now + Duration::from_secs(6));
        assert_eq!(bootstrap.state(), BootstrapState::ApPlusScanning);
    }

    #[test]
    fn test_add_credential_rejects_invalid() {
        let mut bootstrap =
            NetworkBootstrap::new(MockRadio::default(), CredentialStore::new(), &settings());
        let now = Instant::now();
        bootstrap.start(now);
        assert!(bootstrap.add_credential("NewNet", "short", now).is_err());
        assert!(bootstrap.store().is_empty());
        assert_eq!(bootstrap.radio.connect_attempts.len(), 0);
    }

    #[test]
    fn test_add_credential_for_current_network_is_noop() {
        let mut radio = MockRadio::default();
        radio.connected = Some("HomeNet".to_string());
        let mut bootstrap = NetworkBootstrap::new(radio, CredentialStore::new(), &settings());
        let now = Instant::now();
        bootstrap
            .add_credential("HomeNet", "newpassword1", now)
            .unwrap();
        assert_eq!(bootstrap.radio.disconnects, 0);
        assert!(bootstrap.radio.connect_attempts.is_empty());
    }

    #[test]
    fn test_remove_current_network_disconnects_and_rescans() {
        let mut radio = MockRadio::default();
        radio.connected = Some("HomeNet".to_string());
        let mut bootstrap = NetworkBootstrap::new(
            radio,
            store_with(&[("HomeNet", "password123"), ("OtherNet", "password456")]),
            &settings(),
        );
        let now = Instant::now();
        assert!(bootstrap.remove_credential("HomeNet", now));
        assert_eq!(bootstrap.radio.disconnects, 1);
        assert_eq!(bootstrap.state(), BootstrapState::ApPlusScanning);
        assert!(!bootstrap.store().contains("HomeNet"));
    }

    #[test]
    fn test_remove_other_network_keeps_connection() {
        let mut radio = MockRadio::default();
        radio.connected = Some("HomeNet".to_string());
        let mut bootstrap = NetworkBootstrap::new(
            radio,
            store_with(&[("HomeNet", "password123"), ("OtherNet", "password456")]),
            &settings(),
        );
        assert!(bootstrap.remove_credential("OtherNet", Instant::now()));
        assert_eq!(bootstrap.radio.disconnects, 0);
    }

    #[test]
    fn test_remove_unknown_network() {
        let mut bootstrap =
            NetworkBootstrap::new(MockRadio::default(), CredentialStore::new(), &settings());
        assert!(!bootstrap.remove_credential("Nope", Instant::now()));
    }

    // ==================== Portal Timeout Tests ====================

    #[test]
    fn test_portal_never_expires_by_default() {
        let mut bootstrap =
            NetworkBootstrap::new(MockRadio::default(), CredentialStore::new(), &settings());
        let now = Instant::now();
        bootstrap.start(now);
        bootstrap.tick(now + Duration::from_secs(100_000));
        assert!(bootstrap.ap_active());
    }

    #[test]
    fn test_portal_timeout_tears_down_ap() {
        let mut settings = settings();
        settings.portal_timeout = Some(Duration::from_secs(120));
        let mut bootstrap =
            NetworkBootstrap::new(MockRadio::default(), CredentialStore::new(), &settings);
        let now = Instant::now();
        bootstrap.start(now);

        bootstrap.tick(now + Duration::from_secs(119));
        assert!(bootstrap.ap_active());

        bootstrap.tick(now + Duration::from_secs(120));
        assert!(!bootstrap.ap_active());
        assert!(!bootstrap.radio.ap_up);
        assert_eq!(bootstrap.state(), BootstrapState::ApExpired);
    }

    #[test]
    fn test_hostname_change_restarts_ap_and_resets_timer() {
        let mut settings = settings();
        settings.portal_timeout = Some(Duration::from_secs(120));
        let mut bootstrap =
            NetworkBootstrap::new(MockRadio::default(), CredentialStore::new(), &settings);
        let now = Instant::now();
        bootstrap.start(now);

        // Expired, then renamed: the portal comes back with a fresh timer.
        bootstrap.tick(now + Duration::from_secs(200));
        assert!(!bootstrap.ap_active());

        let renamed_at = now + Duration::from_secs(300);
        bootstrap.set_hostname("printerbridge", renamed_at);
        assert!(bootstrap.ap_active());
        assert_eq!(bootstrap.radio.ap_ssid, "printerbridge");
        assert_eq!(bootstrap.state(), BootstrapState::ApOnly);

        bootstrap.tick(renamed_at + Duration::from_secs(119));
        assert!(bootstrap.ap_active());
        bootstrap.tick(renamed_at + Duration::from_secs(121));
        assert!(!bootstrap.ap_active());
    }
}
