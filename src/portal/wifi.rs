//! ESP-IDF WiFi binding for the bootstrap.
//!
//! Runs the radio in mixed mode so the configuration access point and the
//! station association coexist. Connect attempts are started here and
//! polled by the bootstrap against its own deadline, so nothing in this
//! module blocks.

use crate::portal::bootstrap::{RadioControl, RadioError, ScanNetwork};
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::wifi::{
    AccessPointConfiguration, AuthMethod, ClientConfiguration, Configuration, EspWifi,
};
use esp_idf_sys::EspError;
use log::{debug, info};
use std::net::Ipv4Addr;

fn radio_err(context: &str, e: EspError) -> RadioError {
    RadioError(format!("{}: {:?}", context, e))
}

/// WiFi radio driven by esp-idf.
pub struct EspRadio<'a> {
    wifi: EspWifi<'a>,
    /// Access-point side of the current configuration, when raised.
    ap: Option<AccessPointConfiguration>,
    /// Station side of the current configuration, when attempting.
    station: Option<ClientConfiguration>,
}

impl<'a> EspRadio<'a> {
    pub fn new(modem: Modem, sysloop: EspSystemEventLoop) -> Result<Self, EspError> {
        let wifi = EspWifi::new(modem, sysloop, None)?;
        Ok(Self {
            wifi,
            ap: None,
            station: None,
        })
    }

    /// Push the current ap/station pair into the driver and (re)start it.
    fn apply(&mut self) -> Result<(), EspError> {
        let config = match (&self.ap, &self.station) {
            (Some(ap), Some(station)) => Configuration::Mixed(station.clone(), ap.clone()),
            (Some(ap), None) => Configuration::AccessPoint(ap.clone()),
            (None, Some(station)) => Configuration::Client(station.clone()),
            (None, None) => Configuration::None,
        };
        self.wifi.set_configuration(&config)?;
        if !self.wifi.is_started()? {
            self.wifi.start()?;
        }
        Ok(())
    }
}

impl RadioControl for EspRadio<'_> {
    fn start_ap(&mut self, ssid: &str, ip: Ipv4Addr, _subnet: Ipv4Addr) -> Result<(), RadioError> {
        // The softAP netif serves its own address as gateway; the default
        // esp-idf router configuration matches the 192.168.4.1/24 layout.
        debug!("raising access point '{}' at {}", ssid, ip);
        self.ap = Some(AccessPointConfiguration {
            ssid: ssid
                .try_into()
                .map_err(|_| RadioError(format!("AP SSID too long: {}", ssid)))?,
            auth_method: AuthMethod::None,
            ..Default::default()
        });
        self.apply().map_err(|e| radio_err("start AP", e))
    }

    fn stop_ap(&mut self) -> Result<(), RadioError> {
        self.ap = None;
        self.apply().map_err(|e| radio_err("stop AP", e))
    }

    fn scan(&mut self) -> Result<Vec<ScanNetwork>, RadioError> {
        let found = self.wifi.scan().map_err(|e| radio_err("scan", e))?;
        // Result order is the driver's; it is passed through untouched.
        Ok(found
            .into_iter()
            .map(|ap| ScanNetwork {
                ssid: ap.ssid.to_string(),
                rssi: ap.signal_strength,
                encrypted: !matches!(ap.auth_method, Some(AuthMethod::None)),
            })
            .collect())
    }

    fn begin_connect(&mut self, ssid: &str, secret: &str) -> Result<(), RadioError> {
        let auth_method = if secret.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        self.station = Some(ClientConfiguration {
            ssid: ssid
                .try_into()
                .map_err(|_| RadioError(format!("SSID too long: {}", ssid)))?,
            password: secret
                .try_into()
                .map_err(|_| RadioError("password too long".to_string()))?,
            auth_method,
            ..Default::default()
        });
        self.apply().map_err(|e| radio_err("configure station", e))?;
        info!("station connect to '{}' started", ssid);
        self.wifi.connect().map_err(|e| radio_err("connect", e))
    }

    fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    fn current_ssid(&self) -> Option<String> {
        if !self.is_connected() {
            return None;
        }
        self.station.as_ref().map(|c| c.ssid.to_string())
    }

    fn station_ip(&self) -> Option<Ipv4Addr> {
        if !self.is_connected() {
            return None;
        }
        self.wifi
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
    }

    fn disconnect(&mut self) {
        let _ = self.wifi.disconnect();
        self.station = None;
    }
}
