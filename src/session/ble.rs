//! NimBLE central binding for the printer link.
//!
//! The printer advertises a vendor service and exposes two more for the
//! serial bridge: one notifying characteristic for inbound bytes and one
//! writable characteristic for outbound commands. NimBLE callbacks run on
//! the host task, so everything they observe is pushed into a shared event
//! queue and drained by the control loop; the session itself is never
//! touched from a callback.

use super::transport::{LinkError, LinkTransport};
use esp32_nimble::utilities::BleUuid;
use esp32_nimble::{uuid128, BLEAddress, BLEClient, BLEDevice, BLEScan};
use esp_idf_hal::task::block_on;
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Service the printer advertises.
const ADVERTISED_SERVICE: BleUuid = uuid128!("0000fff0-0000-1000-8000-00805f9b34fb");

/// Service holding the notifying (printer to bridge) characteristic.
const NOTIFY_SERVICE: BleUuid = uuid128!("0000ffe0-0000-1000-8000-00805f9b34fb");
const NOTIFY_CHARACTERISTIC: BleUuid = uuid128!("0000ffe4-0000-1000-8000-00805f9b34fb");

/// Service holding the writable (bridge to printer) characteristic.
const WRITE_SERVICE: BleUuid = uuid128!("0000ffe5-0000-1000-8000-00805f9b34fb");
const WRITE_CHARACTERISTIC: BleUuid = uuid128!("0000ffe9-0000-1000-8000-00805f9b34fb");

/// One scan window, in milliseconds.
const SCAN_WINDOW_MS: i32 = 4000;

/// Transport event queued by a NimBLE callback for the control loop.
pub enum LinkEvent {
    /// The printer's advertisement was seen.
    Advertisement,
    /// Notification payload from the printer.
    Notify(Vec<u8>),
    /// The peer dropped the connection.
    Disconnected,
}

/// BLE central transport backed by esp32-nimble.
pub struct NimbleLink {
    client: Option<BLEClient>,
    /// Set after a successful connect; cleared first during teardown so a
    /// racing callback sees the link as dead.
    writer_ready: bool,
    scanning: Arc<AtomicBool>,
    found: Arc<Mutex<Option<BLEAddress>>>,
    events: Arc<Mutex<VecDeque<LinkEvent>>>,
}

impl NimbleLink {
    pub fn new() -> Self {
        Self {
            client: None,
            writer_ready: false,
            scanning: Arc::new(AtomicBool::new(false)),
            found: Arc::new(Mutex::new(None)),
            events: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Drain queued transport events. Called from the control loop.
    pub fn take_events(&self) -> Vec<LinkEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }

    fn resolve_and_subscribe(&self, client: &mut BLEClient) -> Result<(), LinkError> {
        block_on(async {
            let notify_service = client
                .get_service(NOTIFY_SERVICE)
                .await
                .map_err(|_| LinkError::ServiceMissing("notify"))?;
            let notify_char = notify_service
                .get_characteristic(NOTIFY_CHARACTERISTIC)
                .await
                .map_err(|_| LinkError::CharacteristicMissing("notify"))?;
            if !notify_char.can_notify() {
                return Err(LinkError::NotifyUnsupported);
            }
            let events = self.events.clone();
            notify_char.on_notify(move |data| {
                events
                    .lock()
                    .unwrap()
                    .push_back(LinkEvent::Notify(data.to_vec()));
            });
            notify_char
                .subscribe_notify(false)
                .await
                .map_err(|_| LinkError::NotifyUnsupported)?;

            // Resolve the write side now so a missing characteristic fails
            // the connect instead of the first command.
            let write_service = client
                .get_service(WRITE_SERVICE)
                .await
                .map_err(|_| LinkError::ServiceMissing("write"))?;
            write_service
                .get_characteristic(WRITE_CHARACTERISTIC)
                .await
                .map_err(|_| LinkError::CharacteristicMissing("write"))?;
            Ok(())
        })
    }
}

impl Default for NimbleLink {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkTransport for NimbleLink {
    fn start_scan(&mut self) {
        // One scan at a time; the window runs on its own thread so the
        // control loop keeps serving DNS and HTTP meanwhile.
        if self.scanning.swap(true, Ordering::SeqCst) {
            return;
        }
        let scanning = self.scanning.clone();
        let found = self.found.clone();
        let events = self.events.clone();
        std::thread::spawn(move || {
            let device = BLEDevice::take();
            let mut scan = BLEScan::new();
            let result = block_on(
                scan.active_scan(true)
                    .interval(100)
                    .window(99)
                    .start(device, SCAN_WINDOW_MS, |peer, data| {
                        data.is_advertising_service(&ADVERTISED_SERVICE)
                            .then(|| peer.addr())
                    }),
            );
            match result {
                Ok(Some(addr)) => {
                    info!("printer advertisement from {}", addr);
                    *found.lock().unwrap() = Some(addr);
                    events.lock().unwrap().push_back(LinkEvent::Advertisement);
                }
                Ok(None) => debug!("scan window closed, printer not seen"),
                Err(e) => warn!("scan failed: {:?}", e),
            }
            scanning.store(false, Ordering::SeqCst);
        });
    }

    fn connect(&mut self) -> Result<(), LinkError> {
        self.teardown();
        let addr = self
            .found
            .lock()
            .unwrap()
            .take()
            .ok_or(LinkError::NoDevice)?;

        let mut client = BLEClient::new();
        let events = self.events.clone();
        client.on_disconnect(move |_| {
            events.lock().unwrap().push_back(LinkEvent::Disconnected);
        });

        block_on(client.connect(&addr)).map_err(|_| LinkError::ConnectFailed)?;
        if let Err(e) = self.resolve_and_subscribe(&mut client) {
            let _ = client.disconnect();
            return Err(e);
        }

        info!("printer link up at {}", addr);
        self.client = Some(client);
        self.writer_ready = true;
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> bool {
        if !self.writer_ready {
            return false;
        }
        let Some(client) = self.client.as_mut() else {
            return false;
        };
        // NimBLE caches the discovered handles; this re-resolve is a map
        // lookup, not a fresh discovery.
        let result = block_on(async {
            let service = client.get_service(WRITE_SERVICE).await?;
            let characteristic = service.get_characteristic(WRITE_CHARACTERISTIC).await?;
            characteristic.write_value(data, false).await
        });
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("write failed: {:?}", e);
                false
            }
        }
    }

    fn has_writer(&self) -> bool {
        self.writer_ready
    }

    fn teardown(&mut self) {
        self.writer_ready = false;
        if let Some(mut client) = self.client.take() {
            let _ = client.disconnect();
        }
    }
}
