//! SparkMaker bridge firmware binary.
//!
//! Single control loop: transport events are drained first, then the
//! printer session, the network bootstrap, the wildcard DNS responder and
//! the HTTP control surface each get one non-blocking turn.

#[cfg(feature = "esp32")]
fn main() {
    use sparkbridge::portal::dns::DnsRedirect;
    use sparkbridge::portal::http::{ControlServer, DEFAULT_HTTP_PORT};
    use sparkbridge::portal::{storage, wifi::EspRadio, NetworkBootstrap};
    use sparkbridge::session::ble::{LinkEvent, NimbleLink};
    use sparkbridge::{Session, Settings};

    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use log::{error, info, warn};
    use std::time::{Duration, Instant};

    // Link ESP-IDF patches (must be first!)
    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("sparkbridge starting");

    let peripherals = match Peripherals::take() {
        Ok(peripherals) => peripherals,
        Err(e) => {
            error!("failed to take peripherals: {:?}", e);
            return;
        }
    };
    let sysloop = match EspSystemEventLoop::take() {
        Ok(sysloop) => sysloop,
        Err(e) => {
            error!("failed to take system event loop: {:?}", e);
            return;
        }
    };

    let mut nvs = match storage::init_nvs() {
        Ok(nvs) => Some(nvs),
        Err(e) => {
            warn!("NVS unavailable, settings will not persist: {:?}", e);
            None
        }
    };

    let mut settings = Settings::default();
    if let Some(nvs) = nvs.as_ref() {
        if let Some(hostname) = storage::load_hostname(nvs) {
            settings.hostname = hostname;
        }
    }
    let store = nvs
        .as_ref()
        .map(storage::load_credentials)
        .unwrap_or_default();
    info!(
        "hostname '{}', {} stored networks",
        settings.hostname,
        store.len()
    );

    let radio = match EspRadio::new(peripherals.modem, sysloop) {
        Ok(radio) => radio,
        Err(e) => {
            error!("failed to initialize WiFi: {:?}", e);
            return;
        }
    };

    let mut bootstrap = NetworkBootstrap::new(radio, store, &settings);
    let mut session = Session::new(NimbleLink::new(), settings.keep_alive_interval);

    bootstrap.start(Instant::now());
    session.connect();

    let mut dns = match DnsRedirect::bind(settings.ap_ip) {
        Ok(dns) => Some(dns),
        Err(e) => {
            warn!("DNS redirect unavailable: {}", e);
            None
        }
    };
    let http = match ControlServer::bind(DEFAULT_HTTP_PORT) {
        Ok(http) => Some(http),
        Err(e) => {
            warn!("HTTP server unavailable: {}", e);
            None
        }
    };

    // Persist on change: compare against the last serialized form so the
    // flash only sees real edits.
    let mut persisted_credentials = bootstrap.store().to_bytes();
    let mut persisted_hostname = bootstrap.hostname().to_string();

    info!("entering control loop");
    loop {
        let now = Instant::now();

        for event in session.transport().take_events() {
            match event {
                LinkEvent::Advertisement => session.on_advertisement(),
                LinkEvent::Notify(data) => session.on_notify(&data, now),
                LinkEvent::Disconnected => session.on_disconnect(),
            }
        }

        session.tick(now);
        bootstrap.tick(now);
        if let Some(dns) = dns.as_mut() {
            dns.poll();
        }
        if let Some(http) = http.as_ref() {
            http.poll(&mut session, &mut bootstrap, now);
        }

        if let Some(nvs) = nvs.as_mut() {
            let credentials = bootstrap.store().to_bytes();
            if credentials != persisted_credentials {
                match storage::save_credentials(nvs, bootstrap.store()) {
                    Ok(()) => persisted_credentials = credentials,
                    Err(e) => warn!("failed to persist credentials: {:?}", e),
                }
            }
            if bootstrap.hostname() != persisted_hostname {
                match storage::save_hostname(nvs, bootstrap.hostname()) {
                    Ok(()) => persisted_hostname = bootstrap.hostname().to_string(),
                    Err(e) => warn!("failed to persist hostname: {:?}", e),
                }
            }
        }

        std::thread::sleep(Duration::from_millis(50));
    }
}

#[cfg(not(feature = "esp32"))]
fn main() {
    println!("This binary requires the 'esp32' feature.");
    println!("Use 'cargo test' for host testing or run the host-sim binary.");
}
