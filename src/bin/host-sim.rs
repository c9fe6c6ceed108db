//! Host-based bridge simulator for development and testing.
//!
//! Runs the full control loop on the host against a scripted printer and a
//! fake radio, and serves the real HTTP control surface so the endpoints
//! can be exercised with curl:
//!
//! ```bash
//! cargo run --bin host-sim
//! curl http://localhost:8080/p/status
//! curl 'http://localhost:8080/p/print?file=cube'
//! ```

use log::{info, warn};
use sparkbridge::portal::bootstrap::{RadioControl, RadioError, ScanNetwork};
use sparkbridge::portal::http::ControlServer;
use sparkbridge::portal::{CredentialStore, NetworkBootstrap};
use sparkbridge::session::{LinkError, LinkTransport};
use sparkbridge::{Session, Settings};
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

/// Port for the simulated control surface.
const SIM_HTTP_PORT: u16 = 8080;

/// A printer that answers commands the way a SparkMaker does.
///
/// Replies are queued as raw bytes, split mid-line to exercise the
/// reassembler the way real notifications do.
#[derive(Default)]
struct ScriptedPrinter {
    connected: bool,
    inbound: VecDeque<Vec<u8>>,
    printing: bool,
    layer: i32,
}

impl ScriptedPrinter {
    fn reply(&mut self, text: &str) {
        // Split each reply in two notification payloads.
        let bytes = text.as_bytes();
        let mid = bytes.len() / 2;
        self.inbound.push_back(bytes[..mid].to_vec());
        self.inbound.push_back(bytes[mid..].to_vec());
    }

    fn handle(&mut self, command: &str) {
        match command.trim_end() {
            "PWD-OK" => {
                self.reply("online\n");
                if self.printing {
                    self.layer += 1;
                    self.reply(&format!("F/S={}/120\n", self.layer));
                }
            }
            "scan-file" => {
                self.reply("f-cube.12\nf-bench.7\nf-tower.v2.3\n");
                self.reply("scan-finish\nstandby_sts\n");
            }
            "Start Printing;" => {
                self.printing = true;
                self.layer = 0;
                self.reply("printing_sts\n");
            }
            "Stop Printing;" => {
                self.printing = false;
                self.reply("stop_sts\nstandby_sts\n");
            }
            "Pause Printing;" => self.reply("pause_sts\n"),
            "Keep Printing;" => self.reply("pause-over\n"),
            "Emergency;" => {
                self.printing = false;
                self.reply("standby_sts\n");
            }
            cmd if cmd.starts_with("file-") => {
                self.reply("pf_cube\n");
            }
            cmd => info!("printer swallowed '{}'", cmd),
        }
    }
}

struct ScriptedLink {
    printer: ScriptedPrinter,
    advertised: bool,
}

impl ScriptedLink {
    fn new() -> Self {
        Self {
            printer: ScriptedPrinter::default(),
            advertised: false,
        }
    }

    /// One advertisement per scan, then notification payloads.
    fn advertisement_pending(&mut self) -> bool {
        std::mem::take(&mut self.advertised)
    }

    fn next_notify(&mut self) -> Option<Vec<u8>> {
        self.printer.inbound.pop_front()
    }
}

impl LinkTransport for ScriptedLink {
    fn start_scan(&mut self) {
        self.advertised = true;
    }

    fn connect(&mut self) -> Result<(), LinkError> {
        self.printer.connected = true;
        // A real printer opens with its handshake challenge.
        self.printer.reply("P-X1\n");
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> bool {
        if !self.printer.connected {
            return false;
        }
        let command = String::from_utf8_lossy(data).into_owned();
        self.printer.handle(&command);
        true
    }

    fn has_writer(&self) -> bool {
        self.printer.connected
    }

    fn teardown(&mut self) {
        self.printer.connected = false;
        self.printer.inbound.clear();
    }
}

/// Radio where every known network is joinable instantly.
#[derive(Default)]
struct SimRadio {
    ap_up: bool,
    connected: Option<String>,
}

impl RadioControl for SimRadio {
    fn start_ap(&mut self, ssid: &str, ip: Ipv4Addr, _subnet: Ipv4Addr) -> Result<(), RadioError> {
        info!("[sim] access point '{}' at {}", ssid, ip);
        self.ap_up = true;
        Ok(())
    }

    fn stop_ap(&mut self) -> Result<(), RadioError> {
        self.ap_up = false;
        Ok(())
    }

    fn scan(&mut self) -> Result<Vec<ScanNetwork>, RadioError> {
        Ok(vec![
            ScanNetwork {
                ssid: "SimNet".to_string(),
                rssi: -42,
                encrypted: true,
            },
            ScanNetwork {
                ssid: "Neighbor".to_string(),
                rssi: -77,
                encrypted: true,
            },
        ])
    }

    fn begin_connect(&mut self, ssid: &str, _secret: &str) -> Result<(), RadioError> {
        self.connected = Some(ssid.to_string());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.is_some()
    }

    fn current_ssid(&self) -> Option<String> {
        self.connected.clone()
    }

    fn station_ip(&self) -> Option<Ipv4Addr> {
        self.connected.as_ref().map(|_| Ipv4Addr::new(10, 0, 0, 42))
    }

    fn disconnect(&mut self) {
        self.connected = None;
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("=== sparkbridge host simulator ===");

    let settings = Settings::default();
    let mut session = Session::new(ScriptedLink::new(), settings.keep_alive_interval);
    let mut bootstrap = NetworkBootstrap::new(SimRadio::default(), CredentialStore::new(), &settings);

    bootstrap.start(Instant::now());
    session.connect();

    let http = match ControlServer::bind(SIM_HTTP_PORT) {
        Ok(http) => {
            info!("control surface at http://localhost:{}/", SIM_HTTP_PORT);
            Some(http)
        }
        Err(e) => {
            warn!("failed to bind control surface: {}", e);
            None
        }
    };

    info!("entering control loop (Ctrl+C to exit)");
    loop {
        let now = Instant::now();

        // Drain the scripted transport the way the device drains NimBLE.
        loop {
            let advertised = {
                let link = session.transport_mut();
                link.advertisement_pending()
            };
            if advertised {
                session.on_advertisement();
                continue;
            }
            let Some(data) = session.transport_mut().next_notify() else {
                break;
            };
            session.on_notify(&data, now);
        }

        session.tick(now);
        bootstrap.tick(now);
        if let Some(http) = http.as_ref() {
            http.poll(&mut session, &mut bootstrap, now);
        }

        std::thread::sleep(Duration::from_millis(50));
    }
}
