//! HTTP control surface for the portal and the printer.
//!
//! Serves hand-formatted JSON over `tiny_http`, which works on both host
//! and ESP32 (via std::net). Unlike a threaded server, requests are drained
//! with `try_recv` from the main control loop so the handlers can borrow
//! the session and bootstrap mutably without locking.
//!
//! Network configuration lives under `/c/`, printer control under `/p/`.
//! Anything else gets redirected to `/`, which is what captive-portal
//! connectivity probes expect.

use crate::portal::bootstrap::{NetworkBootstrap, RadioControl, ScanNetwork};
use crate::portal::credentials::CredentialStore;
use crate::session::{LinkTransport, Session};
use crate::status::Printer;
use log::{debug, warn};
use std::io;
use std::time::Instant;
use tiny_http::{Header, Response, Server};

/// Default port for the control server.
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// Strip characters that would break out of a JSON string or an SSID
/// field. Applied to every query argument before use.
pub fn sanitize(input: &str) -> String {
    input.chars().filter(|c| *c != '"' && *c != '\\').collect()
}

/// Escape a string for embedding in a JSON literal.
pub fn json_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Percent-decode one query component, treating `+` as space.
fn url_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(byte) => {
                        out.push(byte);
                        i += 3;
                    }
                    None => {
                        out.push(bytes[i]);
                        i += 1;
                    }
                }
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Look up a query parameter by key, decoded and sanitized.
pub fn query_param(query: &str, key: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        (k == key).then(|| sanitize(&url_decode(v)))
    })
}

/// File catalog as a JSON object, names sorted for stable output.
pub fn files_json(printer: &Printer) -> String {
    let mut files: Vec<(&String, &u16)> = printer.files.iter().collect();
    files.sort();
    let body = files
        .iter()
        .map(|(name, id)| format!(r#""{}":{}"#, json_escape(name), id))
        .collect::<Vec<_>>()
        .join(",");
    format!("{{{}}}", body)
}

/// Snapshot of the printer model as JSON.
pub fn printer_json(printer: &Printer, session_state: &str, now: Instant) -> String {
    format!(
        r#"{{"session":"{}","status":"{}","currentFile":"{}","currentLayer":{},"totalLayers":{},"printTime":{},"estimatedTotalTime":{},"files":{}}}"#,
        session_state,
        printer.status.as_str(),
        json_escape(&printer.current_file),
        printer.current_layer,
        printer.total_layers,
        printer.print_time_secs(now),
        printer.estimated_total_secs(now),
        files_json(printer)
    )
}

/// Scan results augmented from the credential store: visible networks
/// carry `known` and `connected` flags, and known networks the scan did
/// not see are appended without an `rssi` so the portal UI can still
/// offer to forget them.
pub fn scan_json(
    visible: &[ScanNetwork],
    store: &CredentialStore,
    current_ssid: Option<&str>,
) -> String {
    let mut entries = Vec::with_capacity(visible.len() + store.len());
    for network in visible {
        let mut entry = format!(
            r#"{{"ssid":"{}","rssi":{},"encrypted":{}"#,
            json_escape(&network.ssid),
            network.rssi,
            network.encrypted
        );
        if store.contains(&network.ssid) {
            entry.push_str(r#","known":true"#);
        }
        if current_ssid == Some(network.ssid.as_str()) {
            entry.push_str(r#","connected":true"#);
        }
        entry.push('}');
        entries.push(entry);
    }
    for credential in store.iter() {
        if visible.iter().any(|n| n.ssid == credential.ssid) {
            continue;
        }
        entries.push(format!(
            r#"{{"ssid":"{}","encrypted":{},"known":true}}"#,
            json_escape(&credential.ssid),
            !credential.secret.is_empty()
        ));
    }
    format!(r#"{{"networks":[{}]}}"#, entries.join(","))
}

#[derive(Debug)]
enum Reply {
    Json(String),
    BadRequest(String),
    NotFound,
    RedirectHome,
}

/// Non-blocking HTTP control server.
pub struct ControlServer {
    server: Server,
}

impl ControlServer {
    /// Bind on all interfaces.
    pub fn bind(port: u16) -> io::Result<Self> {
        let server = Server::http(("0.0.0.0", port))
            .map_err(|e| io::Error::new(io::ErrorKind::AddrInUse, e.to_string()))?;
        Ok(Self { server })
    }

    /// Drain and answer all pending requests. Never blocks.
    pub fn poll<T: LinkTransport, R: RadioControl>(
        &self,
        session: &mut Session<T>,
        bootstrap: &mut NetworkBootstrap<R>,
        now: Instant,
    ) {
        loop {
            let request = match self.server.try_recv() {
                Ok(Some(request)) => request,
                Ok(None) => return,
                Err(e) => {
                    warn!("http recv failed: {}", e);
                    return;
                }
            };

            let url = request.url().to_string();
            let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
            debug!("http {} {}", request.method(), path);
            let reply = Self::dispatch(path, query, session, bootstrap, now);
            Self::respond(request, reply);
        }
    }

    fn dispatch<T: LinkTransport, R: RadioControl>(
        path: &str,
        query: &str,
        session: &mut Session<T>,
        bootstrap: &mut NetworkBootstrap<R>,
        now: Instant,
    ) -> Reply {
        match path {
            "/" => Reply::Json(r#"{"name":"sparkbridge","config":"/c/","printer":"/p/"}"#.into()),

            // ==================== Network configuration ====================
            "/c/info" => {
                let ssid = bootstrap
                    .current_ssid()
                    .map(|s| format!(r#""{}""#, json_escape(&s)))
                    .unwrap_or_else(|| "null".into());
                let ip = bootstrap
                    .station_ip()
                    .map(|ip| format!(r#""{}""#, ip))
                    .unwrap_or_else(|| "null".into());
                let known = bootstrap
                    .store()
                    .iter()
                    .map(|c| format!(r#""{}""#, json_escape(&c.ssid)))
                    .collect::<Vec<_>>()
                    .join(",");
                Reply::Json(format!(
                    r#"{{"hostname":"{}","state":"{}","apActive":{},"ap":{{"ssid":"{}","ip":"{}"}},"currentSsid":{},"stationIp":{},"known":[{}]}}"#,
                    json_escape(bootstrap.hostname()),
                    bootstrap.state().as_str(),
                    bootstrap.ap_active(),
                    json_escape(bootstrap.hostname()),
                    bootstrap.ap_ip(),
                    ssid,
                    ip,
                    known
                ))
            }
            "/c/scan" => match bootstrap.scan_networks() {
                Ok(networks) => {
                    let current = bootstrap.current_ssid();
                    Reply::Json(scan_json(&networks, bootstrap.store(), current.as_deref()))
                }
                Err(e) => Reply::BadRequest(format!("scan failed: {}", e)),
            },
            "/c/add" => {
                let Some(ssid) = query_param(query, "ssid") else {
                    return Reply::BadRequest("missing ssid".into());
                };
                let password = query_param(query, "pwd").unwrap_or_default();
                match bootstrap.add_credential(&ssid, &password, now) {
                    Ok(()) => Reply::Json(r#"{"ok":true}"#.into()),
                    Err(e) => Reply::BadRequest(e.to_string()),
                }
            }
            "/c/del" => {
                let Some(ssid) = query_param(query, "ssid") else {
                    return Reply::BadRequest("missing ssid".into());
                };
                if bootstrap.remove_credential(&ssid, now) {
                    Reply::Json(r#"{"ok":true}"#.into())
                } else {
                    Reply::BadRequest("unknown ssid".into())
                }
            }
            "/c/hostname" => {
                let Some(hostname) = query_param(query, "hostname") else {
                    return Reply::BadRequest("missing hostname".into());
                };
                if hostname.is_empty() || hostname.len() > 32 {
                    return Reply::BadRequest("hostname must be 1-32 characters".into());
                }
                bootstrap.set_hostname(&hostname, now);
                Reply::Json(r#"{"ok":true}"#.into())
            }

            // ==================== Printer control ====================
            "/p/status" => Reply::Json(printer_json(
                session.printer(),
                session.state().as_str(),
                now,
            )),
            "/p/connect" => {
                session.connect();
                Reply::Json(r#"{"ok":true}"#.into())
            }
            "/p/disconnect" => {
                session.disconnect();
                Reply::Json(r#"{"ok":true}"#.into())
            }
            "/p/print" => {
                let Some(file) = query_param(query, "file") else {
                    return Reply::BadRequest("missing file".into());
                };
                session.print(&file);
                Reply::Json(r#"{"ok":true}"#.into())
            }
            "/p/stop" => {
                session.stop_print();
                Reply::Json(r#"{"ok":true}"#.into())
            }
            "/p/pause" => {
                session.pause_print();
                Reply::Json(r#"{"ok":true}"#.into())
            }
            "/p/resume" => {
                session.resume_print();
                Reply::Json(r#"{"ok":true}"#.into())
            }
            "/p/emergency" => {
                session.emergency_stop();
                Reply::Json(r#"{"ok":true}"#.into())
            }
            "/p/home" => {
                session.home();
                Reply::Json(r#"{"ok":true}"#.into())
            }
            "/p/move" => {
                let delta = query_param(query, "z").and_then(|z| z.parse::<i16>().ok());
                let Some(delta) = delta else {
                    return Reply::BadRequest("missing or invalid z".into());
                };
                session.move_z(delta);
                Reply::Json(r#"{"ok":true}"#.into())
            }
            "/p/cmd" => {
                let Some(cmd) = query_param(query, "send") else {
                    return Reply::BadRequest("missing send".into());
                };
                session.send(&crate::protocol::Command::Raw(cmd));
                Reply::Json(r#"{"ok":true}"#.into())
            }
            "/p/files" => Reply::Json(format!(
                r#"{{"files":{}}}"#,
                files_json(session.printer())
            )),

            path if path.starts_with("/c/") || path.starts_with("/p/") => Reply::NotFound,
            // Captive-portal probes land here and get sent to the index.
            _ => Reply::RedirectHome,
        }
    }

    fn respond(request: tiny_http::Request, reply: Reply) {
        let content_type = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
            .expect("static header");
        let cors = Header::from_bytes(&b"Access-Control-Allow-Origin"[..], &b"*"[..])
            .expect("static header");
        let no_cache =
            Header::from_bytes(&b"Cache-Control"[..], &b"no-store"[..]).expect("static header");

        let response = match reply {
            Reply::Json(body) => Response::from_string(body)
                .with_status_code(200)
                .with_header(content_type),
            Reply::BadRequest(msg) => Response::from_string(format!(
                r#"{{"ok":false,"error":"{}"}}"#,
                json_escape(&msg)
            ))
            .with_status_code(400)
            .with_header(content_type),
            Reply::NotFound => Response::from_string(r#"{"ok":false,"error":"not found"}"#)
                .with_status_code(404)
                .with_header(content_type),
            Reply::RedirectHome => {
                let location =
                    Header::from_bytes(&b"Location"[..], &b"/"[..]).expect("static header");
                Response::from_string("").with_status_code(302).with_header(location)
            }
        };
        let response = response.with_header(cors).with_header(no_cache);
        if let Err(e) = request.respond(response) {
            warn!("http respond failed: {}", e);
        }
    }
}
