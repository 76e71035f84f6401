//! PHP backend: process lifecycle and request forwarding.
//!
//! Requests are forwarded to the PHP built-in server as HTTP/1.0 with
//! `Connection: close`, so the upstream response is a plain byte stream
//! with no chunked framing or keep-alive bookkeeping to handle. HTML
//! responses get the reload script injected on the way back, same as
//! files served from disk.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tiny_http::{Header, Request, Response, StatusCode};

use crate::config::PhpConfig;
use crate::utils::exec::{Cmd, ServerChild};
use crate::{debug, log};

use super::response::maybe_inject_reload;

/// Hop-by-hop headers that must not be forwarded either direction.
const HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "transfer-encoding",
    "upgrade",
    "proxy-connection",
];

/// Running PHP built-in server plus the address to forward to.
pub struct PhpBackend {
    addr: String,
    // Held for its Drop: kills the PHP process with the session.
    _child: ServerChild,
}

impl PhpBackend {
    /// Spawn `php -S` serving `docroot` and wait for it to come up.
    pub fn spawn(config: &PhpConfig, docroot: &Path) -> Result<Self> {
        let addr = format!("127.0.0.1:{}", config.port);
        let child = Cmd::new(&config.command)
            .args(["-S", addr.as_str(), "-t"])
            .arg(docroot)
            .spawn_server()
            .context("spawn PHP built-in server")?;

        let backend = Self {
            addr: addr.clone(),
            _child: child,
        };
        backend.wait_ready()?;
        log!("proxy"; "php backend at http://{}", addr);
        Ok(backend)
    }

    /// Poll the backend port until it accepts connections.
    fn wait_ready(&self) -> Result<()> {
        for _ in 0..50 {
            if TcpStream::connect(&self.addr).is_ok() {
                return Ok(());
            }
            std::thread::sleep(Duration::from_millis(100));
        }
        bail!("PHP backend did not start listening on {}", self.addr)
    }

    /// Forward one request to the backend and relay the response. An
    /// unreachable backend becomes a 502 to the browser, not an error.
    pub fn forward(&self, mut request: Request, ws_port: Option<u16>) -> Result<()> {
        let upstream = match self.exchange(&mut request) {
            Ok(upstream) => upstream,
            Err(e) => {
                log!("proxy"; "{:#}", e);
                return super::response::respond_bad_gateway(request, &format!("{e:#}"));
            }
        };
        debug!("proxy"; "{} {} -> {}", request.method(), request.url(), upstream.status);

        let body = maybe_inject_reload(upstream.body, &upstream.content_type, ws_port);

        let mut response = Response::from_data(body).with_status_code(StatusCode(upstream.status));
        for (key, value) in &upstream.headers {
            if let Ok(header) = Header::from_bytes(key.as_bytes(), value.as_bytes()) {
                response.add_header(header);
            }
        }
        request.respond(response)?;
        Ok(())
    }

    /// Send the request upstream and read the full response.
    fn exchange(&self, request: &mut Request) -> Result<UpstreamResponse> {
        let mut stream = TcpStream::connect(&self.addr)
            .with_context(|| format!("connect to PHP backend {}", self.addr))?;
        stream.set_read_timeout(Some(Duration::from_secs(30)))?;

        let mut head = format!("{} {} HTTP/1.0\r\n", request.method(), request.url());
        head.push_str(&format!("Host: {}\r\n", self.addr));
        head.push_str("Connection: close\r\n");
        for header in request.headers() {
            let field = header.field.as_str().as_str();
            let lower = field.to_ascii_lowercase();
            // Identity encoding keeps the body injectable.
            if lower == "host" || lower == "accept-encoding" || HOP_HEADERS.contains(&lower.as_str())
            {
                continue;
            }
            head.push_str(&format!("{}: {}\r\n", field, header.value));
        }
        head.push_str("\r\n");

        stream.write_all(head.as_bytes())?;
        let mut body = Vec::new();
        request.as_reader().read_to_end(&mut body)?;
        stream.write_all(&body)?;

        let mut raw = Vec::new();
        stream
            .read_to_end(&mut raw)
            .context("read PHP backend response")?;
        parse_response(&raw)
    }
}

/// Parsed upstream response.
struct UpstreamResponse {
    status: u16,
    content_type: String,
    /// Forwardable headers (hop-by-hop and length headers stripped).
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

/// Parse a raw HTTP/1.x response into status, headers and body.
fn parse_response(raw: &[u8]) -> Result<UpstreamResponse> {
    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .context("malformed response from PHP backend: no header terminator")?;
    let (head, body) = (&raw[..split], &raw[split + 4..]);
    let head = std::str::from_utf8(head).context("malformed response head from PHP backend")?;

    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap_or_default();
    let status: u16 = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .with_context(|| format!("malformed status line from PHP backend: {status_line}"))?;

    let mut content_type = String::from("application/octet-stream");
    let mut headers = Vec::new();
    for line in lines {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        let lower = key.to_ascii_lowercase();

        if lower == "content-type" {
            content_type = value.to_string();
        }
        // tiny_http recomputes Content-Length for the new body.
        if lower == "content-length" || HOP_HEADERS.contains(&lower.as_str()) {
            continue;
        }
        headers.push((key.to_string(), value.to_string()));
    }

    Ok(UpstreamResponse {
        status,
        content_type,
        headers,
        body: body.to_vec(),
    })
}
