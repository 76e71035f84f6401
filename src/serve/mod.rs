//! Development server with live reload support.
//!
//! Serves a directory of static files, injecting the reload client into
//! HTML on the way out. With a PHP backend configured, every request
//! (except the reload client itself) is forwarded to the PHP built-in
//! server instead, which serves the same docroot.

pub mod proxy;
pub mod response;

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tiny_http::{Request, Server};

use crate::config::ServeConfig;
use crate::core::register_server;
use crate::log;

pub use proxy::PhpBackend;
pub use response::RELOAD_JS_PATH;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bound server ready to accept requests.
pub struct BoundServer {
    server: Arc<Server>,
    addr: SocketAddr,
    ws_port: Option<u16>,
}

/// Bind the HTTP server without starting the request loop.
///
/// `ws_port` is the actual WebSocket port of the reload hub, already
/// bound by the caller; `None` disables injection entirely.
pub fn bind_server(config: &ServeConfig, ws_port: Option<u16>) -> Result<BoundServer> {
    let (server, addr) = bind_with_retry(config.interface, config.port)?;
    let server = Arc::new(server);

    register_server(Arc::clone(&server));
    log!("serve"; "http://{}", addr);

    Ok(BoundServer {
        server,
        addr,
        ws_port,
    })
}

/// Bind to the specified interface and port, with automatic port retry.
fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(_) if offset + 1 < MAX_PORT_RETRIES => continue,
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Failed to bind after {} attempts (ports {}-{}): {}",
                    MAX_PORT_RETRIES,
                    base_port,
                    port,
                    e
                ));
            }
        }
    }
    unreachable!()
}

impl BoundServer {
    /// Get the bound address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start the request loop (blocking).
    ///
    /// `root` is the docroot for static files; with `php` set, requests
    /// are forwarded to the backend instead of read from disk.
    pub fn run(self, root: &Path, php: Option<PhpBackend>) -> Result<()> {
        run_request_loop(&self.server, root, self.ws_port, php);
        Ok(())
    }
}

fn run_request_loop(server: &Server, root: &Path, ws_port: Option<u16>, php: Option<PhpBackend>) {
    // Thread pool keeps one slow request (PHP, large images) from
    // blocking the rest
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .expect("failed to create thread pool");

    let root: Arc<PathBuf> = Arc::new(root.to_path_buf());
    let php = php.map(Arc::new);

    for request in server.incoming_requests() {
        let root = Arc::clone(&root);
        let php = php.clone();
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &root, ws_port, php.as_deref()) {
                log!("serve"; "request error: {e}");
            }
        });
    }
}

/// Handle a single HTTP request.
fn handle_request(
    request: Request,
    root: &Path,
    ws_port: Option<u16>,
    php: Option<&PhpBackend>,
) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    // The reload client is served from memory in both modes
    if let Some(port) = ws_port
        && request.url() == RELOAD_JS_PATH
    {
        return response::respond_reload_js(request, port);
    }

    if let Some(backend) = php {
        return backend.forward(request, ws_port);
    }

    match response::resolve_path(request.url(), root) {
        Some(path) => response::respond_file(request, &path, ws_port),
        None => response::respond_not_found(request, root, ws_port),
    }
}
