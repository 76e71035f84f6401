//! WebSocket server for live reload.
//!
//! Binds a TCP listener (retrying upward when the port is taken), accepts
//! browser connections on a background thread, and registers each client
//! with the hub for broadcasting.

use std::net::TcpListener;

use anyhow::Result;

use super::ReloadClients;
use super::message::ReloadMessage;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Start the WebSocket acceptor thread.
///
/// Returns the actual bound port, which may differ from `base_port`.
pub(super) fn start_ws_server(base_port: u16, clients: ReloadClients) -> Result<u16> {
    let (listener, actual_port) = try_bind_port(base_port, MAX_PORT_RETRIES)?;
    listener.set_nonblocking(true)?;

    std::thread::spawn(move || {
        loop {
            if crate::core::is_shutdown() {
                break;
            }
            match listener.accept() {
                Ok((stream, addr)) => {
                    crate::debug!("reload"; "client connected: {}", addr);
                    let _ = stream.set_nonblocking(false);

                    match tungstenite::accept(stream) {
                        Ok(mut ws) => {
                            let hello = ReloadMessage::connected().to_json();
                            let _ = ws.send(tungstenite::Message::Text(hello.into()));
                            clients.lock().push(ws);
                        }
                        Err(e) => {
                            crate::debug!("reload"; "handshake failed: {}", e);
                        }
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
                Err(e) => {
                    crate::log!("reload"; "accept error: {}", e);
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
            }
        }
    });

    Ok(actual_port)
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(format!("127.0.0.1:{}", port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind WebSocket server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_retries_past_taken_port() {
        let taken = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = taken.local_addr().unwrap().port();

        let (_listener, port) = try_bind_port(base, MAX_PORT_RETRIES).unwrap();
        assert_ne!(port, base);
    }
}
