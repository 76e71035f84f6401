//! Live reload: WebSocket broadcast to connected browsers.
//!
//! The hub owns the client list. Delivery is at-most-once and
//! best-effort: clients connecting after a notification never receive
//! it retroactively, and a dead client is pruned without affecting the
//! others or the calling task.

pub mod message;
mod server;

use std::net::TcpStream;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

pub use message::ReloadMessage;

/// Connected clients, shared between the acceptor thread and broadcasts.
type ReloadClients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

/// Broadcast hub for live reload notifications.
#[derive(Clone)]
pub struct ReloadHub {
    clients: ReloadClients,
    port: u16,
}

impl ReloadHub {
    /// Bind the WebSocket server and start accepting clients.
    pub fn start(base_port: u16) -> Result<Self> {
        let clients: ReloadClients = Arc::new(Mutex::new(Vec::new()));
        let port = server::start_ws_server(base_port, Arc::clone(&clients))?;
        crate::debug!("reload"; "ws://localhost:{}", port);
        Ok(Self { clients, port })
    }

    /// Actual bound WebSocket port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Number of currently connected clients.
    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    /// Broadcast a message to all connected clients.
    ///
    /// Send failures drop the client; they never propagate to the caller.
    pub fn notify(&self, msg: &ReloadMessage) {
        let payload = Message::Text(msg.to_json().into());

        let mut clients = self.clients.lock();
        let count = clients.len();
        if count == 0 {
            crate::debug!("reload"; "no clients connected");
            return;
        }

        clients.retain_mut(|client| match client.send(payload.clone()) {
            Ok(_) => true,
            Err(e) => {
                crate::debug!("reload"; "client disconnected: {}", e);
                false
            }
        });
        crate::debug!("reload"; "broadcast to {} clients", count);
    }

    /// Close all client connections (session shutdown).
    pub fn shutdown(&self) {
        let mut clients = self.clients.lock();
        for mut client in clients.drain(..) {
            let _ = client.close(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_without_clients_is_noop() {
        let hub = ReloadHub {
            clients: Arc::new(Mutex::new(Vec::new())),
            port: 0,
        };
        hub.notify(&ReloadMessage::reload());
        assert_eq!(hub.client_count(), 0);
    }

    #[test]
    fn test_hub_start_binds_a_port() {
        let hub = ReloadHub::start(0).unwrap();
        assert_ne!(hub.port(), 0);
    }
}
