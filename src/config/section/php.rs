//! `[php]` section configuration.
//!
//! ```toml
//! [php]
//! command = "php"   # PHP interpreter to spawn
//! port = 8000       # port for the built-in PHP server
//! ```
//!
//! Backend mode spawns `php -S 127.0.0.1:<port> -t <docroot>` and
//! reverse-proxies dynamic requests to it.

use serde::{Deserialize, Serialize};

/// PHP backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhpConfig {
    /// PHP interpreter command.
    pub command: String,

    /// Port for the built-in PHP dev server.
    pub port: u16,
}

impl Default for PhpConfig {
    fn default() -> Self {
        Self {
            command: "php".to_string(),
            port: 8000,
        }
    }
}
