//! Service configuration, loaded from a TOML file.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use filedepot_types::{make_error_msg, Result, StatusCode};
use serde::{Deserialize, Serialize};

fn default_transfer_limit() -> usize {
    10
}

fn default_list_limit() -> usize {
    100
}

fn default_listen_addr() -> String {
    "127.0.0.1:50051".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Directory where uploaded files are stored and served from.
    pub upload_dir: PathBuf,

    /// Maximum concurrent uploads plus downloads. Zero rejects all transfers.
    #[serde(default = "default_transfer_limit")]
    pub transfer_limit: usize,

    /// Maximum concurrent directory listings. Zero rejects all listings.
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,

    /// Address the server listens on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("upload_files"),
            transfer_limit: default_transfer_limit(),
            list_limit: default_list_limit(),
            listen_addr: default_listen_addr(),
        }
    }
}

impl ServiceConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| {
            filedepot_types::Status::with_message(
                StatusCode::INVALID_CONFIG,
                format!("failed to parse config: {e}"),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            filedepot_types::Status::with_message(
                StatusCode::INVALID_CONFIG,
                format!("failed to read config {}: {e}", path.display()),
            )
        })?;
        Self::from_toml_str(&text)
    }

    /// Check the configuration for values that cannot be used.
    pub fn validate(&self) -> Result<()> {
        if self.upload_dir.as_os_str().is_empty() {
            return make_error_msg(StatusCode::INVALID_CONFIG, "upload_dir must not be empty");
        }
        if self.listen_addr.parse::<SocketAddr>().is_err() {
            return make_error_msg(
                StatusCode::INVALID_CONFIG,
                format!("listen_addr is not a valid socket address: {}", self.listen_addr),
            );
        }
        Ok(())
    }

    /// The parsed listen address. Call only after [`validate`](Self::validate).
    pub fn listen_socket_addr(&self) -> Result<SocketAddr> {
        self.listen_addr.parse().map_err(|_| {
            filedepot_types::Status::with_message(
                StatusCode::INVALID_CONFIG,
                format!("listen_addr is not a valid socket address: {}", self.listen_addr),
            )
        })
    }
}
