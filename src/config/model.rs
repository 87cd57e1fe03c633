//! Configuration data model.
//!
//! All structs derive `Serialize`/`Deserialize` for TOML persistence.
//! Every field has a sensible default so the tool works with no config file
//! present.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration, loaded from `~/.config/xgrab/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Fixed session nickname; a random one is generated per transfer when
    /// unset.
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub dcc: DccConfig,
    #[serde(default)]
    pub transfer: TransferOptions,
    #[serde(default)]
    pub search: SearchOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nickname: None,
            dcc: DccConfig::default(),
            transfer: TransferOptions::default(),
            search: SearchOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DccConfig {
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
    /// Refuse offers pointing at private/loopback addresses.
    #[serde(default = "default_true")]
    pub reject_private_ips: bool,
    /// Refuse offers announcing more than this many bytes; 0 disables the
    /// check.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for DccConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            reject_private_ips: true,
            max_file_size: default_max_file_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferOptions {
    /// Only connect to IRC networks over TLS.
    #[serde(default)]
    pub tls_only: bool,
    #[serde(default = "default_registration_timeout")]
    pub registration_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            tls_only: false,
            registration_timeout_secs: default_registration_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Soft deadline for a whole search call across all providers.
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            timeout_secs: default_search_timeout(),
        }
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_true() -> bool {
    true
}

fn default_max_file_size() -> u64 {
    20 * 1024 * 1024 * 1024
}

fn default_registration_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    60
}

fn default_search_timeout() -> u64 {
    10
}
