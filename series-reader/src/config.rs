use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
pub struct Backend {
    pub url: String,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Remote,
    Memory,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub listen: Option<String>,
    // Store selection: `remote` forwards each query to `backend`, `memory` answers from `fixture`.
    // Defaults to `remote`.
    pub mode: Option<Mode>,
    pub backend: Option<Backend>,
    // JSON array of series served in memory mode.
    pub fixture: Option<String>,
    pub timeout_secs: Option<u64>,
    // Maximum number of concurrent outbound requests to the backend.
    // If not set, a sensible default will be used in `AppState`.
    pub max_outbound_concurrency: Option<usize>,
    // Maximum request body size in bytes. Requests exceeding this will return 413 Payload Too Large.
    // If not set, defaults to 5 MB (5_242_880 bytes).
    pub max_request_body_bytes: Option<usize>,
    // Connection timeout in seconds for establishing connections to the backend.
    // If not set, uses reqwest's default behavior (no specific connect timeout).
    pub connect_timeout_secs: Option<u64>,
    // Maximum number of idle connections to keep alive per host.
    // If not set, uses reqwest's default (no specific limit).
    pub pool_max_idle_per_host: Option<usize>,
    // TCP keepalive interval in seconds to detect dead connections.
    // If not set, uses system default TCP keepalive settings.
    pub tcp_keepalive_secs: Option<u64>,
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let cfg_str = fs::read_to_string(path)?;
        Ok(toml::from_str(&cfg_str)?)
    }
}
