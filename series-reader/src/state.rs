use crate::config::{Config, Mode};
use crate::memory::MemoryStore;
use crate::reader::{DbReader, QueryHealthChecker};
use crate::remote::RemoteStore;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info};

pub struct AppState {
    pub reader: DbReader,
    pub max_request_body_bytes: usize,
}

impl AppState {
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let mode = cfg.mode.clone().unwrap_or_default();
        let store: Arc<dyn QueryHealthChecker> = match mode {
            Mode::Remote => Arc::new(remote_store(cfg)?),
            Mode::Memory => {
                let path = cfg
                    .fixture
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("memory mode requires `fixture`"))?;
                Arc::new(MemoryStore::from_file(path)?)
            }
        };

        // Default to 5 MB if not specified
        const DEFAULT_MAX_BODY_BYTES: usize = 5_242_880; // 5 MB
        const BYTES_PER_MB: usize = 1_048_576;
        let max_request_body_bytes = cfg.max_request_body_bytes.unwrap_or(DEFAULT_MAX_BODY_BYTES);
        debug!(
            "Maximum request body size: {} bytes ({} MB)",
            max_request_body_bytes,
            max_request_body_bytes / BYTES_PER_MB
        );

        Ok(Self::new(store, max_request_body_bytes))
    }

    pub fn new(store: Arc<dyn QueryHealthChecker>, max_request_body_bytes: usize) -> Self {
        AppState {
            reader: DbReader::new(store),
            max_request_body_bytes,
        }
    }
}

fn remote_store(cfg: &Config) -> anyhow::Result<RemoteStore> {
    let backend = cfg
        .backend
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("remote mode requires a [backend] section"))?;

    let timeout = Duration::from_secs(cfg.timeout_secs.unwrap_or(5));
    let mut builder = Client::builder().timeout(timeout);
    if let Some(secs) = cfg.connect_timeout_secs {
        builder = builder.connect_timeout(Duration::from_secs(secs));
    }
    if let Some(n) = cfg.pool_max_idle_per_host {
        builder = builder.pool_max_idle_per_host(n);
    }
    if let Some(secs) = cfg.tcp_keepalive_secs {
        builder = builder.tcp_keepalive(Duration::from_secs(secs));
    }
    let client = builder.build()?;
    debug!("HTTP client created with timeout: {:?}", timeout);

    let max_outbound = cfg.max_outbound_concurrency.unwrap_or(32);
    let semaphore = Arc::new(Semaphore::new(max_outbound));
    debug!("Created semaphore with {} permits", max_outbound);

    let store = RemoteStore::new(client, &backend.url, backend.token.clone(), semaphore)?;
    info!("Registered backend: url='{}'", store.url());
    Ok(store)
}
