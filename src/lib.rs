use std::sync::Arc;
use tokio::sync::Semaphore;

pub mod config;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use models::probe_result::ProbeResult;
pub use services::errors::ProbeError;
pub use services::tls_handshake::client_handshake::probe;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::ProbeConfig>,
    /// Bounds how many probes run at once across all requests.
    pub limiter: Arc<Semaphore>,
}

impl AppState {
    pub fn new(config: config::ProbeConfig) -> Self {
        let limiter = Arc::new(Semaphore::new(config.max_concurrency));
        AppState {
            config: Arc::new(config),
            limiter,
        }
    }
}
