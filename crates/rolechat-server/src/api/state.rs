use rolechat_core::AppCore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::middleware::JwtVerifier;

/// Application state shared across all API handlers
#[derive(Clone)]
pub struct AppState {
    pub core: Arc<AppCore>,
    pub jwt: Arc<JwtVerifier>,
    /// Cancelled on server shutdown; live reply streams observe it as a
    /// client cancellation.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(core: Arc<AppCore>, jwt: JwtVerifier, shutdown: CancellationToken) -> Self {
        Self {
            core,
            jwt: Arc::new(jwt),
            shutdown,
        }
    }
}
