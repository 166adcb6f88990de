//! Marquee Server: axum web page and JSON API over the repertoire service.

pub mod api;
pub mod error;
pub mod page;

use std::net::SocketAddr;
use std::sync::Arc;

use marquee_enrich::RepertoireService;

pub use error::{AppError, AppResult};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RepertoireService>,
}

impl AppState {
    pub fn new(service: RepertoireService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Bind `addr` and serve until the process is stopped.
pub async fn run_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, api::router(state)).await?;
    Ok(())
}
