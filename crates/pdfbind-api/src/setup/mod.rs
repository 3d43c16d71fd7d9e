//! Application wiring: storage construction, router assembly, server start.

pub mod routes;
pub mod server;

use std::sync::Arc;

use pdfbind_core::Config;
use pdfbind_storage::create_storage;

use crate::state::AppState;

/// Build the shared state and the router from configuration.
pub async fn initialize_app(
    config: Config,
) -> Result<(Arc<AppState>, axum::Router), anyhow::Error> {
    let storage = create_storage(&config).await?;
    tracing::info!(backend = ?storage.backend_type(), "Storage initialized");

    let state = Arc::new(AppState { config, storage });
    let router = routes::create_router(state.clone())?;

    Ok((state, router))
}
