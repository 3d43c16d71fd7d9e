//! Shared application state.

use pdfbind_core::Config;
use pdfbind_storage::Storage;
use std::sync::Arc;

/// State shared by all request handlers.
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
}
