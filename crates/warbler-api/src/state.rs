use std::sync::Arc;

use tracing::error;
use warbler_db::Database;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    /// Signs the session cookie.
    pub secret_key: String,
}

/// Run blocking DB work off the async runtime.
pub async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> warbler_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    let out = tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.to_string())
        })??;
    Ok(out)
}
