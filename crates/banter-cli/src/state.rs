//! Application state shared across CLI commands.
//!
//! Holds the session manager pinned to its concrete infrastructure: the
//! SQLite record store and the HTTP streaming transport.

use std::path::PathBuf;
use std::sync::Arc;

use banter_core::session::SessionManager;
use banter_infra::config::{load_client_config, resolve_api_key, resolve_data_dir};
use banter_infra::sqlite::pool::{DatabasePool, database_url};
use banter_infra::sqlite::records::SqliteRecordStore;
use banter_infra::transport::HttpTransport;

/// The session manager with production infrastructure plugged in.
pub type AppSessionManager = SessionManager<SqliteRecordStore, HttpTransport>;

/// Shared application state for CLI commands.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<AppSessionManager>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize application state: resolve the data directory, load client
    /// config, open the database, and wire up the session manager.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_client_config(&data_dir).await;
        let api_key = resolve_api_key();

        let pool = DatabasePool::new(&database_url(&data_dir)).await?;
        let store = SqliteRecordStore::new(pool);
        let transport = HttpTransport::new(config.base_url.clone());

        let session = SessionManager::new(store, transport, config, api_key);

        Ok(Self {
            session: Arc::new(session),
            data_dir,
        })
    }
}
