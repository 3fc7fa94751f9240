/**
 * Server Initialization
 *
 * This module opens the configured store backend and wires the
 * application together.
 *
 * # Initialization Process
 *
 * 1. Open the store backend named by `ServerConfig::store`
 * 2. Wrap it in a `Store` (mutation serializer + revision publisher)
 * 3. Create the `StreamNotifier` over the same publisher and backend
 * 4. Create and configure the router
 *
 * Unlike optional services, the store is required: if the backend cannot
 * be opened the server does not start.
 */
use axum::Router;
use std::sync::Arc;

use crate::backend::realtime::notifier::StreamNotifier;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{ServerConfig, StoreConfig};
use crate::backend::server::state::AppState;
use crate::backend::store::{JsonFileStore, MemoryStore, PgStore, Store, StoreBackend, StoreError};

/// Open the durable backend described by `config`
pub async fn open_backend(config: &StoreConfig) -> Result<Arc<dyn StoreBackend>, StoreError> {
    let backend: Arc<dyn StoreBackend> = match config {
        StoreConfig::Memory => {
            tracing::warn!("[Server] Using in-memory store, data is lost on restart");
            Arc::new(MemoryStore::new())
        }
        StoreConfig::File { path } => {
            tracing::info!("[Server] Using JSON file store at {}", path.display());
            Arc::new(JsonFileStore::open(path.clone()).await?)
        }
        StoreConfig::Postgres { url } => Arc::new(PgStore::connect(url).await?),
    };
    Ok(backend)
}

/// Build the application state over an already opened store
pub fn build_state(store: Store, config: &ServerConfig) -> AppState {
    let notifier = StreamNotifier::for_store(&store, config.notifier);
    AppState::new(store, notifier)
}

/// Create and configure the Axum application
///
/// Returns the router and the state behind it. The caller keeps the state
/// to shut the stream notifier down when the server stops.
///
/// # Errors
///
/// Returns the backend error if the store cannot be opened.
pub async fn create_app(config: &ServerConfig) -> Result<(Router<()>, AppState), StoreError> {
    tracing::info!("[Server] Initializing msgrelay backend ({} store)", config.store.kind());

    let backend = open_backend(&config.store).await?;
    let store = Store::new(backend);
    let app_state = build_state(store, config);

    let app = create_router(app_state.clone());
    tracing::info!(
        "[Server] Router configured (heartbeat {:?}, poll {:?})",
        config.notifier.heartbeat_interval,
        config.notifier.poll_interval
    );

    Ok((app, app_state))
}
