/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * `AppState` holds:
 * - `Store` - the mutation serializer and read path
 * - `StreamNotifier` - opens stream connections for `/api/stream`
 *
 * Both are cheap handles over `Arc`s, so cloning the state per request is
 * free. The store's publisher and the notifier's publisher are the same
 * instance, which is what lets a local commit reach local streams.
 *
 * # State Extraction
 *
 * ```rust,no_run
 * use axum::extract::State;
 * use msgrelay::backend::store::Store;
 *
 * async fn handler(State(store): State<Store>) {
 *     let _revision = store.current_revision();
 * }
 * ```
 */
use axum::extract::FromRef;

use crate::backend::realtime::notifier::StreamNotifier;
use crate::backend::store::Store;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub notifier: StreamNotifier,
}

impl AppState {
    /// State whose notifier is wired to `store`'s publisher and backend
    pub fn new(store: Store, notifier: StreamNotifier) -> Self {
        Self { store, notifier }
    }
}

/// Allows handlers to extract `State<Store>`
impl FromRef<AppState> for Store {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.store.clone()
    }
}

/// Allows handlers to extract `State<StreamNotifier>`
impl FromRef<AppState> for StreamNotifier {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.notifier.clone()
    }
}
