//! REST surface over the patient record store.

use std::sync::Arc;

use axum::Router;
use contact_store::PatientStore;
use tokio::sync::Mutex;

pub mod config;
mod error;
mod middleware;
mod routes;

pub use config::ServerConfig;
pub use error::ApiError;
pub use middleware::REQUEST_ID_HEADER;

/// Shared handler state. The store's single SQLite connection is serialized
/// behind an async mutex.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<PatientStore>>,
}

impl AppState {
    pub fn new(store: PatientStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    routes::router()
        .layer(axum::middleware::from_fn(middleware::request_tracing))
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn serve(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Patient service listening on http://{addr}");
    }
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
