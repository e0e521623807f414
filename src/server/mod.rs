use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use crate::storage::SqliteStore;

pub mod routes;

/// Server state
///
/// The connection is not `Sync`, so requests take turns on it.
pub struct AppState {
    pub store: Mutex<SqliteStore>,
}

impl AppState {
    pub fn new(store: SqliteStore) -> Arc<Self> {
        Arc::new(Self {
            store: Mutex::new(store),
        })
    }
}

/// Build the HTTP router over an explicitly constructed store
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/create_class", post(routes::create_class))
        .route("/get_class", get(routes::list_classes))
        .route("/get_class/{identificador}", get(routes::list_nodes_of_class))
        .route("/get_class_attributes/{identificador}", get(routes::get_class_attributes))
        .route("/delete_class/{identificador}", delete(routes::delete_class))
        .route("/create_ativo", post(routes::create_node))
        .route("/get_ativo/{identificador}", get(routes::get_node))
        .route("/update_ativo", put(routes::update_node))
        .route("/delete_ativo/{identificador}", delete(routes::delete_node))
        .route("/create_vinculo", post(routes::create_edge))
        .route("/get_vinculos/{identificador}", get(routes::list_edges))
        .route("/delete_vinculos", delete(routes::delete_edges))
        .route("/stats", get(routes::get_stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind the listening socket; `local_addr` on the result gives the real port
pub async fn bind(addr: SocketAddr) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    Ok(listener)
}

pub async fn start_server(listener: TcpListener, store: SqliteStore) -> anyhow::Result<()> {
    let app = router(AppState::new(store));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_reports_assigned_port() {
        let listener = bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let addr = listener.local_addr().unwrap();

        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }
}
