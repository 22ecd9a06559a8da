//! ServerBuilder for assembling the order API

use super::handlers;
use super::state::AppState;
use crate::config::SessionConfig;
use crate::core::auth::AuthProvider;
use crate::core::session::SessionManager;
use crate::core::store::Store;
use crate::print::LayoutSettings;
use crate::service::OrderLifecycleService;
use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Build the full router over an existing state
pub fn build_router(state: AppState) -> Router {
    let session_layer = state.sessions.layer();
    let api = Router::new()
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/me", get(handlers::me))
        .route("/categories", get(handlers::list_categories))
        .route(
            "/materials",
            get(handlers::list_materials).post(handlers::create_material),
        )
        .route(
            "/orders",
            get(handlers::list_orders).post(handlers::create_order),
        )
        .route("/orders/stats", get(handlers::order_stats))
        .route("/orders/preview", post(handlers::preview_order))
        .route(
            "/orders/{id}",
            get(handlers::get_order)
                .put(handlers::update_order)
                .delete(handlers::delete_order),
        )
        .route("/orders/{id}/copy", post(handlers::copy_order))
        .route("/orders/{id}/print", get(handlers::print_order));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/healthz", get(handlers::health_check))
        .nest("/api", api)
        .with_state(state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
}

/// Builder for the HTTP server
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_store(InMemoryStore::new())
///     .with_auth(ConfigAuthProvider::new(&config.users))
///     .with_sessions(config.session.clone())
///     .with_layout(config.layout.clone())
///     .build()?;
/// ```
pub struct ServerBuilder {
    store: Option<Arc<dyn Store>>,
    auth: Option<Arc<dyn AuthProvider>>,
    sessions: SessionConfig,
    layout: LayoutSettings,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            auth: None,
            sessions: SessionConfig::default(),
            layout: LayoutSettings::default(),
        }
    }

    /// Set the store (required)
    pub fn with_store(mut self, store: impl Store + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Use an already shared store, e.g. one that was seeded beforehand
    pub fn with_shared_store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the auth provider (required)
    pub fn with_auth(mut self, auth: impl AuthProvider + 'static) -> Self {
        self.auth = Some(Arc::new(auth));
        self
    }

    /// Session cookie name and lifetime
    pub fn with_sessions(mut self, sessions: SessionConfig) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn with_layout(mut self, layout: LayoutSettings) -> Self {
        self.layout = layout;
        self
    }

    /// Build the application state without a router
    pub fn build_state(&mut self) -> Result<AppState> {
        let store = self
            .store
            .take()
            .ok_or_else(|| anyhow::anyhow!("Store is required. Call .with_store()"))?;
        let auth = self
            .auth
            .take()
            .ok_or_else(|| anyhow::anyhow!("AuthProvider is required. Call .with_auth()"))?;

        Ok(AppState {
            service: Arc::new(OrderLifecycleService::new(store, self.layout.clone())),
            auth,
            sessions: Arc::new(SessionManager::new(&self.sessions)),
        })
    }

    pub fn build(mut self) -> Result<Router> {
        let state = self.build_state()?;
        Ok(build_router(state))
    }

    /// Serve the application with graceful shutdown on SIGTERM or Ctrl+C
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
