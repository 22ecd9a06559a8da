//! Material order server
//!
//! Loads configuration (see `MATERIAL_ORDER_CONFIG`), seeds the catalog into
//! an in-memory store and serves the order API.

use anyhow::Result;
use material_order::prelude::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,material_order=debug,tower_http=info")),
        )
        .init();

    let config = AppConfig::load()?;

    let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
    if config.seed_catalog {
        let count = seed_catalog(store.as_ref()).await?;
        tracing::info!(materials = count, "catalog seeded");
    }

    let auth = ConfigAuthProvider::new(&config.users);
    tracing::info!(users = config.users.len(), "auth provider ready");

    ServerBuilder::new()
        .with_shared_store(store)
        .with_auth(auth)
        .with_sessions(config.session.clone())
        .with_layout(config.layout.clone())
        .serve(&config.server.bind)
        .await
}
