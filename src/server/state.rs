//! Shared application state

use axum::extract::FromRef;
use std::sync::Arc;

use crate::core::auth::AuthProvider;
use crate::core::extractors::SharedSessions;
use crate::service::OrderLifecycleService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<OrderLifecycleService>,
    pub auth: Arc<dyn AuthProvider>,
    pub sessions: SharedSessions,
}

impl FromRef<AppState> for SharedSessions {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}
