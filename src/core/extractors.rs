//! Axum extractors for request identity
//!
//! [`CurrentUser`] resolves the authenticated user from the bearer header or
//! the session cookie before a handler body runs, so unauthenticated requests
//! never reach the store.

use crate::core::auth::{bearer_token, unauthorized};
use crate::core::error::AppError;
use crate::core::model::UserIdentity;
use crate::core::session::SessionManager;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use std::sync::Arc;
use tower_sessions::Session;

/// Shared handle to the session manager
pub type SharedSessions = Arc<SessionManager>;

/// The authenticated user behind the request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserIdentity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    SharedSessions: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let sessions = SharedSessions::from_ref(state);

        if let Some(token) = bearer_token(&parts.headers) {
            return Ok(CurrentUser(sessions.user_for_token(&token).await?));
        }

        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| unauthorized("no session"))?;
        let user = sessions
            .user_in(&session)
            .await?
            .ok_or_else(|| unauthorized("no session"))?;
        Ok(CurrentUser(user))
    }
}

/// The bearer token, if the request carries one
#[derive(Debug, Clone)]
pub struct BearerToken(pub Option<String>);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(BearerToken(bearer_token(&parts.headers)))
    }
}
