//! Authentication
//!
//! An [`AuthProvider`] turns credentials into a [`UserIdentity`]. Keeping the
//! identity behind a session is the job of [`crate::core::session`].

use crate::config::UserConfig;
use crate::core::error::{AppError, AppResult, RequestError};
use crate::core::model::UserIdentity;
use async_trait::async_trait;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use std::collections::HashMap;
use uuid::Uuid;

/// Trait for auth providers
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Check credentials and return the identity behind them
    async fn authenticate(&self, username: &str, password: &str) -> AppResult<UserIdentity>;
}

pub(crate) fn unauthorized(message: &str) -> AppError {
    AppError::Request(RequestError::Unauthorized {
        message: message.to_string(),
    })
}

/// Token from an `Authorization: Bearer` header
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

struct Account {
    password: String,
    identity: UserIdentity,
}

/// Auth provider backed by the configured credential table
pub struct ConfigAuthProvider {
    accounts: HashMap<String, Account>,
}

impl ConfigAuthProvider {
    pub fn new(users: &[UserConfig]) -> Self {
        let accounts = users
            .iter()
            .map(|user| {
                let account = Account {
                    password: user.password.clone(),
                    identity: UserIdentity {
                        id: user.id.unwrap_or_else(Uuid::new_v4),
                        username: user.username.clone(),
                        display_name: user.display_name.clone(),
                    },
                };
                (user.username.clone(), account)
            })
            .collect();

        Self { accounts }
    }

    /// Identity of a configured user, if any
    pub fn identity_of(&self, username: &str) -> Option<UserIdentity> {
        self.accounts.get(username).map(|a| a.identity.clone())
    }
}

#[async_trait]
impl AuthProvider for ConfigAuthProvider {
    async fn authenticate(&self, username: &str, password: &str) -> AppResult<UserIdentity> {
        self.accounts
            .get(username.trim())
            .filter(|a| a.password == password)
            .map(|a| a.identity.clone())
            .ok_or_else(|| {
                tracing::warn!(username = %username, "login rejected");
                unauthorized("invalid username or password")
            })
    }
}
