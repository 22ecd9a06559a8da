//! Login sessions
//!
//! Sessions ride on `tower-sessions`: the [`SessionManagerLayer`] issues and
//! reads the HttpOnly cookie, and the session id doubles as the bearer token
//! handed out at login. Both paths resolve against the same
//! [`MemorySessionStore`].

use crate::config::SessionConfig;
use crate::core::auth::unauthorized;
use crate::core::error::{AppError, AppResult};
use crate::core::model::UserIdentity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use tower_sessions::cookie::SameSite;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store;
use tower_sessions::{Expiry, Session, SessionManagerLayer, SessionStore};

/// Session key holding the logged-in [`UserIdentity`]
pub const SESSION_USER_KEY: &str = "material_order:user";

/// A session issued at login
#[derive(Debug, Clone, Serialize)]
pub struct LoginSession {
    pub token: String,
    pub user: UserIdentity,
    pub expires_at: DateTime<Utc>,
}

/// In-memory session store
///
/// Expired records are never returned and are dropped on every write.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    records: Arc<Mutex<HashMap<Id, Record>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, including expired ones not yet swept
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn is_active(record: &Record) -> bool {
    record.expiry_date > OffsetDateTime::now_utc()
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let mut records = self.records.lock().await;
        records.retain(|_, r| is_active(r));
        while records.contains_key(&record.id) {
            record.id = Id::default();
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let mut records = self.records.lock().await;
        records.retain(|_, r| is_active(r));
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let records = self.records.lock().await;
        Ok(records.get(session_id).filter(|r| is_active(r)).cloned())
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.records.lock().await.remove(session_id);
        Ok(())
    }
}

/// Issues, resolves and ends login sessions
#[derive(Debug, Clone)]
pub struct SessionManager {
    store: MemorySessionStore,
    cookie_name: String,
    max_age: Duration,
}

impl SessionManager {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            store: MemorySessionStore::new(),
            cookie_name: config.cookie_name.clone(),
            max_age: Duration::seconds(config.max_age_secs),
        }
    }

    pub fn store(&self) -> &MemorySessionStore {
        &self.store
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn expiry(&self) -> Expiry {
        Expiry::OnInactivity(self.max_age)
    }

    /// Cookie layer for the router
    pub fn layer(&self) -> SessionManagerLayer<MemorySessionStore> {
        // Secure cookies need https, which local debug builds do not serve
        let secure_cookies = !cfg!(debug_assertions);

        SessionManagerLayer::new(self.store.clone())
            .with_name(self.cookie_name.clone())
            .with_path("/")
            .with_secure(secure_cookies)
            .with_same_site(SameSite::Lax)
            .with_http_only(true)
            .with_expiry(self.expiry())
    }

    /// Bind `user` to the request's session under a fresh id
    pub async fn start(&self, session: &Session, user: &UserIdentity) -> AppResult<LoginSession> {
        session.cycle_id().await?;
        session.insert(SESSION_USER_KEY, user).await?;
        session.save().await?;

        let id = session
            .id()
            .ok_or_else(|| AppError::Internal("saved session has no id".to_string()))?;
        let expiry = session.expiry_date();
        let expires_at = DateTime::<Utc>::from_timestamp(expiry.unix_timestamp(), 0)
            .unwrap_or_else(Utc::now);

        tracing::info!(username = %user.username, "user logged in");
        Ok(LoginSession {
            token: id.to_string(),
            user: user.clone(),
            expires_at,
        })
    }

    /// Identity held by a cookie session, if it is logged in
    pub async fn user_in(&self, session: &Session) -> AppResult<Option<UserIdentity>> {
        Ok(session.get::<UserIdentity>(SESSION_USER_KEY).await?)
    }

    /// Resolve a bearer token to the identity of its session
    pub async fn user_for_token(&self, token: &str) -> AppResult<UserIdentity> {
        let id: Id = token.parse().map_err(|_| unauthorized("invalid session"))?;
        let record = self
            .store
            .load(&id)
            .await?
            .ok_or_else(|| unauthorized("invalid or expired session"))?;
        let value = record
            .data
            .get(SESSION_USER_KEY)
            .cloned()
            .ok_or_else(|| unauthorized("session is not logged in"))?;
        serde_json::from_value(value)
            .map_err(|e| AppError::Internal(format!("corrupt session record: {}", e)))
    }

    /// End the cookie session and revoke the bearer token, if any
    pub async fn end(&self, session: &Session, token: Option<&str>) -> AppResult<()> {
        if let Some(user) = self.user_in(session).await? {
            tracing::info!(username = %user.username, "user logged out");
        }
        session.flush().await?;

        if let Some(id) = token.and_then(|t| t.parse::<Id>().ok()) {
            self.store.delete(&id).await?;
            tracing::info!("bearer session revoked");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn manager() -> SessionManager {
        SessionManager::new(&SessionConfig::default())
    }

    fn request_session(manager: &SessionManager) -> Session {
        Session::new(None, Arc::new(manager.store().clone()), Some(manager.expiry()))
    }

    fn yamada() -> UserIdentity {
        UserIdentity {
            id: Uuid::new_v4(),
            username: "yamada".to_string(),
            display_name: "山田建設".to_string(),
        }
    }

    fn record(expiry_date: OffsetDateTime) -> Record {
        Record {
            id: Id::default(),
            data: HashMap::new(),
            expiry_date,
        }
    }

    #[tokio::test]
    async fn test_started_session_resolves_by_token_and_cookie() {
        let manager = manager();
        let session = request_session(&manager);

        let login = manager.start(&session, &yamada()).await.unwrap();

        assert!(login.expires_at > Utc::now());
        let by_token = manager.user_for_token(&login.token).await.unwrap();
        assert_eq!(by_token.username, "yamada");
        let by_cookie = manager.user_in(&session).await.unwrap();
        assert_eq!(by_cookie.map(|u| u.display_name).as_deref(), Some("山田建設"));
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_tokens_are_unauthorized() {
        let manager = manager();

        let err = manager.user_for_token("not-a-session").await.unwrap_err();
        assert!(err.is_unauthenticated());

        let err = manager
            .user_for_token(&Id::default().to_string())
            .await
            .unwrap_err();
        assert!(err.is_unauthenticated());
    }

    #[tokio::test]
    async fn test_end_revokes_token() {
        let manager = manager();
        let session = request_session(&manager);
        let login = manager.start(&session, &yamada()).await.unwrap();

        let other = request_session(&manager);
        manager.end(&other, Some(&login.token)).await.unwrap();

        assert!(manager.user_for_token(&login.token).await.unwrap_err().is_unauthenticated());
        assert!(manager.store().is_empty().await);

        // unknown token is not an error
        manager.end(&other, Some("unknown")).await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_records_are_not_loaded() {
        let store = MemorySessionStore::new();
        let mut expired = record(OffsetDateTime::now_utc() - Duration::minutes(1));
        store.create(&mut expired).await.unwrap();

        assert!(store.load(&expired.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_records_are_swept_on_write() {
        let store = MemorySessionStore::new();
        for _ in 0..5 {
            store
                .save(&record(OffsetDateTime::now_utc() - Duration::seconds(1)))
                .await
                .unwrap();
        }
        assert_eq!(store.len().await, 1);

        let mut live = record(OffsetDateTime::now_utc() + Duration::days(7));
        store.create(&mut live).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert!(store.load(&live.id).await.unwrap().is_some());
    }
}
