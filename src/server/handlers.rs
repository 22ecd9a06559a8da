//! HTTP handlers for auth, catalog and order routes

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use tower_sessions::Session;

use super::state::AppState;
use crate::core::error::AppResult;
use crate::core::extractors::{BearerToken, CurrentUser};
use crate::core::model::{Category, Material, Order, UserIdentity};
use crate::core::session::LoginSession;
use crate::core::validation::{MaterialInput, OrderInput, ValidJson};
use crate::print::PrintOptions;
use crate::service::{OrderQuery, OrderStats};

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Query for the material listing
#[derive(Debug, Default, Deserialize)]
pub struct MaterialQuery {
    #[serde(default)]
    pub temporary_for: Option<Uuid>,
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// === Auth ===

/// Exchange credentials for a session; the token is returned and the session
/// layer sets it as a cookie
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<LoginSession>> {
    let user = state
        .auth
        .authenticate(body.username.trim(), &body.password)
        .await?;
    Ok(Json(state.sessions.start(&session, &user).await?))
}

/// Close the caller's session; the session layer clears the cookie
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    BearerToken(token): BearerToken,
    session: Session,
) -> AppResult<StatusCode> {
    state.sessions.end(&session, token.as_deref()).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserIdentity> {
    Json(user)
}

// === Catalog ===

pub async fn list_categories(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(state.service.list_categories().await?))
}

pub async fn list_materials(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<MaterialQuery>,
) -> AppResult<Json<Vec<Material>>> {
    let materials = state
        .service
        .list_materials(&user, query.temporary_for)
        .await?;
    Ok(Json(materials))
}

pub async fn create_material(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidJson(input): ValidJson<MaterialInput>,
) -> AppResult<(StatusCode, Json<Material>)> {
    let material = state.service.create_material(&user, input).await?;
    Ok((StatusCode::CREATED, Json(material)))
}

// === Orders ===

pub async fn list_orders(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<OrderQuery>,
) -> AppResult<Json<Value>> {
    let orders = state.service.list(&user, &query).await?;
    Ok(Json(json!({
        "count": orders.len(),
        "orders": orders,
    })))
}

pub async fn create_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidJson(input): ValidJson<OrderInput>,
) -> AppResult<(StatusCode, Json<Order>)> {
    let order = state.service.create(&user, input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn order_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<OrderStats>> {
    Ok(Json(state.service.stats(&user, Utc::now()).await?))
}

/// Render an unsaved order; nothing is persisted
pub async fn preview_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(options): Query<PrintOptions>,
    ValidJson(input): ValidJson<OrderInput>,
) -> AppResult<Html<String>> {
    let html = state.service.preview(&user, input, &options).await?;
    Ok(Html(html))
}

pub async fn get_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Order>> {
    Ok(Json(state.service.get(&user, &id).await?))
}

pub async fn update_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    ValidJson(input): ValidJson<OrderInput>,
) -> AppResult<Json<Order>> {
    Ok(Json(state.service.update(&user, &id, input).await?))
}

pub async fn delete_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.service.delete(&user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn copy_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<Order>)> {
    let order = state.service.copy(&user, &id).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Printable HTML; the first print marks the order completed
pub async fn print_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Query(options): Query<PrintOptions>,
) -> AppResult<Html<String>> {
    let html = state.service.print(&user, &id, &options).await?;
    Ok(Html(html))
}
