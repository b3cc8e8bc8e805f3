// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the registry REST API.
//!
//! Handlers are thin: they pull the caller's organization from the auth
//! middleware, hand the payload to the [`Registry`](smelinx_registry::Registry)
//! and map the result onto a status code.

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use smelinx_core::{Api, ApiPatch, CascadeSummary, Consumer, Notification, Version};
use smelinx_registry::{
    NewApi, NewConsumer, NewNotification, NewVersion, NotificationStatusChange,
    VersionStatusChange,
};

use crate::auth::OrgContext;
use crate::error::ApiError;
use crate::server::AppState;

type ApiResult<T> = Result<T, ApiError>;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
}

/// Response body for DELETE /apis/{id}.
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub status: &'static str,
    pub removed: CascadeSummary,
}

fn created<T: Serialize>(body: T) -> Response {
    (StatusCode::CREATED, Json(body)).into_response()
}

/// GET /health (unauthenticated)
pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started.elapsed().as_secs(),
    })
}

// --- APIs ---

pub async fn create_api(
    State(state): State<AppState>,
    Extension(OrgContext(org)): Extension<OrgContext>,
    payload: Result<Json<NewApi>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(req) = payload?;
    let api = state.registry.create_api(&org, req).await?;
    Ok(created(api))
}

pub async fn list_apis(
    State(state): State<AppState>,
    Extension(OrgContext(org)): Extension<OrgContext>,
) -> ApiResult<Json<Vec<Api>>> {
    Ok(Json(state.registry.list_apis(&org).await?))
}

pub async fn get_api(
    State(state): State<AppState>,
    Extension(OrgContext(org)): Extension<OrgContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Api>> {
    Ok(Json(state.registry.get_api(&org, &id).await?))
}

pub async fn update_api(
    State(state): State<AppState>,
    Extension(OrgContext(org)): Extension<OrgContext>,
    Path(id): Path<String>,
    payload: Result<Json<ApiPatch>, JsonRejection>,
) -> ApiResult<Json<Api>> {
    let Json(patch) = payload?;
    Ok(Json(state.registry.update_api(&org, &id, patch).await?))
}

pub async fn delete_api(
    State(state): State<AppState>,
    Extension(OrgContext(org)): Extension<OrgContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeletedResponse>> {
    let removed = state.registry.delete_api(&org, &id).await?;
    Ok(Json(DeletedResponse {
        status: "deleted",
        removed,
    }))
}

// --- Versions ---

pub async fn create_version(
    State(state): State<AppState>,
    Extension(OrgContext(org)): Extension<OrgContext>,
    Path(api_id): Path<String>,
    payload: Result<Json<NewVersion>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(req) = payload?;
    let version = state.registry.create_version(&org, &api_id, req).await?;
    Ok(created(version))
}

pub async fn list_versions(
    State(state): State<AppState>,
    Extension(OrgContext(org)): Extension<OrgContext>,
    Path(api_id): Path<String>,
) -> ApiResult<Json<Vec<Version>>> {
    Ok(Json(state.registry.list_versions(&org, &api_id).await?))
}

pub async fn update_version(
    State(state): State<AppState>,
    Extension(OrgContext(org)): Extension<OrgContext>,
    Path(id): Path<String>,
    payload: Result<Json<VersionStatusChange>, JsonRejection>,
) -> ApiResult<Json<Version>> {
    let Json(req) = payload?;
    Ok(Json(
        state.registry.update_version_status(&org, &id, req).await?,
    ))
}

pub async fn delete_version(
    State(state): State<AppState>,
    Extension(OrgContext(org)): Extension<OrgContext>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.registry.delete_version(&org, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Notifications ---

pub async fn create_notification(
    State(state): State<AppState>,
    Extension(OrgContext(org)): Extension<OrgContext>,
    Path(api_id): Path<String>,
    payload: Result<Json<NewNotification>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(req) = payload?;
    let notification = state
        .registry
        .create_notification(&org, &api_id, req)
        .await?;
    Ok(created(notification))
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(OrgContext(org)): Extension<OrgContext>,
    Path(api_id): Path<String>,
) -> ApiResult<Json<Vec<Notification>>> {
    Ok(Json(
        state.registry.list_notifications(&org, &api_id).await?,
    ))
}

pub async fn update_notification(
    State(state): State<AppState>,
    Extension(OrgContext(org)): Extension<OrgContext>,
    Path(id): Path<String>,
    payload: Result<Json<NotificationStatusChange>, JsonRejection>,
) -> ApiResult<Json<Notification>> {
    let Json(req) = payload?;
    Ok(Json(
        state
            .registry
            .update_notification_status(&org, &id, req)
            .await?,
    ))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    Extension(OrgContext(org)): Extension<OrgContext>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.registry.delete_notification(&org, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Consumers ---

pub async fn create_consumer(
    State(state): State<AppState>,
    Extension(OrgContext(org)): Extension<OrgContext>,
    Path(api_id): Path<String>,
    payload: Result<Json<NewConsumer>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(req) = payload?;
    let consumer = state.registry.create_consumer(&org, &api_id, req).await?;
    Ok(created(consumer))
}

pub async fn list_consumers(
    State(state): State<AppState>,
    Extension(OrgContext(org)): Extension<OrgContext>,
    Path(api_id): Path<String>,
) -> ApiResult<Json<Vec<Consumer>>> {
    Ok(Json(state.registry.list_consumers(&org, &api_id).await?))
}

pub async fn delete_consumer(
    State(state): State<AppState>,
    Extension(OrgContext(org)): Extension<OrgContext>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.registry.delete_consumer(&org, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fallback for unknown routes.
pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "route not found" }))).into_response()
}
