//! Axum route handlers for chat sessions.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::chat::{ChatReply, ChatSnapshot, SourceEntry};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveSourceRequest {
    pub uri: String,
}

/// POST /api/v1/chats
pub async fn handle_create_chat(State(state): State<AppState>) -> (StatusCode, Json<ChatSnapshot>) {
    (StatusCode::CREATED, Json(state.chats.create().await))
}

/// GET /api/v1/chats/:id?q=
pub async fn handle_get_chat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ChatSnapshot>, AppError> {
    Ok(Json(state.chats.snapshot(id, &query.q).await?))
}

/// POST /api/v1/chats/:id/messages
///
/// Responds once the model has answered. AI failures are part of the
/// conversation and come back as a normal reply.
pub async fn handle_send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SendRequest>,
) -> Result<Json<ChatReply>, AppError> {
    Ok(Json(state.chats.send(id, &request.text).await?))
}

/// GET /api/v1/chats/:id/sources
pub async fn handle_list_sources(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SourceEntry>>, AppError> {
    Ok(Json(state.chats.sources(id).await?))
}

/// POST /api/v1/chats/:id/sources/save
pub async fn handle_save_source(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SaveSourceRequest>,
) -> Result<Json<SourceEntry>, AppError> {
    Ok(Json(state.chats.save_source(id, request.uri.trim()).await?))
}
