// handlers/notes.rs - /api/notes handlers
//
// Every handler here sits behind jwt_auth_middleware, so an Identity is
// always present in the request extensions.

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    Json,
};
use serde::Serialize;

use crate::auth::Identity;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::notes::{CreateNote, ListQuery, NoteList, NoteView, UpdateNote};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct NotePayload {
    pub note: NoteView,
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::invalid_json(rejection.body_text()))
}

/// POST /api/notes - Create a note owned by the caller
pub async fn create_note(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<CreateNote>, JsonRejection>,
) -> ApiResult<NotePayload> {
    let fields = json_body(payload)?;
    let note = state.notes.create(&identity, fields).await?;

    Ok(ApiResponse::created(NotePayload { note }).with_message("Note created successfully"))
}

/// GET /api/notes - List the caller's notes, newest first
///
/// Query: `category`, `isPinned` ("true"/"false"), `tags` (comma-separated or repeated)
pub async fn list_notes(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<NoteList> {
    let list = state.notes.list(&identity, ListQuery::from_pairs(pairs)).await?;

    Ok(ApiResponse::success(list))
}

/// GET /api/notes/:id - Fetch one of the caller's notes
pub async fn get_note(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<NotePayload> {
    let note = state.notes.get(&identity, &id).await?;

    Ok(ApiResponse::success(NotePayload { note }))
}

/// PUT /api/notes/:id - Partially update one of the caller's notes
pub async fn update_note(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateNote>, JsonRejection>,
) -> ApiResult<NotePayload> {
    let changes = json_body(payload)?;
    let note = state.notes.update(&identity, &id, changes).await?;

    Ok(ApiResponse::success(NotePayload { note }).with_message("Note updated successfully"))
}

/// DELETE /api/notes/:id - Delete one of the caller's notes
pub async fn delete_note(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.notes.delete(&identity, &id).await?;

    Ok(ApiResponse::message_only("Note deleted successfully"))
}
