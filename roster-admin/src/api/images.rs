//! Image library API
//!
//! Uploads are the raw request body; the original file name travels in the
//! `name` query parameter.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use roster_common::library::StoredImage;
use serde::Deserialize;

use super::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    pub name: String,
}

/// GET /api/images
pub async fn list_images(State(state): State<AppState>) -> Result<Json<Vec<StoredImage>>, ApiError> {
    Ok(Json(state.library.list().await?))
}

/// POST /api/images?name=<file name>
pub async fn upload_image(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<StoredImage>), ApiError> {
    let image = state.library.upload(&query.name, &body).await?;
    Ok((StatusCode::CREATED, Json(image)))
}

/// DELETE /api/images/:key
pub async fn delete_image(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.library.delete(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}
