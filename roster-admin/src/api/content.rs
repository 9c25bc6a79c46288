//! Page content API

use axum::{
    extract::{Path, State},
    Json,
};
use roster_common::content::{PageContent, SectionContent};
use serde::Serialize;

use super::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PageList {
    pub pages: Vec<String>,
}

/// GET /api/content
pub async fn list_pages(State(state): State<AppState>) -> Result<Json<PageList>, ApiError> {
    Ok(Json(PageList {
        pages: state.content.list_pages().await?,
    }))
}

/// GET /api/content/:page
pub async fn get_page(
    State(state): State<AppState>,
    Path(page): Path<String>,
) -> Result<Json<PageContent>, ApiError> {
    Ok(Json(state.content.read_page(&page).await?))
}

/// PUT /api/content/:page/:section
///
/// Fields merge into the stored section; the whole page is returned.
pub async fn put_section(
    State(state): State<AppState>,
    Path((page, section)): Path<(String, String)>,
    Json(fields): Json<SectionContent>,
) -> Result<Json<PageContent>, ApiError> {
    Ok(Json(state.content.write_section(&page, &section, fields).await?))
}
