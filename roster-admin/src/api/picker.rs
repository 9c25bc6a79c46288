//! Image picker API

use axum::{extract::State, Json};
use roster_common::model::Member;
use roster_common::picker::ImageTarget;
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PickerState {
    pub open: bool,
    pub target: Option<ImageTarget>,
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct SelectResponse {
    /// `None` when the picker was not open
    pub target: Option<ImageTarget>,
    pub member: Option<Member>,
}

/// GET /api/picker
pub async fn picker_state(State(state): State<AppState>) -> Json<PickerState> {
    let picker = state.picker.lock().await;
    Json(PickerState {
        open: picker.is_open(),
        target: picker.target(),
    })
}

/// POST /api/picker/open
pub async fn open_picker(
    State(state): State<AppState>,
    Json(target): Json<ImageTarget>,
) -> Json<PickerState> {
    let mut picker = state.picker.lock().await;
    picker.open(target);
    Json(PickerState {
        open: true,
        target: Some(target),
    })
}

/// POST /api/picker/select
pub async fn select_image(
    State(state): State<AppState>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<SelectResponse>, ApiError> {
    let mut session = state.session.lock().await;
    let mut picker = state.picker.lock().await;
    let target = picker.select(&request.url, &mut session)?;
    let member = target.and_then(|t| session.member(t.owner).cloned());
    Ok(Json(SelectResponse { target, member }))
}

/// POST /api/picker/close
pub async fn close_picker(State(state): State<AppState>) -> Json<PickerState> {
    state.picker.lock().await.close();
    Json(PickerState {
        open: false,
        target: None,
    })
}
