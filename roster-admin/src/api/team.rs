//! Team editing API
//!
//! Mutations act on the in-memory edit session; nothing reaches the store
//! until `POST /api/team/save`, except deletes of already-saved records,
//! which are applied to the store immediately.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use roster_common::model::{Direction, Identifier, Member, MemberPatch, Section, SectionPatch};
use roster_common::reconcile::SaveReport;
use roster_common::session::{ImpactSummary, MemberRemoval, RemovedSection};
use roster_common::{EditSession, Error};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::ApiError;
use crate::AppState;

/// A section with its members in display order
#[derive(Debug, Serialize)]
pub struct SectionView {
    #[serde(flatten)]
    pub section: Section,
    pub members: Vec<Member>,
}

/// Session snapshot returned to the admin UI
#[derive(Debug, Serialize)]
pub struct TeamView {
    pub sections: Vec<SectionView>,
    pub saving: bool,
    pub has_pending: bool,
}

impl TeamView {
    pub fn build(session: &EditSession, saving: bool) -> Self {
        let sections = session
            .sections()
            .iter()
            .map(|section| SectionView {
                section: section.clone(),
                members: session.members_of(section.id).into_iter().cloned().collect(),
            })
            .collect();
        Self {
            sections,
            saving,
            has_pending: session.has_pending(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub report: SaveReport,
    pub team: TeamView,
}

#[derive(Debug, Deserialize)]
pub struct NewSection {
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub direction: Direction,
}

#[derive(Debug, Serialize)]
pub struct MoveResponse {
    pub moved: bool,
    pub order: Vec<Identifier>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
pub struct RemovalResponse {
    pub removal: MemberRemoval,
}

fn parse_id(raw: &str) -> Result<Identifier, ApiError> {
    Ok(raw.parse::<Identifier>()?)
}

/// GET /api/team
///
/// A save holds the session for its whole duration; while one is
/// outstanding this answers 409 straight away instead of waiting for it.
pub async fn get_team(State(state): State<AppState>) -> Result<Json<TeamView>, ApiError> {
    let session = match state.session.try_lock() {
        Ok(session) => session,
        Err(_) if state.engine.is_saving() => return Err(Error::SaveInProgress.into()),
        Err(_) => state.session.lock().await,
    };
    Ok(Json(TeamView::build(&session, state.engine.is_saving())))
}

/// POST /api/team/load
///
/// Discards unsaved edits and reloads canonical state.
pub async fn load_team(State(state): State<AppState>) -> Result<Json<TeamView>, ApiError> {
    let mut session = state.session.lock().await;
    state.engine.reload(&mut session).await?;
    Ok(Json(TeamView::build(&session, false)))
}

/// POST /api/team/save
///
/// Returns 409 immediately while another save is outstanding.
pub async fn save_team(State(state): State<AppState>) -> Result<Json<SaveResponse>, ApiError> {
    if state.engine.is_saving() {
        return Err(Error::SaveInProgress.into());
    }
    let mut session = state.session.lock().await;
    let report = state.engine.save(&mut session).await?;
    info!("Team saved from admin API");
    Ok(Json(SaveResponse {
        report,
        team: TeamView::build(&session, false),
    }))
}

/// POST /api/sections
pub async fn add_section(
    State(state): State<AppState>,
    Json(request): Json<NewSection>,
) -> Result<(StatusCode, Json<Section>), ApiError> {
    let mut session = state.session.lock().await;
    let section = session.add_section(&request.name, &request.display_name)?;
    Ok((StatusCode::CREATED, Json(section)))
}

/// PATCH /api/sections/:id
pub async fn update_section(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<SectionPatch>,
) -> Result<Json<Section>, ApiError> {
    let id = parse_id(&id)?;
    let mut session = state.session.lock().await;
    session.update_section(id, patch)?;
    let section = session
        .section(id)
        .cloned()
        .ok_or_else(|| Error::NotFound(format!("section {}", id)))?;
    Ok(Json(section))
}

/// POST /api/sections/:id/move
pub async fn move_section(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<MoveResponse>, ApiError> {
    let id = parse_id(&id)?;
    let mut session = state.session.lock().await;
    let moved = session.move_section(id, request.direction)?;
    Ok(Json(MoveResponse {
        moved,
        order: session.sections().iter().map(|s| s.id).collect(),
    }))
}

/// GET /api/sections/:id/impact
pub async fn section_impact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ImpactSummary>, ApiError> {
    let id = parse_id(&id)?;
    let session = state.session.lock().await;
    Ok(Json(session.preview_remove_section(id)?))
}

/// DELETE /api/sections/:id?confirm=true
pub async fn delete_section(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<RemovedSection>, ApiError> {
    let id = parse_id(&id)?;
    let mut session = state.session.lock().await;
    let removed = state
        .engine
        .delete_section(&mut session, id, query.confirm)
        .await?;
    Ok(Json(removed))
}

/// POST /api/sections/:id/members
pub async fn add_member(
    State(state): State<AppState>,
    Path(section_id): Path<String>,
) -> Result<(StatusCode, Json<Member>), ApiError> {
    let section_id = parse_id(&section_id)?;
    let mut session = state.session.lock().await;
    let member = session.add_member(section_id)?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// PATCH /api/members/:id
pub async fn update_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<MemberPatch>,
) -> Result<Json<Member>, ApiError> {
    let id = parse_id(&id)?;
    let mut session = state.session.lock().await;
    session.update_member(id, patch)?;
    let member = session
        .member(id)
        .cloned()
        .ok_or_else(|| Error::NotFound(format!("member {}", id)))?;
    Ok(Json(member))
}

/// POST /api/members/:id/move
pub async fn move_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<MoveResponse>, ApiError> {
    let id = parse_id(&id)?;
    let mut session = state.session.lock().await;
    let moved = session.move_member(id, request.direction)?;
    let section_id = session
        .member(id)
        .map(|m| m.section_id)
        .ok_or_else(|| Error::NotFound(format!("member {}", id)))?;
    Ok(Json(MoveResponse {
        moved,
        order: session.members_of(section_id).iter().map(|m| m.id).collect(),
    }))
}

/// GET /api/members/:id/removal
pub async fn member_removal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RemovalResponse>, ApiError> {
    let id = parse_id(&id)?;
    let session = state.session.lock().await;
    Ok(Json(RemovalResponse {
        removal: session.preview_remove_member(id)?,
    }))
}

/// DELETE /api/members/:id?confirm=true
pub async fn delete_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<Member>, ApiError> {
    let id = parse_id(&id)?;
    let mut session = state.session.lock().await;
    let removed = state
        .engine
        .delete_member(&mut session, id, query.confirm)
        .await?;
    Ok(Json(removed))
}
