//! Read-only team view for the public site
//!
//! Served from the store, not the admin session, so unsaved edits never
//! leak out. Reads are side-effect free: an anonymous visitor never causes
//! default data to be seeded.

use axum::{extract::State, Json};
use roster_common::model::Member;
use serde::Serialize;

use super::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PublicMember {
    pub name: String,
    pub role: String,
    pub image_url: String,
    pub hover_image_url: Option<String>,
    pub email: String,
    pub phone: String,
    pub qualifications: Vec<String>,
    pub has_detail_view: bool,
    /// Only present when a detail view is offered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl From<&Member> for PublicMember {
    fn from(member: &Member) -> Self {
        let has_detail_view = member.has_detail_view();
        Self {
            name: member.name.clone(),
            role: member.role.clone(),
            image_url: member.image_url.clone(),
            hover_image_url: member.hover_image_url.clone(),
            email: member.email.clone(),
            phone: member.phone.clone(),
            qualifications: member
                .qualification_list()
                .into_iter()
                .map(str::to_string)
                .collect(),
            has_detail_view,
            bio: if has_detail_view {
                member.bio.clone()
            } else {
                None
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PublicSection {
    pub name: String,
    pub display_name: String,
    pub members: Vec<PublicMember>,
}

#[derive(Debug, Serialize)]
pub struct PublicTeam {
    pub sections: Vec<PublicSection>,
}

/// GET /api/public/team
pub async fn public_team(State(state): State<AppState>) -> Result<Json<PublicTeam>, ApiError> {
    let snapshot = state.engine.snapshot().await?;

    let sections = snapshot
        .sections
        .iter()
        .map(|section| {
            let mut members: Vec<&Member> = snapshot
                .members
                .iter()
                .filter(|m| m.section_id == section.id)
                .collect();
            members.sort_by_key(|m| m.order_index);
            PublicSection {
                name: section.name.clone(),
                display_name: section.display_name.clone(),
                members: members.into_iter().map(PublicMember::from).collect(),
            }
        })
        .collect();

    Ok(Json(PublicTeam { sections }))
}
