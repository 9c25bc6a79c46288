//! Table store collaborators
//!
//! The reconciliation engine talks to persistence only through [`TableStore`]:
//! select-all-ordered, insert-one, update-by-id and delete-by-id against the
//! `sections` and `members` tables.

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::model::{Member, Section};
use crate::Result;

pub mod rest;
pub mod sqlite;

pub use rest::RestStore;
pub use sqlite::SqliteStore;

/// Writable section columns (no id, no timestamps)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionFields {
    pub name: String,
    pub display_name: String,
    pub order_index: i64,
}

impl From<&Section> for SectionFields {
    fn from(section: &Section) -> Self {
        Self {
            name: section.name.clone(),
            display_name: section.display_name.clone(),
            order_index: section.order_index,
        }
    }
}

/// Writable member columns (no id, no timestamps)
///
/// `section_id` is always a store-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberFields {
    pub section_id: Uuid,
    pub name: String,
    pub role: String,
    pub image_url: String,
    pub hover_image_url: Option<String>,
    pub bio: Option<String>,
    pub qualifications: Option<String>,
    pub email: String,
    pub phone: String,
    pub order_index: i64,
}

impl MemberFields {
    pub fn from_member(member: &Member, section_id: Uuid) -> Self {
        Self {
            section_id,
            name: member.name.clone(),
            role: member.role.clone(),
            image_url: member.image_url.clone(),
            hover_image_url: member.hover_image_url.clone(),
            bio: member.bio.clone(),
            qualifications: member.qualifications.clone(),
            email: member.email.clone(),
            phone: member.phone.clone(),
            order_index: member.order_index,
        }
    }
}

/// Durable owner of sections and members across edit sessions
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Short backend name for diagnostics (`sqlite`, `rest`)
    fn kind(&self) -> &'static str;

    /// All sections ordered by `order_index`
    async fn select_sections(&self) -> Result<Vec<Section>>;

    /// All members ordered by `(section_id, order_index)`
    async fn select_members(&self) -> Result<Vec<Member>>;

    /// Insert one section, returning the stored row
    async fn insert_section(&self, fields: &SectionFields) -> Result<Section>;

    async fn update_section(&self, id: Uuid, fields: &SectionFields) -> Result<()>;

    async fn delete_section(&self, id: Uuid) -> Result<()>;

    /// Insert one member, returning the stored row
    async fn insert_member(&self, fields: &MemberFields) -> Result<Member>;

    async fn update_member(&self, id: Uuid, fields: &MemberFields) -> Result<()>;

    async fn delete_member(&self, id: Uuid) -> Result<()>;
}
