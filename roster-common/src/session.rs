//! Edit session
//!
//! Owns the authoritative in-memory registries between a load and the next
//! successful save. All mutation from the editing surface goes through here.

use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::model::{Direction, Identifier, Member, MemberPatch, Section, SectionPatch};
use crate::registry::{MemberRegistry, SectionRegistry};
use crate::{Error, Result};

/// Cascade impact of removing a section, shown to the operator before commit
#[derive(Debug, Clone, Serialize)]
pub struct ImpactSummary {
    pub section: Section,
    pub member_ids: Vec<Identifier>,
    pub requires_confirmation: bool,
}

/// Result of a committed section removal
#[derive(Debug, Clone, Serialize)]
pub struct RemovedSection {
    pub section: Section,
    pub cascaded_member_ids: Vec<Identifier>,
}

/// How a member removal has to proceed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRemoval {
    /// Never saved; dropped from memory without touching the store
    Local,
    /// Persisted; operator must confirm, then the store row is deleted
    RequiresConfirmation,
}

#[derive(Debug, Clone)]
pub struct EditSession {
    sections: SectionRegistry,
    members: MemberRegistry,
    next_token: u64,
    /// Store ids of pending records already written by a save that failed
    /// later on; the records stay pending until the next successful reload
    committed: HashMap<u64, Uuid>,
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl EditSession {
    pub fn new(sections: Vec<Section>, members: Vec<Member>) -> Self {
        Self {
            sections: SectionRegistry::new(sections),
            members: MemberRegistry::new(members),
            next_token: 1,
            committed: HashMap::new(),
        }
    }

    /// Replace both registries wholesale with reloaded canonical state
    pub fn replace(&mut self, sections: Vec<Section>, members: Vec<Member>) {
        self.sections = SectionRegistry::new(sections);
        self.members = MemberRegistry::new(members);
        self.committed.clear();
    }

    /// Row id in the store for `id`, if it has one
    ///
    /// Pending records have one once a partially failed save wrote them.
    pub fn store_id(&self, id: Identifier) -> Option<Uuid> {
        match id {
            Identifier::Persisted(uuid) => Some(uuid),
            Identifier::Pending(token) => self.committed.get(&token).copied(),
        }
    }

    pub(crate) fn record_committed(&mut self, token: u64, id: Uuid) {
        self.committed.insert(token, id);
    }

    fn pending_id(&mut self) -> Identifier {
        let id = Identifier::Pending(self.next_token);
        self.next_token += 1;
        id
    }

    pub fn sections(&self) -> &[Section] {
        self.sections.list()
    }

    pub fn section(&self, id: Identifier) -> Option<&Section> {
        self.sections.get(id)
    }

    pub fn all_members(&self) -> &[Member] {
        self.members.all()
    }

    pub fn member(&self, id: Identifier) -> Option<&Member> {
        self.members.get(id)
    }

    pub fn members_of(&self, section_id: Identifier) -> Vec<&Member> {
        self.members.list_by_section(section_id)
    }

    pub fn has_pending(&self) -> bool {
        self.sections().iter().any(|s| s.id.is_pending())
            || self.all_members().iter().any(|m| m.id.is_pending())
    }

    pub fn add_section(&mut self, name: &str, display_name: &str) -> Result<Section> {
        let id = self.pending_id();
        let section = self.sections.add(id, name, display_name)?;
        debug!("Added section {} ({})", section.name, section.id);
        Ok(section)
    }

    pub fn update_section(&mut self, id: Identifier, patch: SectionPatch) -> Result<()> {
        self.sections.update(id, patch)
    }

    pub fn move_section(&mut self, id: Identifier, direction: Direction) -> Result<bool> {
        self.sections.move_section(id, direction)
    }

    pub fn preview_remove_section(&self, id: Identifier) -> Result<ImpactSummary> {
        let section = self
            .sections
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("section {}", id)))?;
        let member_ids: Vec<Identifier> =
            self.members.list_by_section(id).iter().map(|m| m.id).collect();
        Ok(ImpactSummary {
            section,
            requires_confirmation: !member_ids.is_empty(),
            member_ids,
        })
    }

    /// Remove a section and every member that references it
    pub fn commit_remove_section(&mut self, id: Identifier) -> Result<RemovedSection> {
        let section = self.sections.remove(id)?;
        let cascaded_member_ids = self
            .members
            .remove_section(id)
            .into_iter()
            .map(|m| m.id)
            .collect::<Vec<_>>();
        debug!(
            "Removed section {} with {} member(s)",
            section.name,
            cascaded_member_ids.len()
        );
        Ok(RemovedSection {
            section,
            cascaded_member_ids,
        })
    }

    /// Append a blank member to `section_id`
    pub fn add_member(&mut self, section_id: Identifier) -> Result<Member> {
        if !self.sections.contains(section_id) {
            return Err(Error::NotFound(format!("section {}", section_id)));
        }
        let id = self.pending_id();
        Ok(self.members.add(id, section_id))
    }

    pub fn update_member(&mut self, id: Identifier, patch: MemberPatch) -> Result<()> {
        self.members.update(id, patch)
    }

    pub fn move_member(&mut self, id: Identifier, direction: Direction) -> Result<bool> {
        self.members.move_member(id, direction)
    }

    pub fn preview_remove_member(&self, id: Identifier) -> Result<MemberRemoval> {
        let member = self
            .members
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("member {}", id)))?;
        Ok(match member.id {
            Identifier::Pending(_) => MemberRemoval::Local,
            Identifier::Persisted(_) => MemberRemoval::RequiresConfirmation,
        })
    }

    pub fn commit_remove_member(&mut self, id: Identifier) -> Result<Member> {
        self.members.remove(id)
    }

    /// Checks that must pass before any store call of a save
    pub fn validate_for_save(&self) -> Result<()> {
        for section in self.sections() {
            if section.name.trim().is_empty() || section.display_name.trim().is_empty() {
                return Err(Error::Validation(format!(
                    "Section {} needs a name and display name",
                    section.id
                )));
            }
        }
        for member in self.all_members() {
            if !self.sections.contains(member.section_id) {
                return Err(Error::Validation(format!(
                    "Member {} references missing section {}",
                    member.id, member.section_id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_tokens_never_collide() {
        let mut session = EditSession::new(Vec::new(), Vec::new());
        let section = session.add_section("a", "A").unwrap();
        let member = session.add_member(section.id).unwrap();
        assert_ne!(section.id, member.id);
        assert!(section.id.is_pending() && member.id.is_pending());
        assert!(session.has_pending());
    }

    #[test]
    fn test_store_id_tracks_partially_saved_records() {
        let mut session = EditSession::default();
        let section = session.add_section("a", "A").unwrap();
        let Identifier::Pending(token) = section.id else {
            panic!("new section should be pending");
        };
        assert_eq!(session.store_id(section.id), None);

        let uuid = Uuid::new_v4();
        session.record_committed(token, uuid);
        assert_eq!(session.store_id(section.id), Some(uuid));
        // Still shown as pending until a reload
        assert!(session.sections()[0].id.is_pending());

        session.replace(Vec::new(), Vec::new());
        assert_eq!(session.store_id(section.id), None);
        assert_eq!(session.store_id(Identifier::Persisted(uuid)), Some(uuid));
    }

    #[test]
    fn test_add_member_to_missing_section() {
        let mut session = EditSession::default();
        let err = session.add_member(Identifier::Pending(42)).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_preview_remove_section_reports_impact() {
        let mut session = EditSession::default();
        let empty = session.add_section("empty", "Empty").unwrap();
        let full = session.add_section("full", "Full").unwrap();
        session.add_member(full.id).unwrap();

        assert!(!session.preview_remove_section(empty.id).unwrap().requires_confirmation);
        let impact = session.preview_remove_section(full.id).unwrap();
        assert!(impact.requires_confirmation);
        assert_eq!(impact.member_ids.len(), 1);
    }

    #[test]
    fn test_preview_remove_member_local_for_pending() {
        let mut session = EditSession::default();
        let section = session.add_section("a", "A").unwrap();
        let member = session.add_member(section.id).unwrap();
        assert_eq!(
            session.preview_remove_member(member.id).unwrap(),
            MemberRemoval::Local
        );
    }

    #[test]
    fn test_validate_for_save_rejects_orphans() {
        let section = Section {
            id: Identifier::Pending(1),
            name: "a".to_string(),
            display_name: "A".to_string(),
            order_index: 0,
            created_at: None,
            updated_at: None,
        };
        let orphan = Member::blank(Identifier::Pending(2), Identifier::Pending(99), 0);
        let session = EditSession::new(vec![section], vec![orphan]);
        assert!(matches!(
            session.validate_for_save(),
            Err(Error::Validation(_))
        ));
    }
}
