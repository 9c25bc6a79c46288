//! Reconciliation engine
//!
//! Synchronizes an [`EditSession`] with the table store:
//! - `load`: ordered fetch, seeding an empty store once per detection
//! - `snapshot`: the same fetch, read-only, for public rendering
//! - `save`: sections then members, inserts for pending ids and updates for
//!   persisted ids, aborting at the first failure, then a full reload
//! - immediate deletes for records that already exist in the store
//!
//! Writes are best-effort: rows written before a failure stay written, and
//! the session keeps its unsaved edits so the operator can retry.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::model::{Identifier, Member, Section};
use crate::seed::{self, SeedPolicy, DEFAULT_SECTIONS};
use crate::session::{EditSession, MemberRemoval, RemovedSection};
use crate::store::{MemberFields, SectionFields, TableStore};
use crate::{EntityKind, Error, Result};

/// Canonical store state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSnapshot {
    pub sections: Vec<Section>,
    pub members: Vec<Member>,
}

/// Counts of rows written by a successful save
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub sections_inserted: usize,
    pub sections_updated: usize,
    pub members_inserted: usize,
    pub members_updated: usize,
}

/// Clears the saving flag when the save future completes or is dropped
struct SaveGuard<'a>(&'a AtomicBool);

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Reconciler {
    store: Arc<dyn TableStore>,
    seed: SeedPolicy,
    saving: AtomicBool,
}

impl Reconciler {
    pub fn new(store: Arc<dyn TableStore>, seed: SeedPolicy) -> Self {
        Self {
            store,
            seed,
            saving: AtomicBool::new(false),
        }
    }

    /// Backend name of the injected store
    pub fn backend(&self) -> &'static str {
        self.store.kind()
    }

    /// True while a save is outstanding
    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    fn begin_save(&self) -> Result<SaveGuard<'_>> {
        self.saving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::SaveInProgress)?;
        Ok(SaveGuard(&self.saving))
    }

    /// Fetch canonical state, seeding defaults into an empty store
    pub async fn load(&self) -> Result<TeamSnapshot> {
        self.fetch().await.map_err(Error::load)
    }

    /// Fetch canonical state without ever writing to the store
    pub async fn snapshot(&self) -> Result<TeamSnapshot> {
        self.select_all().await.map_err(Error::load)
    }

    async fn select_all(&self) -> Result<TeamSnapshot> {
        let sections = self.store.select_sections().await?;
        let members = self.store.select_members().await?;
        Ok(TeamSnapshot { sections, members })
    }

    /// Default members are only seeded on the load that seeded the sections,
    /// so deleting every member later does not bring the placeholders back.
    async fn fetch(&self) -> Result<TeamSnapshot> {
        let snapshot = self.select_all().await?;
        if !snapshot.sections.is_empty() || self.seed == SeedPolicy::Disabled {
            debug!(
                "Loaded {} sections, {} members",
                snapshot.sections.len(),
                snapshot.members.len()
            );
            return Ok(snapshot);
        }

        info!("No sections found, seeding {} default sections", DEFAULT_SECTIONS.len());
        for fields in seed::default_sections() {
            self.store.insert_section(&fields).await?;
        }
        let sections = self.store.select_sections().await?;

        if snapshot.members.is_empty() {
            let target = sections
                .iter()
                .find(|s| s.name == DEFAULT_SECTIONS[0].0)
                .or_else(|| sections.first())
                .and_then(|s| s.id.persisted());
            if let Some(section_id) = target {
                info!("No members found, seeding defaults into section {}", section_id);
                for fields in seed::default_members(section_id) {
                    self.store.insert_member(&fields).await?;
                }
            }
        }

        let members = self.store.select_members().await?;
        debug!("Loaded {} sections, {} members", sections.len(), members.len());
        Ok(TeamSnapshot { sections, members })
    }

    /// Start an edit session on freshly loaded state
    pub async fn open_session(&self) -> Result<EditSession> {
        let snapshot = self.load().await?;
        Ok(EditSession::new(snapshot.sections, snapshot.members))
    }

    /// Discard local edits and replace them with canonical state
    pub async fn reload(&self, session: &mut EditSession) -> Result<()> {
        let snapshot = self.load().await?;
        session.replace(snapshot.sections, snapshot.members);
        Ok(())
    }

    /// Write the session to the store and reload canonical state
    ///
    /// On failure the visible session is left exactly as it was. Rows the
    /// failed attempt did write are remembered, so a retry updates them
    /// instead of inserting them again.
    pub async fn save(&self, session: &mut EditSession) -> Result<SaveReport> {
        let _guard = self.begin_save()?;
        session.validate_for_save()?;

        let mut report = SaveReport::default();
        self.save_sections(session, &mut report)
            .await
            .map_err(|e| {
                warn!("Saving sections failed: {}", e);
                Error::save(EntityKind::Sections, e)
            })?;
        self.save_members(session, &mut report)
            .await
            .map_err(|e| {
                warn!("Saving members failed: {}", e);
                Error::save(EntityKind::Members, e)
            })?;

        let snapshot = self.load().await?;
        session.replace(snapshot.sections, snapshot.members);
        info!(
            "Saved team: {} section(s) inserted, {} updated; {} member(s) inserted, {} updated",
            report.sections_inserted,
            report.sections_updated,
            report.members_inserted,
            report.members_updated
        );
        Ok(report)
    }

    async fn save_sections(&self, session: &mut EditSession, report: &mut SaveReport) -> Result<()> {
        let mut to_insert = Vec::new();
        let mut to_update = Vec::new();
        for section in session.sections() {
            let fields = SectionFields::from(section);
            match session.store_id(section.id) {
                Some(id) => to_update.push((id, fields)),
                None => to_insert.push((section.id, fields)),
            }
        }

        for (pending, fields) in to_insert {
            let stored = self.store.insert_section(&fields).await?;
            let id = stored
                .id
                .persisted()
                .ok_or_else(|| Error::Store("Insert returned a pending id".to_string()))?;
            debug!("Inserted section {} as {}", fields.name, id);
            if let Identifier::Pending(token) = pending {
                session.record_committed(token, id);
            }
            report.sections_inserted += 1;
        }
        for (id, fields) in to_update {
            self.store.update_section(id, &fields).await?;
            report.sections_updated += 1;
        }
        Ok(())
    }

    async fn save_members(&self, session: &mut EditSession, report: &mut SaveReport) -> Result<()> {
        let mut to_insert = Vec::new();
        let mut to_update = Vec::new();
        for member in session.all_members() {
            let section_id = session.store_id(member.section_id).ok_or_else(|| {
                Error::Validation(format!(
                    "Member {} references unsaved section {}",
                    member.id, member.section_id
                ))
            })?;
            let fields = MemberFields::from_member(member, section_id);
            match session.store_id(member.id) {
                Some(id) => to_update.push((id, fields)),
                None => to_insert.push((member.id, fields)),
            }
        }

        for (pending, fields) in to_insert {
            let stored = self.store.insert_member(&fields).await?;
            if let (Identifier::Pending(token), Some(id)) = (pending, stored.id.persisted()) {
                session.record_committed(token, id);
            }
            debug!("Inserted member {}", stored.id);
            report.members_inserted += 1;
        }
        for (id, fields) in to_update {
            self.store.update_member(id, &fields).await?;
            report.members_updated += 1;
        }
        Ok(())
    }

    /// Remove a member, deleting it from the store first if it was saved
    ///
    /// Persisted members need `confirmed`. Pending ones only touch the store
    /// when a failed save already wrote their row.
    pub async fn delete_member(
        &self,
        session: &mut EditSession,
        id: Identifier,
        confirmed: bool,
    ) -> Result<Member> {
        if session.preview_remove_member(id)? == MemberRemoval::RequiresConfirmation && !confirmed {
            return Err(Error::ConfirmationRequired(format!("member {} is saved", id)));
        }
        if let Some(uuid) = session.store_id(id) {
            self.store
                .delete_member(uuid)
                .await
                .map_err(|e| Error::save(EntityKind::Members, e))?;
            info!("Deleted member {}", uuid);
        }
        session.commit_remove_member(id)
    }

    /// Remove a section and its members, deleting saved rows from the store
    ///
    /// A section with members needs `confirmed`.
    pub async fn delete_section(
        &self,
        session: &mut EditSession,
        id: Identifier,
        confirmed: bool,
    ) -> Result<RemovedSection> {
        let impact = session.preview_remove_section(id)?;
        if impact.requires_confirmation && !confirmed {
            return Err(Error::ConfirmationRequired(format!(
                "section {} has {} member(s)",
                impact.section.name,
                impact.member_ids.len()
            )));
        }

        let stored_members: Vec<_> = impact
            .member_ids
            .iter()
            .filter_map(|member_id| session.store_id(*member_id))
            .collect();
        for member_id in stored_members {
            self.store
                .delete_member(member_id)
                .await
                .map_err(|e| Error::save(EntityKind::Members, e))?;
        }
        if let Some(uuid) = session.store_id(id) {
            self.store
                .delete_section(uuid)
                .await
                .map_err(|e| Error::save(EntityKind::Sections, e))?;
            info!("Deleted section {} ({})", impact.section.name, uuid);
        }
        session.commit_remove_section(id)
    }
}
