//! # Roster Common Library
//!
//! Team and content management engine shared by the admin service:
//! - Section and member data model with pending/persisted identifiers
//! - In-memory registries and the edit session that owns them
//! - Reconciliation engine (load, seed, save, immediate deletes)
//! - Table store collaborators (SQLite, hosted REST backend)
//! - Image selection bridge and image library
//! - File-based page content store
//! - Bootstrap configuration loading

pub mod config;
pub mod content;
pub mod error;
pub mod library;
pub mod model;
pub mod picker;
pub mod reconcile;
pub mod registry;
pub mod seed;
pub mod session;
pub mod store;

pub use error::{EntityKind, Error, Result};
pub use model::{Direction, Identifier, ImageSlot, Member, MemberPatch, Section, SectionPatch};
pub use reconcile::Reconciler;
pub use session::EditSession;
