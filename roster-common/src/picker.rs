//! Image selection bridge
//!
//! Routes an image chosen in the library picker to the member field that
//! opened it. The picker holds only the routing target, never image data.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{Identifier, ImageSlot, MemberPatch};
use crate::session::EditSession;
use crate::Result;

/// The (owner, field) slot an image is destined for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageTarget {
    pub owner: Identifier,
    pub slot: ImageSlot,
}

#[derive(Debug, Default)]
pub struct ImagePicker {
    target: Option<ImageTarget>,
}

impl ImagePicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open for `target`; an already open target is replaced
    pub fn open(&mut self, target: ImageTarget) {
        if let Some(previous) = self.target.replace(target) {
            debug!("Image picker retargeted from {} to {}", previous.owner, target.owner);
        }
    }

    pub fn target(&self) -> Option<ImageTarget> {
        self.target
    }

    pub fn is_open(&self) -> bool {
        self.target.is_some()
    }

    /// Assign `image_url` to the open target and close
    ///
    /// Returns the target written to, or `None` if nothing was open. The
    /// picker closes even when the owner no longer exists.
    pub fn select(&mut self, image_url: &str, session: &mut EditSession) -> Result<Option<ImageTarget>> {
        let Some(target) = self.target.take() else {
            return Ok(None);
        };
        session.update_member(target.owner, MemberPatch::image(target.slot, image_url))?;
        Ok(Some(target))
    }

    /// Close without touching any record
    pub fn close(&mut self) {
        self.target = None;
    }
}
