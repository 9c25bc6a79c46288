//! Section and member records
//!
//! Records mirror the two store tables. Nullable columns are `Option`, never
//! absent, and identifiers distinguish store-assigned ids from records that
//! only exist inside the current edit session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{Error, Result};

const PENDING_PREFIX: &str = "tmp-";

/// Record identifier
///
/// `Pending` records were created in memory and have never been written to
/// the store; the reconciliation engine inserts them. `Persisted` records
/// carry the id the store assigned and are updated in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Identifier {
    Persisted(Uuid),
    Pending(u64),
}

impl Identifier {
    pub fn is_pending(&self) -> bool {
        matches!(self, Identifier::Pending(_))
    }

    pub fn persisted(&self) -> Option<Uuid> {
        match self {
            Identifier::Persisted(id) => Some(*id),
            Identifier::Pending(_) => None,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Persisted(id) => write!(f, "{}", id),
            Identifier::Pending(token) => write!(f, "{}{}", PENDING_PREFIX, token),
        }
    }
}

impl FromStr for Identifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(token) = s.strip_prefix(PENDING_PREFIX) {
            return token
                .parse::<u64>()
                .map(Identifier::Pending)
                .map_err(|_| Error::Validation(format!("Invalid pending id: {}", s)));
        }
        Uuid::parse_str(s)
            .map(Identifier::Persisted)
            .map_err(|e| Error::Validation(format!("Invalid id '{}': {}", s, e)))
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A named grouping of team members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: Identifier,
    /// Machine slug, unique within the registry
    pub name: String,
    pub display_name: String,
    pub order_index: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// An individual team profile owned by exactly one section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: Identifier,
    pub section_id: Identifier,
    pub name: String,
    pub role: String,
    pub image_url: String,
    /// Secondary image shown on hover
    pub hover_image_url: Option<String>,
    pub bio: Option<String>,
    /// Newline-delimited list
    pub qualifications: Option<String>,
    pub email: String,
    pub phone: String,
    pub order_index: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Member {
    /// Empty record appended to `section_id`
    pub fn blank(id: Identifier, section_id: Identifier, order_index: i64) -> Self {
        Self {
            id,
            section_id,
            name: String::new(),
            role: String::new(),
            image_url: String::new(),
            hover_image_url: None,
            bio: None,
            qualifications: None,
            email: String::new(),
            phone: String::new(),
            order_index,
            created_at: None,
            updated_at: None,
        }
    }

    /// Whether the public site offers a detail view for this member
    pub fn has_detail_view(&self) -> bool {
        self.bio
            .as_deref()
            .map(|bio| !bio.trim().is_empty())
            .unwrap_or(false)
    }

    /// Qualifications split into display lines, blank lines dropped
    pub fn qualification_list(&self) -> Vec<&str> {
        self.qualifications
            .as_deref()
            .map(|q| {
                q.lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Partial update for a section
///
/// `id` and timestamps are not patchable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SectionPatch {
    pub name: Option<String>,
    pub display_name: Option<String>,
}

/// Partial update for a member
///
/// For nullable fields (`hover_image_url`, `bio`, `qualifications`) a blank
/// string clears the field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberPatch {
    pub name: Option<String>,
    pub role: Option<String>,
    pub image_url: Option<String>,
    pub hover_image_url: Option<String>,
    pub bio: Option<String>,
    pub qualifications: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl MemberPatch {
    pub fn image(slot: ImageSlot, url: impl Into<String>) -> Self {
        let url = url.into();
        match slot {
            ImageSlot::Primary => Self {
                image_url: Some(url),
                ..Self::default()
            },
            ImageSlot::Hover => Self {
                hover_image_url: Some(url),
                ..Self::default()
            },
        }
    }

    pub(crate) fn apply(self, member: &mut Member) {
        if let Some(v) = self.name {
            member.name = v;
        }
        if let Some(v) = self.role {
            member.role = v;
        }
        if let Some(v) = self.image_url {
            member.image_url = v;
        }
        if let Some(v) = self.hover_image_url {
            member.hover_image_url = nullable(v);
        }
        if let Some(v) = self.bio {
            member.bio = nullable(v);
        }
        if let Some(v) = self.qualifications {
            member.qualifications = nullable(v);
        }
        if let Some(v) = self.email {
            member.email = v;
        }
        if let Some(v) = self.phone {
            member.phone = v;
        }
    }
}

fn nullable(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Which image field of a member an image is assigned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSlot {
    Primary,
    Hover,
}

/// Reorder direction for adjacent swaps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// Lowercase slug with whitespace runs collapsed to single hyphens
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_display_and_parse() {
        let pending = Identifier::Pending(7);
        assert_eq!(pending.to_string(), "tmp-7");
        assert_eq!("tmp-7".parse::<Identifier>().unwrap(), pending);

        let uuid = Uuid::new_v4();
        let persisted: Identifier = uuid.to_string().parse().unwrap();
        assert_eq!(persisted, Identifier::Persisted(uuid));
        assert!(!persisted.is_pending());
        assert_eq!(persisted.persisted(), Some(uuid));
    }

    #[test]
    fn test_identifier_rejects_garbage() {
        assert!("tmp-x".parse::<Identifier>().is_err());
        assert!("not-a-uuid".parse::<Identifier>().is_err());
    }

    #[test]
    fn test_identifier_serde_as_string() {
        let json = serde_json::to_string(&Identifier::Pending(3)).unwrap();
        assert_eq!(json, "\"tmp-3\"");
        let back: Identifier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Identifier::Pending(3));
    }

    #[test]
    fn test_detail_view_requires_bio() {
        let mut member = Member::blank(Identifier::Pending(1), Identifier::Pending(0), 0);
        assert!(!member.has_detail_view());

        member.bio = Some("   ".to_string());
        assert!(!member.has_detail_view());

        member.bio = Some("Twenty years in retirement planning.".to_string());
        assert!(member.has_detail_view());
    }

    #[test]
    fn test_qualification_list_drops_blank_lines() {
        let mut member = Member::blank(Identifier::Pending(1), Identifier::Pending(0), 0);
        member.qualifications = Some("CFP\n\n  Dip. FP \n".to_string());
        assert_eq!(member.qualification_list(), vec!["CFP", "Dip. FP"]);
    }

    #[test]
    fn test_patch_blank_clears_nullable_fields() {
        let mut member = Member::blank(Identifier::Pending(1), Identifier::Pending(0), 0);
        member.bio = Some("bio".to_string());
        MemberPatch {
            bio: Some("  ".to_string()),
            name: Some("Jane".to_string()),
            ..MemberPatch::default()
        }
        .apply(&mut member);
        assert_eq!(member.bio, None);
        assert_eq!(member.name, "Jane");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Our Tech  Team"), "our-tech-team");
        assert_eq!(slugify("  leadership "), "leadership");
    }
}
