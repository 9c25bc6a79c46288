//! Default team data for an empty store
//!
//! Applied by [`crate::Reconciler::load`] when a table is found empty.

use uuid::Uuid;

use crate::store::{MemberFields, SectionFields};

/// Default sections as `(name, display_name)`, in render order
pub const DEFAULT_SECTIONS: &[(&str, &str)] = &[
    ("leadership", "Leadership Team"),
    ("advisers", "Financial Advisers"),
    ("client-services", "Client Services"),
];

struct DefaultMember {
    name: &'static str,
    role: &'static str,
    bio: &'static str,
    qualifications: &'static str,
    email: &'static str,
    phone: &'static str,
}

const DEFAULT_MEMBERS: &[DefaultMember] = &[
    DefaultMember {
        name: "Managing Director",
        role: "Managing Director & Senior Financial Adviser",
        bio: "Leads the firm's advice practice and investment committee.",
        qualifications: "Certified Financial Planner\nAdvanced Diploma of Financial Planning",
        email: "director@example.com",
        phone: "",
    },
    DefaultMember {
        name: "Head of Advice",
        role: "Head of Advice",
        bio: "",
        qualifications: "Diploma of Financial Planning",
        email: "advice@example.com",
        phone: "",
    },
];

/// Whether `load()` may seed an empty store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedPolicy {
    Defaults,
    Disabled,
}

pub fn default_sections() -> Vec<SectionFields> {
    DEFAULT_SECTIONS
        .iter()
        .enumerate()
        .map(|(i, (name, display_name))| SectionFields {
            name: (*name).to_string(),
            display_name: (*display_name).to_string(),
            order_index: i as i64,
        })
        .collect()
}

/// Default members attached to `section_id`
pub fn default_members(section_id: Uuid) -> Vec<MemberFields> {
    DEFAULT_MEMBERS
        .iter()
        .enumerate()
        .map(|(i, m)| MemberFields {
            section_id,
            name: m.name.to_string(),
            role: m.role.to_string(),
            image_url: String::new(),
            hover_image_url: None,
            bio: Some(m.bio.to_string()).filter(|b| !b.is_empty()),
            qualifications: Some(m.qualifications.to_string()).filter(|q| !q.is_empty()),
            email: m.email.to_string(),
            phone: m.phone.to_string(),
            order_index: i as i64,
        })
        .collect()
}
