//! In-memory section and member registries
//!
//! Pure, synchronous collections. Every mutation keeps `order_index` unique
//! within its scope (the whole section list, or one section's members).

use tracing::warn;

use crate::model::{slugify, Direction, Identifier, Member, MemberPatch, Section, SectionPatch};
use crate::{Error, Result};

/// Records ordered by an integer position
trait Ordered {
    fn id(&self) -> Identifier;
    fn order_index(&self) -> i64;
    fn set_order_index(&mut self, order_index: i64);
}

impl Ordered for Section {
    fn id(&self) -> Identifier {
        self.id
    }
    fn order_index(&self) -> i64 {
        self.order_index
    }
    fn set_order_index(&mut self, order_index: i64) {
        self.order_index = order_index;
    }
}

impl Ordered for Member {
    fn id(&self) -> Identifier {
        self.id
    }
    fn order_index(&self) -> i64 {
        self.order_index
    }
    fn set_order_index(&mut self, order_index: i64) {
        self.order_index = order_index;
    }
}

/// Position for a record appended to a group of `indices`
///
/// The group size, unless that position is already taken (gaps left by
/// removals or by persisted data), in which case one past the maximum.
fn next_order_index(indices: impl Iterator<Item = i64> + Clone) -> i64 {
    let count = indices.clone().count() as i64;
    if indices.clone().any(|i| i == count) {
        indices.max().map(|max| max + 1).unwrap_or(0)
    } else {
        count
    }
}

/// Swap `id` with its neighbour among the records selected by `in_group`
///
/// Returns `Ok(false)` when the record is already at the edge.
fn swap_adjacent<T: Ordered>(
    items: &mut [T],
    id: Identifier,
    direction: Direction,
    in_group: impl Fn(&T) -> bool,
) -> Result<bool> {
    let mut group: Vec<usize> = (0..items.len()).filter(|&i| in_group(&items[i])).collect();
    group.sort_by_key(|&i| items[i].order_index());

    let pos = group
        .iter()
        .position(|&i| items[i].id() == id)
        .ok_or_else(|| Error::NotFound(id.to_string()))?;

    let neighbour = match direction {
        Direction::Up if pos > 0 => pos - 1,
        Direction::Down if pos + 1 < group.len() => pos + 1,
        _ => return Ok(false),
    };

    let (a, b) = (group[pos], group[neighbour]);
    let (order_a, order_b) = (items[a].order_index(), items[b].order_index());
    items[a].set_order_index(order_b);
    items[b].set_order_index(order_a);
    Ok(true)
}

fn required(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Ordered set of sections
#[derive(Debug, Clone, Default)]
pub struct SectionRegistry {
    sections: Vec<Section>,
}

impl SectionRegistry {
    pub fn new(mut sections: Vec<Section>) -> Self {
        sections.sort_by_key(|s| s.order_index);
        Self { sections }
    }

    /// Sections by ascending `order_index`
    pub fn list(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn get(&self, id: Identifier) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: Identifier) -> bool {
        self.get(id).is_some()
    }

    /// Append a section; `name` is slugified and must be unique
    pub fn add(&mut self, id: Identifier, name: &str, display_name: &str) -> Result<Section> {
        let name = slugify(&required(name, "Section name")?);
        let display_name = required(display_name, "Display name")?;
        self.ensure_unique_name(&name, None)?;

        let section = Section {
            id,
            name,
            display_name,
            order_index: next_order_index(self.sections.iter().map(|s| s.order_index)),
            created_at: None,
            updated_at: None,
        };
        self.sections.push(section.clone());
        self.sort();
        Ok(section)
    }

    pub fn update(&mut self, id: Identifier, patch: SectionPatch) -> Result<()> {
        let name = patch
            .name
            .map(|n| required(&n, "Section name").map(|n| slugify(&n)))
            .transpose()?;
        let display_name = patch
            .display_name
            .map(|d| required(&d, "Display name"))
            .transpose()?;
        if let Some(name) = &name {
            self.ensure_unique_name(name, Some(id))?;
        }

        let section = self.get_mut(id)?;
        if let Some(name) = name {
            section.name = name;
        }
        if let Some(display_name) = display_name {
            section.display_name = display_name;
        }
        Ok(())
    }

    pub fn move_section(&mut self, id: Identifier, direction: Direction) -> Result<bool> {
        let moved = swap_adjacent(&mut self.sections, id, direction, |_| true)?;
        self.sort();
        Ok(moved)
    }

    pub fn remove(&mut self, id: Identifier) -> Result<Section> {
        let pos = self
            .sections
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| Error::NotFound(format!("section {}", id)))?;
        Ok(self.sections.remove(pos))
    }

    fn get_mut(&mut self, id: Identifier) -> Result<&mut Section> {
        self.sections
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| {
                warn!("Section {} not in registry", id);
                Error::NotFound(format!("section {}", id))
            })
    }

    fn ensure_unique_name(&self, name: &str, except: Option<Identifier>) -> Result<()> {
        let taken = self
            .sections
            .iter()
            .any(|s| s.name == name && Some(s.id) != except);
        if taken {
            return Err(Error::Validation(format!(
                "Section name '{}' is already in use",
                name
            )));
        }
        Ok(())
    }

    fn sort(&mut self) {
        self.sections.sort_by_key(|s| s.order_index);
    }
}

/// Ordered set of members, partitioned by section
#[derive(Debug, Clone, Default)]
pub struct MemberRegistry {
    members: Vec<Member>,
}

impl MemberRegistry {
    pub fn new(members: Vec<Member>) -> Self {
        Self { members }
    }

    pub fn all(&self) -> &[Member] {
        &self.members
    }

    pub fn get(&self, id: Identifier) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    /// Members of `section_id` by ascending `order_index`
    pub fn list_by_section(&self, section_id: Identifier) -> Vec<&Member> {
        let mut members: Vec<&Member> = self
            .members
            .iter()
            .filter(|m| m.section_id == section_id)
            .collect();
        members.sort_by_key(|m| m.order_index);
        members
    }

    /// Append a blank member to the end of `section_id`
    pub fn add(&mut self, id: Identifier, section_id: Identifier) -> Member {
        let order_index = next_order_index(
            self.members
                .iter()
                .filter(|m| m.section_id == section_id)
                .map(|m| m.order_index),
        );
        let member = Member::blank(id, section_id, order_index);
        self.members.push(member.clone());
        member
    }

    pub fn update(&mut self, id: Identifier, patch: MemberPatch) -> Result<()> {
        let member = self
            .members
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| {
                warn!("Member {} not in registry", id);
                Error::NotFound(format!("member {}", id))
            })?;
        patch.apply(member);
        Ok(())
    }

    /// Swap with the adjacent sibling in the same section
    pub fn move_member(&mut self, id: Identifier, direction: Direction) -> Result<bool> {
        let section_id = self
            .get(id)
            .map(|m| m.section_id)
            .ok_or_else(|| Error::NotFound(format!("member {}", id)))?;
        swap_adjacent(&mut self.members, id, direction, |m| m.section_id == section_id)
    }

    pub fn remove(&mut self, id: Identifier) -> Result<Member> {
        let pos = self
            .members
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| Error::NotFound(format!("member {}", id)))?;
        Ok(self.members.remove(pos))
    }

    /// Remove every member of `section_id`, returning them in order
    pub fn remove_section(&mut self, section_id: Identifier) -> Vec<Member> {
        let (mut removed, kept): (Vec<Member>, Vec<Member>) = self
            .members
            .drain(..)
            .partition(|m| m.section_id == section_id);
        self.members = kept;
        removed.sort_by_key(|m| m.order_index);
        removed
    }
}
