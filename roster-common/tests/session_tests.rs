//! Edit session behaviour through the public API
//!
//! Ordering properties of sections and members, section cascades and
//! public detail-view eligibility.

use roster_common::model::{Direction, MemberPatch};
use roster_common::session::MemberRemoval;
use roster_common::EditSession;
use std::collections::HashSet;

fn assert_unique_member_order(session: &EditSession, section: roster_common::Identifier) {
    let members = session.members_of(section);
    let indices: HashSet<i64> = members.iter().map(|m| m.order_index).collect();
    assert_eq!(indices.len(), members.len(), "duplicate order_index in section");
}

#[test]
fn test_add_section_order_index_is_previous_count() {
    let mut session = EditSession::default();
    for i in 0..5 {
        let previous = session.sections().len() as i64;
        let section = session
            .add_section(&format!("section {}", i), &format!("Section {}", i))
            .unwrap();
        assert_eq!(section.order_index, previous);
        assert!(session.sections().iter().any(|s| s.id == section.id));
    }
}

#[test]
fn test_tech_team_scenario() {
    let mut session = EditSession::default();
    let section = session.add_section("tech-team", "Our Tech Team").unwrap();
    assert_eq!(section.name, "tech-team");
    assert_eq!(section.display_name, "Our Tech Team");

    let first = session.add_member(section.id).unwrap();
    let second = session.add_member(section.id).unwrap();
    session.move_member(second.id, Direction::Up).unwrap();

    assert_eq!(session.member(second.id).unwrap().order_index, 0);
    assert_eq!(session.member(first.id).unwrap().order_index, 1);
}

#[test]
fn test_repeated_move_up_stops_at_top() {
    let mut session = EditSession::default();
    let section = session.add_section("advisers", "Advisers").unwrap();
    let other = session.add_section("support", "Support").unwrap();
    let ids: Vec<_> = (0..4)
        .map(|_| session.add_member(section.id).unwrap().id)
        .collect();
    let bystander = session.add_member(other.id).unwrap();

    let last = ids[3];
    for _ in 0..10 {
        session.move_member(last, Direction::Up).unwrap();
        assert!(session.member(last).unwrap().order_index >= 0);
        assert_unique_member_order(&session, section.id);
    }

    assert_eq!(session.members_of(section.id)[0].id, last);
    assert!(!session.move_member(last, Direction::Up).unwrap());
    assert_eq!(session.member(bystander.id).unwrap().order_index, 0);
}

#[test]
fn test_move_down_at_bottom_is_noop() {
    let mut session = EditSession::default();
    let section = session.add_section("advisers", "Advisers").unwrap();
    let only = session.add_member(section.id).unwrap();
    assert!(!session.move_member(only.id, Direction::Down).unwrap());
    assert_eq!(session.member(only.id).unwrap().order_index, 0);
}

#[test]
fn test_remove_section_cascades_all_members() {
    let mut session = EditSession::default();
    let section = session.add_section("advisers", "Advisers").unwrap();
    let keep = session.add_section("support", "Support").unwrap();
    for _ in 0..3 {
        session.add_member(section.id).unwrap();
    }
    session.add_member(keep.id).unwrap();

    let impact = session.preview_remove_section(section.id).unwrap();
    assert!(impact.requires_confirmation);

    let removed = session.commit_remove_section(section.id).unwrap();
    assert_eq!(removed.cascaded_member_ids.len(), 3);
    assert!(session.members_of(section.id).is_empty());
    assert_eq!(session.members_of(keep.id).len(), 1);
    assert_eq!(session.sections().len(), 1);
}

#[test]
fn test_detail_view_follows_bio() {
    let mut session = EditSession::default();
    let section = session.add_section("advisers", "Advisers").unwrap();
    let member = session.add_member(section.id).unwrap();

    session
        .update_member(member.id, MemberPatch { bio: Some(String::new()), ..Default::default() })
        .unwrap();
    assert!(!session.member(member.id).unwrap().has_detail_view());

    session
        .update_member(
            member.id,
            MemberPatch { bio: Some("Specialises in superannuation.".into()), ..Default::default() },
        )
        .unwrap();
    assert!(session.member(member.id).unwrap().has_detail_view());
}

#[test]
fn test_pending_member_removal_is_local() {
    let mut session = EditSession::default();
    let section = session.add_section("advisers", "Advisers").unwrap();
    let member = session.add_member(section.id).unwrap();

    assert_eq!(session.preview_remove_member(member.id).unwrap(), MemberRemoval::Local);
    session.commit_remove_member(member.id).unwrap();
    assert!(session.member(member.id).is_none());
}
