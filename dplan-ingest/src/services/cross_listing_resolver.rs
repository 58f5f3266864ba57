//! Cross-listing alias resolution
//!
//! Breadth-first traversal over the directed cross-listing references declared
//! in the prerequisite records. Edges are followed only in the declared
//! direction: if A lists B but B does not list A, C reachable from B is
//! reachable from A, not the other way round.

use crate::models::PrerequisiteRecords;
use std::collections::{HashSet, VecDeque};

/// Codes reachable from a start code, in breadth-first discovery order
///
/// The start code itself is never a member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasClass {
    members: Vec<String>,
}

impl AliasClass {
    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn contains(&self, code: &str) -> bool {
        self.members.iter().any(|m| m == code)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// First member, in discovery order, accepted by `predicate`
    pub fn first_matching(&self, mut predicate: impl FnMut(&str) -> bool) -> Option<&str> {
        self.members
            .iter()
            .map(String::as_str)
            .find(|&code| predicate(code))
    }
}

/// Compute the alias class of `start` over `records`
///
/// Codes are raw ("MATH 1800"). A code without a record, or a record without
/// cross-listings, is a dead end. Each code is marked visited when enqueued,
/// so every code is enqueued at most once and the traversal terminates.
pub fn resolve(start: &str, records: &PrerequisiteRecords) -> AliasClass {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    let mut members = Vec::new();

    visited.insert(start);
    queue.push_back(start);

    while let Some(code) = queue.pop_front() {
        let Some(record) = records.get(code) else {
            continue;
        };
        for neighbor in record.declared_cross_listings() {
            if visited.insert(neighbor.as_str()) {
                members.push(neighbor.clone());
                queue.push_back(neighbor.as_str());
            }
        }
    }

    AliasClass { members }
}
