//! Requirement tree normalization
//!
//! Converts an AND/OR requirement tree into an ordered list of groups, where
//! the list is an AND and each group is an OR of course codes.
//!
//! Each node yields the groups it emits plus a "bubbled" list of alternatives
//! offered to its parent:
//! - Leaf: no groups; bubbles its own code. A node with a missing or unknown
//!   `type` is read the same way below the root.
//! - Or: concatenates its children's groups and bubbled lists; emits no group itself.
//! - And: for each child, emits the child's groups followed by the child's
//!   bubbled list as a new group; bubbles nothing.
//!
//! Only a root tagged `"course"` becomes a single group; every other root
//! goes through the descent, and the root's bubbled list is dropped.
//! So a root Or of plain leaves normalizes to no groups at all, and an And
//! nested directly in an And contributes an empty group. Both shapes are
//! part of the stored format and must not change.

use crate::error::ReferenceFormatError;
use crate::models::{normalize_code, NormalizedRequirements, RequirementGroup, RequirementNode};

/// Normalize an optional requirement tree
///
/// A malformed leaf anywhere in the tree fails the whole tree; the caller
/// decides how to degrade.
pub fn normalize(
    root: Option<&RequirementNode>,
) -> Result<NormalizedRequirements, ReferenceFormatError> {
    match root {
        None => Ok(Vec::new()),
        Some(RequirementNode::Leaf { reference }) => Ok(vec![vec![normalize_code(reference)?]]),
        Some(node) => Ok(descend(node)?.groups),
    }
}

/// Result of normalizing one subtree
#[derive(Debug, Default)]
struct Descent {
    groups: NormalizedRequirements,
    bubbled: RequirementGroup,
}

fn descend(node: &RequirementNode) -> Result<Descent, ReferenceFormatError> {
    match node {
        RequirementNode::Leaf { reference } | RequirementNode::Untyped { reference, .. } => {
            Ok(Descent {
                groups: Vec::new(),
                bubbled: vec![normalize_code(reference)?],
            })
        }
        RequirementNode::And(children) => {
            let mut groups = Vec::new();
            for child in children {
                let descent = descend(child)?;
                groups.extend(descent.groups);
                groups.push(descent.bubbled);
            }
            Ok(Descent {
                groups,
                bubbled: Vec::new(),
            })
        }
        RequirementNode::Or(children) => {
            let mut result = Descent::default();
            for child in children {
                let descent = descend(child)?;
                result.groups.extend(descent.groups);
                result.bubbled.extend(descent.bubbled);
            }
            Ok(result)
        }
    }
}
