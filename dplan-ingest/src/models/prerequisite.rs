//! Prerequisite record decoding
//!
//! Each record carries optional corequisites, optional cross-listings and an
//! optional boolean requirement tree:
//!
//! ```json
//! {
//!   "CSCI 2300": {
//!     "corequisites": ["CSCI 2301"],
//!     "cross_listings": [],
//!     "prerequisites": {
//!       "type": "and",
//!       "nested": [
//!         {"type": "course", "course": "CSCI 1200"},
//!         {"type": "or", "nested": [
//!           {"type": "course", "course": "MATH 2800"},
//!           {"type": "course", "course": "CSCI 2200"}
//!         ]}
//!       ]
//!     }
//!   }
//! }
//! ```

use crate::error::{DecodeError, SourceDocument};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Boolean requirement tree
///
/// Always finite: built fresh from JSON on every decode.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RequirementJson")]
pub enum RequirementNode {
    /// Single course reference, raw form ("CSCI 1200")
    Leaf { reference: String },
    /// Node whose `type` is missing or unrecognized; read as a course reference
    Untyped { kind: String, reference: String },
    /// Every child is required
    And(Vec<RequirementNode>),
    /// Any one child suffices
    Or(Vec<RequirementNode>),
}

impl RequirementNode {
    pub fn leaf(reference: impl Into<String>) -> Self {
        RequirementNode::Leaf {
            reference: reference.into(),
        }
    }

    pub fn and(children: Vec<RequirementNode>) -> Self {
        RequirementNode::And(children)
    }

    pub fn or(children: Vec<RequirementNode>) -> Self {
        RequirementNode::Or(children)
    }
}

/// Wire shape of a requirement node
#[derive(Debug, Deserialize)]
struct RequirementJson {
    #[serde(default)]
    course: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    nested: Option<Vec<RequirementJson>>,
}

impl From<RequirementJson> for RequirementNode {
    fn from(json: RequirementJson) -> Self {
        let children: Vec<RequirementNode> = json
            .nested
            .unwrap_or_default()
            .into_iter()
            .map(RequirementNode::from)
            .collect();

        match json.kind.as_deref() {
            Some("and") => RequirementNode::And(children),
            Some("or") => RequirementNode::Or(children),
            Some("course") => RequirementNode::Leaf {
                reference: json.course.unwrap_or_default(),
            },
            other => RequirementNode::Untyped {
                kind: other.unwrap_or_default().to_string(),
                reference: json.course.unwrap_or_default(),
            },
        }
    }
}

/// One entry of the prerequisite document
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PrerequisiteRecord {
    #[serde(default)]
    pub corequisites: Option<Vec<String>>,
    #[serde(default)]
    pub cross_listings: Option<Vec<String>>,
    #[serde(default)]
    pub prerequisites: Option<RequirementNode>,
}

impl PrerequisiteRecord {
    /// Declared cross-listings, empty when absent
    pub fn declared_cross_listings(&self) -> &[String] {
        self.cross_listings.as_deref().unwrap_or(&[])
    }
}

/// Prerequisite records keyed by raw code, iterated in code order
pub type PrerequisiteRecords = BTreeMap<String, PrerequisiteRecord>;

/// Decode the prerequisite document
pub fn decode_prerequisites(bytes: &[u8]) -> Result<PrerequisiteRecords, DecodeError> {
    serde_json::from_slice(bytes).map_err(|source| DecodeError {
        document: SourceDocument::Prerequisites,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_nested_tree() {
        let records = decode_prerequisites(
            br#"{
                "CSCI 2300": {
                    "corequisites": ["CSCI 2301"],
                    "prerequisites": {
                        "course": "",
                        "type": "and",
                        "nested": [
                            {"course": "CSCI 1200", "type": "course"},
                            {"type": "or", "nested": [
                                {"course": "MATH 2800", "type": "course"},
                                {"course": "CSCI 2200", "type": "course"}
                            ]}
                        ]
                    }
                }
            }"#,
        )
        .unwrap();

        let record = &records["CSCI 2300"];
        assert_eq!(record.corequisites, Some(vec!["CSCI 2301".to_string()]));
        assert_eq!(record.cross_listings, None);
        assert_eq!(
            record.prerequisites,
            Some(RequirementNode::and(vec![
                RequirementNode::leaf("CSCI 1200"),
                RequirementNode::or(vec![
                    RequirementNode::leaf("MATH 2800"),
                    RequirementNode::leaf("CSCI 2200"),
                ]),
            ]))
        );
    }

    #[test]
    fn test_null_fields_are_absent() {
        let records = decode_prerequisites(
            br#"{"CSCI 1100": {"corequisites": null, "cross_listings": null, "prerequisites": null}}"#,
        )
        .unwrap();
        assert_eq!(records["CSCI 1100"], PrerequisiteRecord::default());
    }

    #[test]
    fn test_unknown_type_keeps_its_tag() {
        let records = decode_prerequisites(
            br#"{
                "CSCI 4430": {"prerequisites": {"type": "permission", "course": "CSCI 4000"}},
                "CSCI 4440": {"prerequisites": {"course": "CSCI 4000"}}
            }"#,
        )
        .unwrap();
        assert_eq!(
            records["CSCI 4430"].prerequisites,
            Some(RequirementNode::Untyped {
                kind: "permission".to_string(),
                reference: "CSCI 4000".to_string(),
            })
        );
        assert_eq!(
            records["CSCI 4440"].prerequisites,
            Some(RequirementNode::Untyped {
                kind: String::new(),
                reference: "CSCI 4000".to_string(),
            })
        );
    }

    #[test]
    fn test_and_without_nested_has_no_children() {
        let records =
            decode_prerequisites(br#"{"CSCI 4430": {"prerequisites": {"type": "and"}}}"#).unwrap();
        assert_eq!(records["CSCI 4430"].prerequisites, Some(RequirementNode::and(vec![])));
    }

    #[test]
    fn test_null_nested_is_empty() {
        let records = decode_prerequisites(
            br#"{"CSCI 4430": {"prerequisites": {"type": "or", "course": null, "nested": null}}}"#,
        )
        .unwrap();
        assert_eq!(records["CSCI 4430"].prerequisites, Some(RequirementNode::or(vec![])));
    }

    #[test]
    fn test_malformed_document_is_decode_error() {
        let err = decode_prerequisites(br#"{"CSCI 1100": {"prerequisites": 7}}"#).unwrap_err();
        assert_eq!(err.document, SourceDocument::Prerequisites);
    }

    #[test]
    fn test_declared_cross_listings_default_empty() {
        let record = PrerequisiteRecord::default();
        assert!(record.declared_cross_listings().is_empty());
    }
}
