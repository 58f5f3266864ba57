//! Normalized course record, the unit handed to the persistence sink

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Alternatives for one required slot; satisfied by any member
pub type RequirementGroup = Vec<String>;

/// Required slots; every group must be satisfied
pub type NormalizedRequirements = Vec<RequirementGroup>;

/// Suffix appended to the name of a course known only by a cross-listed code
pub const CROSS_LISTED_MARKER: &str = " (Cross-listed Course)";

/// Final per-course record, keyed by normalized code ("CSCI-1200")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRecord {
    pub code: String,
    pub name: String,
    pub requirements: NormalizedRequirements,
    pub corequisites: BTreeSet<String>,
    pub cross_listings: BTreeSet<String>,
}

impl CourseRecord {
    /// Record with a name and nothing else
    pub fn skeleton(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            requirements: Vec::new(),
            corequisites: BTreeSet::new(),
            cross_listings: BTreeSet::new(),
        }
    }

    /// True when the name carries the cross-listing alias marker
    pub fn is_cross_listed_alias(&self) -> bool {
        self.name.ends_with(CROSS_LISTED_MARKER)
    }
}

impl fmt::Display for CourseRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {:?} {:?} {:?}",
            self.code, self.name, self.requirements, self.corequisites, self.cross_listings
        )
    }
}
