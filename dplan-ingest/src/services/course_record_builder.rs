//! Course record assembly
//!
//! Two-phase merge of the decoded catalog and prerequisite records:
//!
//! 1. Every catalog entry becomes a skeleton record (name only).
//! 2. Every prerequisite record either enriches the skeleton with the same
//!    normalized code, or, when the code has no catalog entry (an orphan), is promoted to
//!    its own record if some code in its cross-listing alias class is in the
//!    catalog. Orphans with no anchored alias are dropped and counted.
//!
//! Both input maps are sorted, so the walk order (and therefore which alias
//! anchors an orphan first) is deterministic.

use crate::error::ReferenceFormatError;
use crate::models::{
    normalize_code, Catalog, CourseRecord, PrerequisiteRecord, PrerequisiteRecords,
    CROSS_LISTED_MARKER,
};
use crate::services::{cross_listing_resolver, requirement_normalizer};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Counters collected while building
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    /// Catalog entries turned into skeletons
    pub catalog_entries: usize,
    /// Prerequisite records visited
    pub prerequisite_records: usize,
    /// Catalog-anchored records enriched from a prerequisite record
    pub enriched: usize,
    /// Orphans promoted through a cross-listing
    pub orphans_promoted: usize,
    /// Orphans with no catalog-anchored alias
    pub orphans_dropped: usize,
    /// Malformed course references (requirement trees, corequisites, cross-listings, keys)
    pub reference_format_errors: usize,
}

impl BuildStats {
    pub fn display_string(&self) -> String {
        format!(
            "{} catalog entries, {} prerequisite records, {} enriched, {} orphans promoted, {} orphans dropped, {} malformed references",
            self.catalog_entries,
            self.prerequisite_records,
            self.enriched,
            self.orphans_promoted,
            self.orphans_dropped,
            self.reference_format_errors
        )
    }
}

/// Records ready for persistence plus build counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    /// Sorted by normalized code
    pub records: Vec<CourseRecord>,
    pub stats: BuildStats,
}

/// Merges catalog entries, normalized requirements and resolved aliases
pub struct CourseRecordBuilder<'a> {
    catalog: &'a Catalog,
    prerequisites: &'a PrerequisiteRecords,
}

impl<'a> CourseRecordBuilder<'a> {
    pub fn new(catalog: &'a Catalog, prerequisites: &'a PrerequisiteRecords) -> Self {
        Self {
            catalog,
            prerequisites,
        }
    }

    /// Run both phases and return the batch
    ///
    /// Pure: building twice from the same inputs yields equal output.
    pub fn build(&self) -> BuildOutput {
        let mut stats = BuildStats::default();

        // Phase 1: skeletons, keyed by normalized code
        let mut records: BTreeMap<String, CourseRecord> = BTreeMap::new();
        for (raw_code, entry) in self.catalog {
            let code = record_code(raw_code, &mut stats);
            let skeleton = CourseRecord::skeleton(code.clone(), entry.name.clone());
            if records.insert(code, skeleton).is_some() {
                warn!(raw_code = %raw_code, "Two catalog codes normalize to the same code, keeping the later one");
            }
            stats.catalog_entries += 1;
        }

        // Phase 2: enrich or promote
        let mut promoted: BTreeSet<String> = BTreeSet::new();
        for (raw_code, prerequisite) in self.prerequisites {
            stats.prerequisite_records += 1;
            let code = record_code(raw_code, &mut stats);

            if promoted.contains(&code) {
                warn!(code = %code, raw_code = %raw_code, "Course code already promoted, dropping duplicate");
                stats.orphans_dropped += 1;
                continue;
            }

            if let Some(record) = records.get_mut(&code) {
                apply_prerequisite(record, raw_code, prerequisite, &mut stats);
                stats.enriched += 1;
                continue;
            }

            match self.promote_orphan(raw_code, code, prerequisite, &mut stats) {
                Some(record) => {
                    promoted.insert(record.code.clone());
                    records.insert(record.code.clone(), record);
                    stats.orphans_promoted += 1;
                }
                None => {
                    debug!(code = %raw_code, "Dropping course with no catalog-anchored cross-listing");
                    stats.orphans_dropped += 1;
                }
            }
        }

        BuildOutput {
            records: records.into_values().collect(),
            stats,
        }
    }

    /// Build a record for an orphan code anchored by a cross-listed catalog course
    fn promote_orphan(
        &self,
        raw_code: &str,
        code: String,
        prerequisite: &PrerequisiteRecord,
        stats: &mut BuildStats,
    ) -> Option<CourseRecord> {
        if prerequisite.declared_cross_listings().is_empty() {
            return None;
        }

        let aliases = cross_listing_resolver::resolve(raw_code, self.prerequisites);
        let anchor = aliases.first_matching(|alias| self.catalog.contains_key(alias))?;

        info!(code = %raw_code, anchor = %anchor, "Promoting cross-listed course");

        let mut record = CourseRecord::skeleton(code, format!("{}{}", raw_code, CROSS_LISTED_MARKER));
        apply_prerequisite(&mut record, raw_code, prerequisite, stats);
        Some(record)
    }
}

/// Set requirements, corequisites and cross-listings from a prerequisite record
///
/// Absent fields leave the record's current values untouched. A malformed
/// requirement tree leaves the requirements empty.
fn apply_prerequisite(
    record: &mut CourseRecord,
    raw_code: &str,
    prerequisite: &PrerequisiteRecord,
    stats: &mut BuildStats,
) {
    if let Some(corequisites) = &prerequisite.corequisites {
        record.corequisites = normalize_code_set(raw_code, "corequisite", corequisites, stats);
    }

    if let Some(tree) = &prerequisite.prerequisites {
        match requirement_normalizer::normalize(Some(tree)) {
            Ok(requirements) => record.requirements = requirements,
            Err(ReferenceFormatError { reference }) => {
                warn!(
                    code = %raw_code,
                    reference = %reference,
                    "Malformed course reference in requirement tree, omitting requirements"
                );
                stats.reference_format_errors += 1;
                record.requirements = Vec::new();
            }
        }
    }

    if let Some(cross_listings) = &prerequisite.cross_listings {
        record.cross_listings = normalize_code_set(raw_code, "cross-listing", cross_listings, stats);
    }
}

/// Normalize a list of raw codes, dropping malformed entries
fn normalize_code_set(
    raw_code: &str,
    kind: &str,
    references: &[String],
    stats: &mut BuildStats,
) -> BTreeSet<String> {
    references
        .iter()
        .filter_map(|reference| match normalize_code(reference) {
            Ok(code) => Some(code),
            Err(err) => {
                warn!(code = %raw_code, kind, reference = %err.reference, "Dropping malformed course reference");
                stats.reference_format_errors += 1;
                None
            }
        })
        .collect()
}

/// Normalized code for a record key; malformed keys are kept verbatim
fn record_code(raw_code: &str, stats: &mut BuildStats) -> String {
    match normalize_code(raw_code) {
        Ok(code) => code,
        Err(_) => {
            warn!(code = %raw_code, "Course code is not SUBJECT NUMBER, storing it unchanged");
            stats.reference_format_errors += 1;
            raw_code.trim().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{decode_catalog, decode_prerequisites, CatalogEntry, RequirementNode as N};

    fn catalog(entries: &[(&str, &str)]) -> Catalog {
        entries
            .iter()
            .map(|(code, name)| {
                (
                    code.to_string(),
                    CatalogEntry {
                        code: code.to_string(),
                        name: name.to_string(),
                    },
                )
            })
            .collect()
    }

    fn codes(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn find<'r>(output: &'r BuildOutput, code: &str) -> Option<&'r CourseRecord> {
        output.records.iter().find(|r| r.code == code)
    }

    #[test]
    fn test_catalog_only_produces_skeletons() {
        let catalog = catalog(&[("CSCI 1200", "Data Structures"), ("MATH 1010", "Calculus I")]);
        let prerequisites = PrerequisiteRecords::new();

        let output = CourseRecordBuilder::new(&catalog, &prerequisites).build();

        assert_eq!(
            output.records,
            vec![
                CourseRecord::skeleton("CSCI-1200", "Data Structures"),
                CourseRecord::skeleton("MATH-1010", "Calculus I"),
            ]
        );
        assert_eq!(output.stats.catalog_entries, 2);
        assert_eq!(output.stats.enriched, 0);
    }

    #[test]
    fn test_catalog_record_is_enriched() {
        let catalog = catalog(&[("CSCI 2300", "Intro to Algorithms")]);
        let mut prerequisites = PrerequisiteRecords::new();
        prerequisites.insert(
            "CSCI 2300".to_string(),
            PrerequisiteRecord {
                corequisites: Some(vec!["CSCI 2301".to_string()]),
                cross_listings: Some(vec![]),
                prerequisites: Some(N::and(vec![
                    N::leaf("CSCI 1200"),
                    N::or(vec![N::leaf("MATH 2800"), N::leaf("CSCI 2200")]),
                ])),
            },
        );

        let output = CourseRecordBuilder::new(&catalog, &prerequisites).build();
        let record = find(&output, "CSCI-2300").unwrap();

        assert_eq!(record.name, "Intro to Algorithms");
        assert_eq!(
            record.requirements,
            vec![
                vec!["CSCI-1200".to_string()],
                vec!["MATH-2800".to_string(), "CSCI-2200".to_string()],
            ]
        );
        assert_eq!(record.corequisites, codes(&["CSCI-2301"]));
        assert!(record.cross_listings.is_empty());
        assert_eq!(output.stats.enriched, 1);
    }

    #[test]
    fn test_orphan_promoted_under_its_own_code() {
        let catalog = catalog(&[("MATH 1800", "Intro to Proofs")]);
        let prerequisites = decode_prerequisites(
            br#"{
                "MATH 1800X": {
                    "corequisites": ["MATH 1801"],
                    "cross_listings": ["MATH 1800"],
                    "prerequisites": {"type": "course", "course": "MATH 1010"}
                }
            }"#,
        )
        .unwrap();

        let output = CourseRecordBuilder::new(&catalog, &prerequisites).build();

        let promoted = find(&output, "MATH-1800X").unwrap();
        assert_eq!(promoted.name, "MATH 1800X (Cross-listed Course)");
        assert!(promoted.is_cross_listed_alias());
        assert_eq!(promoted.requirements, vec![vec!["MATH-1010".to_string()]]);
        assert_eq!(promoted.corequisites, codes(&["MATH-1801"]));
        assert_eq!(promoted.cross_listings, codes(&["MATH-1800"]));

        let anchor = find(&output, "MATH-1800").unwrap();
        assert_eq!(anchor, &CourseRecord::skeleton("MATH-1800", "Intro to Proofs"));

        assert_eq!(output.records.len(), 2);
        assert_eq!(output.stats.orphans_promoted, 1);
        assert_eq!(output.stats.orphans_dropped, 0);
    }

    #[test]
    fn test_orphan_promoted_through_multi_hop_chain() {
        let catalog = catalog(&[("CSCI 4020", "Design and Analysis of Algorithms")]);
        let prerequisites = decode_prerequisites(
            br#"{
                "ITWS 4020": {"cross_listings": ["COGS 4020"]},
                "COGS 4020": {"cross_listings": ["CSCI 4020"]}
            }"#,
        )
        .unwrap();

        let output = CourseRecordBuilder::new(&catalog, &prerequisites).build();

        assert!(find(&output, "ITWS-4020").is_some());
        assert!(find(&output, "COGS-4020").is_some());
        assert_eq!(output.stats.orphans_promoted, 2);
    }

    #[test]
    fn test_orphan_without_anchor_is_dropped() {
        let catalog = catalog(&[("CSCI 1200", "Data Structures")]);
        let prerequisites = decode_prerequisites(
            br#"{
                "PHIL 4961": {"cross_listings": ["PSYC 4961"]},
                "PSYC 4961": {"cross_listings": ["PHIL 4961"]},
                "ARCH 4000": {"prerequisites": {"type": "course", "course": "ARCH 2000"}}
            }"#,
        )
        .unwrap();

        let output = CourseRecordBuilder::new(&catalog, &prerequisites).build();

        assert_eq!(output.records.len(), 1);
        assert_eq!(output.stats.orphans_dropped, 3);
        assert_eq!(output.stats.orphans_promoted, 0);
    }

    #[test]
    fn test_reverse_edge_is_not_synthesized() {
        // The catalog course lists the orphan, but the orphan lists nothing.
        let catalog = catalog(&[("CSCI 1200", "Data Structures")]);
        let prerequisites = decode_prerequisites(
            br#"{
                "CSCI 1200": {"cross_listings": ["ITWS 1200"]},
                "ITWS 1200": {"cross_listings": []}
            }"#,
        )
        .unwrap();

        let output = CourseRecordBuilder::new(&catalog, &prerequisites).build();
        assert!(find(&output, "ITWS-1200").is_none());
        assert_eq!(output.stats.orphans_dropped, 1);
    }

    #[test]
    fn test_malformed_reference_omits_requirements_only() {
        let catalog = catalog(&[("CSCI 2300", "Intro to Algorithms"), ("CSCI 1200", "Data Structures")]);
        let prerequisites = decode_prerequisites(
            br#"{
                "CSCI 2300": {
                    "corequisites": ["CSCI 2301", "CSCI2302"],
                    "prerequisites": {"type": "and", "nested": [
                        {"type": "course", "course": "CSCI 1200"},
                        {"type": "course", "course": "CSCI1100"}
                    ]}
                },
                "CSCI 1200": {"prerequisites": {"type": "course", "course": "CSCI 1100"}}
            }"#,
        )
        .unwrap();

        let output = CourseRecordBuilder::new(&catalog, &prerequisites).build();

        let broken = find(&output, "CSCI-2300").unwrap();
        assert!(broken.requirements.is_empty());
        assert_eq!(broken.corequisites, codes(&["CSCI-2301"]));

        let intact = find(&output, "CSCI-1200").unwrap();
        assert_eq!(intact.requirements, vec![vec!["CSCI-1100".to_string()]]);

        assert_eq!(output.stats.reference_format_errors, 2);
    }

    #[test]
    fn test_whitespace_variant_enriches_catalog_record() {
        let catalog = catalog(&[("CSCI 1200", "Data Structures")]);
        let prerequisites = decode_prerequisites(
            br#"{
                "CSCI 1200 ": {
                    "cross_listings": ["CSCI 1200"],
                    "prerequisites": {"type": "course", "course": "CSCI 1100"}
                }
            }"#,
        )
        .unwrap();

        let output = CourseRecordBuilder::new(&catalog, &prerequisites).build();

        assert_eq!(output.records.len(), 1);
        let record = &output.records[0];
        assert_eq!(record.code, "CSCI-1200");
        assert_eq!(record.name, "Data Structures");
        assert_eq!(record.requirements, vec![vec!["CSCI-1100".to_string()]]);
        assert_eq!(output.stats.enriched, 1);
        assert_eq!(output.stats.orphans_promoted, 0);
    }

    #[test]
    fn test_second_variant_of_promoted_code_is_dropped() {
        let catalog = catalog(&[("MATH 1800", "Intro to Proofs")]);
        let prerequisites = decode_prerequisites(
            br#"{
                "MATH 1800X": {"cross_listings": ["MATH 1800"], "corequisites": ["MATH 1801"]},
                "MATH 1800X ": {"cross_listings": ["MATH 1800"], "corequisites": ["MATH 1802"]}
            }"#,
        )
        .unwrap();

        let output = CourseRecordBuilder::new(&catalog, &prerequisites).build();

        let promoted = find(&output, "MATH-1800X").unwrap();
        assert_eq!(promoted.corequisites, codes(&["MATH-1801"]));
        assert_eq!(output.stats.orphans_promoted, 1);
        assert_eq!(output.stats.orphans_dropped, 1);
        assert_eq!(output.records.len(), 2);
    }

    #[test]
    fn test_absent_fields_leave_skeleton_values() {
        let catalog = catalog(&[("CSCI 1200", "Data Structures")]);
        let prerequisites = decode_prerequisites(br#"{"CSCI 1200": {}}"#).unwrap();

        let output = CourseRecordBuilder::new(&catalog, &prerequisites).build();
        assert_eq!(
            output.records,
            vec![CourseRecord::skeleton("CSCI-1200", "Data Structures")]
        );
        assert_eq!(output.stats.enriched, 1);
    }

    #[test]
    fn test_build_is_repeatable() {
        let catalog = decode_catalog(
            br#"{"CSCI 1200": {"name": "Data Structures"}, "MATH 1800": {"name": "Intro to Proofs"}}"#,
        )
        .unwrap();
        let prerequisites = decode_prerequisites(
            br#"{
                "CSCI 1200": {"prerequisites": {"type": "and", "nested": [
                    {"type": "or", "nested": [
                        {"type": "course", "course": "CSCI 1100"},
                        {"type": "course", "course": "ENGR 1200"}
                    ]},
                    {"type": "course", "course": "MATH 1010"}
                ]}},
                "MATH 1800X": {"cross_listings": ["MATH 1800"]}
            }"#,
        )
        .unwrap();

        let builder = CourseRecordBuilder::new(&catalog, &prerequisites);
        let first = builder.build();
        let second = builder.build();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first.records).unwrap(),
            serde_json::to_vec(&second.records).unwrap()
        );
        assert_eq!(first.records[0].requirements.len(), 2);
    }

    #[test]
    fn test_batch_is_sorted_by_normalized_code() {
        let catalog = catalog(&[("MATH 1010", "Calculus I"), ("CSCI 1200", "Data Structures")]);
        let prerequisites = decode_prerequisites(br#"{"BIOL 1010X": {"cross_listings": ["MATH 1010"]}}"#).unwrap();

        let output = CourseRecordBuilder::new(&catalog, &prerequisites).build();
        let order: Vec<_> = output.records.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(order, vec!["BIOL-1010X", "CSCI-1200", "MATH-1010"]);
    }
}
