//! Course catalog decoding

use crate::error::{DecodeError, SourceDocument};
use serde::Deserialize;
use std::collections::BTreeMap;

/// One officially offered course, keyed by its raw code ("CSCI 1200")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub code: String,
    pub name: String,
}

/// Catalog keyed by raw code, iterated in code order
pub type Catalog = BTreeMap<String, CatalogEntry>;

/// Wire shape of a catalog value; `subj`, `csre` and the rest are ignored
#[derive(Debug, Deserialize)]
struct CatalogJson {
    #[serde(default)]
    name: String,
}

/// Decode the catalog document: `{ "CSCI 1200": { "name": "..." }, ... }`
pub fn decode_catalog(bytes: &[u8]) -> Result<Catalog, DecodeError> {
    let raw: BTreeMap<String, CatalogJson> =
        serde_json::from_slice(bytes).map_err(|source| DecodeError {
            document: SourceDocument::Catalog,
            source,
        })?;

    Ok(raw
        .into_iter()
        .map(|(code, entry)| {
            let catalog_entry = CatalogEntry {
                code: code.clone(),
                name: entry.name,
            };
            (code, catalog_entry)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_catalog() {
        let catalog = decode_catalog(
            br#"{
                "CSCI 1200": {"subj": "CSCI", "csre": "1200", "name": "Data Structures"},
                "MATH 1010": {"name": "Calculus I"}
            }"#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog["CSCI 1200"].name, "Data Structures");
        assert_eq!(catalog["MATH 1010"].code, "MATH 1010");
    }

    #[test]
    fn test_missing_name_is_empty() {
        let catalog = decode_catalog(br#"{"CSCI 1200": {}}"#).unwrap();
        assert_eq!(catalog["CSCI 1200"].name, "");
    }

    #[test]
    fn test_malformed_catalog_is_decode_error() {
        let err = decode_catalog(b"{\"CSCI 1200\": ").unwrap_err();
        assert_eq!(err.document, SourceDocument::Catalog);
    }

    #[test]
    fn test_iteration_is_sorted_by_code() {
        let catalog = decode_catalog(br#"{"MATH 1010": {"name": "b"}, "CSCI 1200": {"name": "a"}}"#).unwrap();
        let codes: Vec<_> = catalog.keys().cloned().collect();
        assert_eq!(codes, vec!["CSCI 1200", "MATH 1010"]);
    }
}
