//! Course code normalization
//!
//! Source documents write codes as "SUBJECT NUMBER" ("CSCI 1200"). Stored
//! records use "SUBJECT-NUMBER" ("CSCI-1200").

use crate::error::ReferenceFormatError;

/// Convert a raw "SUBJECT NUMBER" reference into "SUBJECT-NUMBER"
///
/// Exactly two whitespace-separated tokens are required.
pub fn normalize_code(reference: &str) -> Result<String, ReferenceFormatError> {
    let mut tokens = reference.split_whitespace();
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(subject), Some(number), None) => Ok(format!("{}-{}", subject, number)),
        _ => Err(ReferenceFormatError {
            reference: reference.to_string(),
        }),
    }
}
