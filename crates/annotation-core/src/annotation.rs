//! Annotation parsing
//!
//! Annotations are supplied on the command line as `"key: value"` strings.
//! The split is purely syntactic: the first colon (plus any whitespace after
//! it) separates key from value, and nothing is trimmed or validated.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use crate::error::{ArtifactError, ArtifactResult};

/// Annotation mapping (key-value metadata)
///
/// Ordered so that serialized manifests are canonical.
pub type Annotations = BTreeMap<String, String>;

static SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r":\s*").expect("static regex is valid"));

/// Parse a single `"key: value"` string
///
/// # Errors
/// Returns `MalformedAnnotation` if the string has no colon
pub fn parse_annotation(raw: &str) -> ArtifactResult<(String, String)> {
    let mut parts = SEPARATOR.splitn(raw, 2);
    match (parts.next(), parts.next()) {
        (Some(key), Some(value)) => Ok((key.to_string(), value.to_string())),
        _ => Err(ArtifactError::MalformedAnnotation(raw.to_string())),
    }
}

/// Parse a sequence of `"key: value"` strings into an annotation mapping
///
/// Parsing stops at the first malformed entry. A repeated key keeps the
/// value of its last occurrence.
///
/// # Errors
/// Returns `MalformedAnnotation` naming the first offending input
pub fn parse_annotations<S: AsRef<str>>(raw: &[S]) -> ArtifactResult<Annotations> {
    let mut annotations = Annotations::new();
    for entry in raw {
        let (key, value) = parse_annotation(entry.as_ref())?;
        annotations.insert(key, value);
    }
    Ok(annotations)
}
