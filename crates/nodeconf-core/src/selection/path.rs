//! Path expressions
//!
//! `ident(/ident)*` where any segment may carry a key predicate,
//! `ident=k1,k2`. Key text is matched against the list's key leaves after
//! parsing with their formats. Entries without keys display as
//! `ident[row]`, which no path can select.

use crate::errors::{NodeError, Result};
use std::fmt;

/// One `/`-separated segment of a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub ident: String,
    pub keys: Option<Vec<String>>,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ident)?;
        if let Some(keys) = &self.keys {
            write!(f, "={}", keys.join(","))?;
        }
        Ok(())
    }
}

/// Display form of a list entry that has no key values
pub fn positional_segment(ident: &str, row: usize) -> String {
    format!("{}[{}]", ident, row)
}

/// Split a path into segments
///
/// Leading and trailing `/` are ignored; an empty path has no segments.
///
/// # Errors
///
/// `NodeError::InvalidPath` for empty segments, empty idents, empty key
/// values and positional `ident[row]` segments.
pub fn parse(path: &str) -> Result<Vec<Segment>> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    trimmed.split('/').map(parse_segment).collect()
}

fn parse_segment(text: &str) -> Result<Segment> {
    let invalid = |reason: &str| NodeError::InvalidPath {
        segment: text.to_string(),
        reason: reason.to_string(),
    };
    if text.is_empty() {
        return Err(invalid("empty segment"));
    }
    let (ident, keys) = match text.split_once('=') {
        Some((ident, predicate)) => {
            let keys: Vec<String> = predicate.split(',').map(str::to_string).collect();
            if keys.iter().any(String::is_empty) {
                return Err(invalid("empty key value"));
            }
            (ident, Some(keys))
        }
        None => (text, None),
    };
    if ident.is_empty() {
        return Err(invalid("empty ident"));
    }
    if ident.contains(['[', ']']) {
        return Err(invalid("entries without a key cannot be selected by path"));
    }
    Ok(Segment {
        ident: ident.to_string(),
        keys,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_keyed_segments() {
        let segs = parse("/hobbies=birding/favorite/").unwrap();
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].ident, "hobbies");
        assert_eq!(segs[0].keys, Some(vec!["birding".to_string()]));
        assert_eq!(segs[1].keys, None);
    }

    #[test]
    fn test_parse_compound_key() {
        let segs = parse("routes=10.0.0.0,24").unwrap();
        assert_eq!(
            segs[0].keys,
            Some(vec!["10.0.0.0".to_string(), "24".to_string()])
        );
        assert_eq!(segs[0].to_string(), "routes=10.0.0.0,24");
    }

    #[test]
    fn test_parse_rejects_empty_parts() {
        assert!(parse("a//b").is_err());
        assert!(parse("=x").is_err());
        assert!(parse("a=").is_err());
        assert!(parse("a=x,,y").is_err());
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_positional_segment() {
        let shown = positional_segment("birds", 2);
        assert_eq!(shown, "birds[2]");
        let err = parse(&format!("flock/{}", shown)).unwrap_err();
        assert!(matches!(err, NodeError::InvalidPath { segment, .. } if segment == "birds[2]"));
    }
}
