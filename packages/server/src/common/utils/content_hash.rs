use sha2::{Digest, Sha256};

/// Field separator for the identity tuple. A control character so it can
/// never appear in normalized field text.
const FIELD_DELIMITER: char = '\u{1f}';

/// Normalize one identity field before hashing.
///
/// Normalization rules:
/// - Convert to lowercase
/// - Remove all non-alphanumeric characters (except spaces)
/// - Collapse multiple spaces into single spaces
/// - Trim leading/trailing whitespace
///
/// This makes the hash robust against minor formatting changes while
/// still detecting meaningful content changes.
fn normalize_field(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Content hash over a casting call's identity fields.
///
/// A pure function of `(title, description, company, location)`: absent
/// optional fields hash as the empty string, so identical four-tuples
/// always collide regardless of source. The per-field delimiter keeps
/// `("ab", "")` distinct from `("a", "b")`.
pub fn casting_content_hash(
    title: &str,
    description: Option<&str>,
    company: Option<&str>,
    location: Option<&str>,
) -> String {
    let joined = [
        title,
        description.unwrap_or(""),
        company.unwrap_or(""),
        location.unwrap_or(""),
    ]
    .iter()
    .map(|field| normalize_field(field))
    .collect::<Vec<_>>()
    .join(&FIELD_DELIMITER.to_string());

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_64_hex_chars() {
        let hash = casting_content_hash("Actors for Short Film", None, None, None);
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn absent_field_equals_empty_field() {
        let with_none = casting_content_hash("Title", None, Some("Studio"), None);
        let with_empty = casting_content_hash("Title", Some(""), Some("Studio"), Some(""));
        assert_eq!(with_none, with_empty);
    }

    #[test]
    fn field_boundaries_matter() {
        let a = casting_content_hash("ab", None, None, None);
        let b = casting_content_hash("a", Some("b"), None, None);
        assert_ne!(a, b);
    }
}
