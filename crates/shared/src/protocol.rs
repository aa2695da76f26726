use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored document as returned by the document store API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub key: String,
    pub data: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

pub const MAX_COLLECTION_NAME_LEN: usize = 64;
pub const MAX_DOCUMENT_KEY_LEN: usize = 256;

pub fn is_valid_collection_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_COLLECTION_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Keys travel as a single URL path segment, so dot segments are refused.
pub fn is_valid_document_key(key: &str) -> bool {
    !key.is_empty()
        && key != "."
        && key != ".."
        && key.len() <= MAX_DOCUMENT_KEY_LEN
        && !key.chars().any(|c| c == '/' || c.is_control())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_names_are_restricted() {
        assert!(is_valid_collection_name("todoItems"));
        assert!(is_valid_collection_name("todo_items-2"));
        assert!(!is_valid_collection_name(""));
        assert!(!is_valid_collection_name("todo items"));
        assert!(!is_valid_collection_name(&"a".repeat(MAX_COLLECTION_NAME_LEN + 1)));
    }

    #[test]
    fn document_keys_reject_separators() {
        assert!(is_valid_document_key("0b6f7d1e-6a3c-4e8e-9a53-0c2f1d4d7b11"));
        assert!(!is_valid_document_key(""));
        assert!(!is_valid_document_key("a/b"));
        assert!(!is_valid_document_key("line\nbreak"));
        assert!(!is_valid_document_key("."));
        assert!(!is_valid_document_key(".."));
        assert!(is_valid_document_key("..."));
    }

    #[test]
    fn record_round_trips_camel_case() {
        let json = serde_json::json!({
            "key": "k1",
            "data": { "name": "x" },
            "updatedAt": "2024-08-11T10:00:00Z"
        });
        let record: DocumentRecord = serde_json::from_value(json).expect("decode");
        assert_eq!(record.key, "k1");
        assert_eq!(record.data["name"], "x");
    }
}
