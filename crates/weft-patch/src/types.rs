//! Core data model shared by the parser and the applier.

use serde::{Deserialize, Serialize};

/// Placeholder path used when an edit script carries no file header at all.
pub const UNKNOWN_FILE_PATH: &str = "unknown_file";

/// A single search/replace pair captured from an edit script.
///
/// Both blocks are verbatim as captured between the fence lines. Surrounding
/// whitespace matters to the exact and newline-normalized match tiers and is
/// deliberately ignored by the fuzzy tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchOperation {
    /// Text to locate in the target file.
    pub original_block: String,
    /// Text that replaces the located region.
    pub modified_block: String,
}

impl PatchOperation {
    pub fn new(original_block: impl Into<String>, modified_block: impl Into<String>) -> Self {
        Self {
            original_block: original_block.into(),
            modified_block: modified_block.into(),
        }
    }
}

/// All operations destined for one file, in application order.
///
/// Repeated headers for the same path append to the existing entry; entry
/// order in a parse result follows first appearance of each path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePatch {
    pub file_path: String,
    pub operations: Vec<PatchOperation>,
}

/// Outcome of applying one file's operations to its text.
///
/// `modified` always holds the best-effort result. A failed operation leaves
/// the buffer untouched and contributes one entry to `errors`, so a partial
/// success carries both a usable `modified` and a non-empty error list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    pub modified: String,
    pub errors: Vec<String>,
}

impl ApplyResult {
    /// True when every operation applied.
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_serializes_with_camel_case_keys() {
        let op = PatchOperation::new("let x = 1;", "let x = 2;");
        let json = serde_json::to_value(&op).unwrap();

        assert_eq!(json["originalBlock"], "let x = 1;");
        assert_eq!(json["modifiedBlock"], "let x = 2;");
    }

    #[test]
    fn file_patch_round_trips_through_json() {
        let patch = FilePatch {
            file_path: "src/main.rs".to_string(),
            operations: vec![PatchOperation::new("foo", "bar")],
        };

        let json = serde_json::to_string(&patch).unwrap();
        assert!(json.contains("\"filePath\":\"src/main.rs\""));

        let back: FilePatch = serde_json::from_str(&json).unwrap();
        assert_eq!(back, patch);
    }

    #[test]
    fn success_is_derived_from_errors() {
        let ok = ApplyResult {
            modified: "text".to_string(),
            errors: vec![],
        };
        assert!(ok.success());

        let failed = ApplyResult {
            modified: "text".to_string(),
            errors: vec!["no match".to_string()],
        };
        assert!(!failed.success());
    }
}
