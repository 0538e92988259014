//! Structured YAML edit scripts.
//!
//! Besides the fenced text format, edits can arrive as a YAML sequence of
//! items that desugar to the same [`FilePatch`] list:
//!
//! ```yaml
//! - file: src/main.rs
//! - replace:
//!     original: "let x = 1;"
//!     modified: "let x = 2;"
//!     context_before: "fn main() {"
//!     context_after: "}"
//! - insert_after:
//!     anchor: "use std::io;"
//!     content: "use std::fs;"
//! ```
//!
//! `file` switches the current file (reusing an earlier entry when a path
//! repeats), `replace` contributes a search/replace pair with its context
//! lines folded into both blocks, and `insert_after` turns an anchor line
//! into an append-after-anchor pair. Operations arriving before any `file`
//! item land under [`UNKNOWN_FILE_PATH`].
//!
//! Two entry points share the semantics: [`try_parse_yaml_patch`] reports
//! what went wrong, [`parse_yaml_patch`] degrades to skipping malformed
//! items (or returning no patches at all for an unreadable document).

use serde::Deserialize;
use serde_yaml::Value;
use tracing::warn;

use crate::error::{ParseError, Result};
use crate::types::{FilePatch, PatchOperation, UNKNOWN_FILE_PATH};

/// One entry of the YAML sequence. A single item may carry several keys;
/// `file` is always processed before the operations in the same item.
#[derive(Debug, Deserialize)]
struct PatchItem {
    file: Option<String>,
    replace: Option<ReplaceSpec>,
    insert_after: Option<InsertAfterSpec>,
}

#[derive(Debug, Deserialize)]
struct ReplaceSpec {
    original: String,
    modified: String,
    #[serde(default)]
    context_before: String,
    #[serde(default)]
    context_after: String,
}

#[derive(Debug, Deserialize)]
struct InsertAfterSpec {
    anchor: String,
    content: String,
}

/// Parse a YAML edit script, reporting the first problem encountered.
pub fn try_parse_yaml_patch(yaml: &str) -> Result<Vec<FilePatch>> {
    let document: Value = serde_yaml::from_str(yaml)?;
    let Value::Sequence(entries) = document else {
        return Err(ParseError::UnexpectedShape {
            found: value_kind(&document),
        });
    };

    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
        items.push(serde_yaml::from_value::<PatchItem>(entry)?);
    }
    Ok(build_patches(items))
}

/// Parse a YAML edit script leniently.
///
/// Malformed items are skipped; an unreadable or non-sequence document
/// yields no patches. Never fails.
pub fn parse_yaml_patch(yaml: &str) -> Vec<FilePatch> {
    let document: Value = match serde_yaml::from_str(yaml) {
        Ok(document) => document,
        Err(err) => {
            warn!("Discarding unreadable yaml edit script: {}", err);
            return Vec::new();
        }
    };
    let Value::Sequence(entries) = document else {
        warn!(
            "Discarding yaml edit script: expected a sequence, got {}",
            value_kind(&document)
        );
        return Vec::new();
    };

    let items = entries
        .into_iter()
        .filter_map(|entry| match serde_yaml::from_value::<PatchItem>(entry) {
            Ok(item) => Some(item),
            Err(err) => {
                warn!("Skipping malformed yaml patch item: {}", err);
                None
            }
        })
        .collect();
    build_patches(items)
}

/// Fold items into per-file patches, first-seen path order, dropping
/// entries that end up with no operations.
fn build_patches(items: Vec<PatchItem>) -> Vec<FilePatch> {
    let mut patches: Vec<FilePatch> = Vec::new();
    let mut current: Option<usize> = None;

    for item in items {
        if let Some(path) = item.file.as_deref().filter(|path| !path.is_empty()) {
            current = Some(entry_index(&mut patches, path));
        }
        if let Some(replace) = item.replace {
            let target = target_index(&mut patches, &mut current);
            patches[target].operations.push(PatchOperation {
                original_block: compose_block(
                    &replace.context_before,
                    &replace.original,
                    &replace.context_after,
                ),
                modified_block: compose_block(
                    &replace.context_before,
                    &replace.modified,
                    &replace.context_after,
                ),
            });
        }
        if let Some(insert) = item.insert_after {
            let target = target_index(&mut patches, &mut current);
            patches[target].operations.push(PatchOperation {
                original_block: insert.anchor.trim().to_string(),
                modified_block: format!("{}\n{}", insert.anchor, insert.content)
                    .trim()
                    .to_string(),
            });
        }
    }

    patches.retain(|patch| !patch.operations.is_empty());
    patches
}

/// Sandwich a body between its context lines and trim the result, so absent
/// context degrades to the trimmed body alone.
fn compose_block(context_before: &str, body: &str, context_after: &str) -> String {
    format!("{context_before}\n{body}\n{context_after}")
        .trim()
        .to_string()
}

fn entry_index(patches: &mut Vec<FilePatch>, path: &str) -> usize {
    if let Some(found) = patches.iter().position(|patch| patch.file_path == path) {
        return found;
    }
    patches.push(FilePatch {
        file_path: path.to_string(),
        operations: Vec::new(),
    });
    patches.len() - 1
}

fn target_index(patches: &mut Vec<FilePatch>, current: &mut Option<usize>) -> usize {
    match current {
        Some(index) => *index,
        None => {
            let index = entry_index(patches, UNKNOWN_FILE_PATH);
            *current = Some(index);
            index
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
