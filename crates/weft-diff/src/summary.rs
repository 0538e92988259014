//! Per-file review summaries of apply outcomes.

use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};
use weft_patch::ApplyResult;

use crate::render::unified_diff;

/// Line counts of a change between two versions of a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub insertions: usize,
    pub deletions: usize,
}

impl DiffStats {
    /// Count inserted and deleted lines between two texts.
    pub fn measure(old: &str, new: &str) -> Self {
        let diff = TextDiff::from_lines(old, new);
        let mut stats = Self::default();
        for change in diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Insert => stats.insertions += 1,
                ChangeTag::Delete => stats.deletions += 1,
                ChangeTag::Equal => {}
            }
        }
        stats
    }

    pub fn is_changed(&self) -> bool {
        self.insertions > 0 || self.deletions > 0
    }
}

/// Review status of one file after an apply pass.
///
/// A file with any failed operation reports `Failed` even when other
/// operations changed it; the caller decides whether to keep the partial
/// result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Changed,
    Unchanged,
    Failed,
}

/// Everything a review surface needs to present one file's outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub file_path: String,
    pub diff: String,
    pub stats: DiffStats,
    pub errors: Vec<String>,
}

impl FileReport {
    /// Build the report for one file from its original text and the result
    /// of applying its operations.
    pub fn from_apply(path: &str, original: &str, result: &ApplyResult) -> Self {
        Self {
            file_path: path.to_string(),
            diff: unified_diff(original, &result.modified, path),
            stats: DiffStats::measure(original, &result.modified),
            errors: result.errors.clone(),
        }
    }

    pub fn status(&self) -> FileStatus {
        if !self.errors.is_empty() {
            FileStatus::Failed
        } else if self.stats.is_changed() {
            FileStatus::Changed
        } else {
            FileStatus::Unchanged
        }
    }
}
