//! Diff previews for patch review.
//!
//! Renders the outcomes produced by `weft-patch` into unified diffs, change
//! statistics, and per-file review reports. Pure string rendering: nothing
//! here touches the filesystem or decides whether a result is persisted.
//!
//! ```
//! use weft_diff::{FileReport, FileStatus};
//! use weft_patch::{PatchApplier, PatchOperation};
//!
//! let original = "foo\nbaz\n";
//! let result = PatchApplier::new().apply(original, &[PatchOperation::new("foo", "bar")]);
//!
//! let report = FileReport::from_apply("a.txt", original, &result);
//! assert_eq!(report.status(), FileStatus::Changed);
//! assert!(report.diff.contains("+bar"));
//! ```

mod render;
mod summary;

pub use render::unified_diff;
pub use summary::{DiffStats, FileReport, FileStatus};
