//! Unified diff rendering.

use similar::TextDiff;

/// Context lines around each hunk.
const CONTEXT_RADIUS: usize = 3;

/// Render a unified diff between two versions of a file.
///
/// Produces the conventional `--- a/<path>` / `+++ b/<path>` headers and
/// `@@` hunks with three lines of context. Identical inputs render as an
/// empty string.
pub fn unified_diff(old: &str, new: &str, path: &str) -> String {
    if old == new {
        return String::new();
    }

    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(CONTEXT_RADIUS)
        .header(&format!("a/{path}"), &format!("b/{path}"))
        .to_string()
}
