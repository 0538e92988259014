//! Edit-script parsing: file segmentation and fenced-hunk extraction.
//!
//! An edit script is free-form text mixing prose, `File:` header lines, and
//! search/replace hunks delimited by fence lines:
//!
//! ```text
//! ### File: path/to/file.ext
//! <<<<<<< SEARCH
//! original snippet
//! =======
//! replacement snippet
//! >>>>>>> REPLACE
//! ```
//!
//! Parsing is deliberately permissive. Malformed or unterminated hunks yield
//! nothing for that span rather than failing the whole script, and anything
//! that is not a header or a fence is ignored.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::types::{FilePatch, PatchOperation, UNKNOWN_FILE_PATH};

/// Matches a file header line: up to three `#`, optional whitespace, the
/// keyword `File:` (any case), then the path as the rest of the line.
static FILE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^#{0,3}[ \t]*file:[ \t]*(.*)$").expect("invalid file header regex")
});

/// Minimum run of delimiter characters for a line to count as a fence.
const MIN_FENCE_WIDTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FenceKind {
    SearchOpen,
    Divider,
    ReplaceClose,
}

/// A fence line located within a segment.
#[derive(Debug, Clone, Copy)]
struct FenceLine {
    kind: FenceKind,
    /// Byte offset of the first character of the fence line.
    line_start: usize,
    /// Byte offset just past the fence line's terminator.
    next_line: usize,
}

/// Parser for fenced search/replace edit scripts.
///
/// `parse` never fails: malformed input degrades to fewer (or zero)
/// operations, and the same input always produces the same output.
pub struct PatchParser;

impl PatchParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a raw edit script into per-file patches.
    ///
    /// File headers split the script into segments and each segment is
    /// scanned for hunks. Repeated headers for one path append to that
    /// path's entry. When the script has no headers at all, the whole text
    /// is treated as a single implicit file named [`UNKNOWN_FILE_PATH`],
    /// emitted only if it contains at least one hunk.
    pub fn parse(&self, raw: &str) -> Vec<FilePatch> {
        let headers = locate_headers(raw);

        if headers.is_empty() {
            let operations = extract_operations(raw);
            if operations.is_empty() {
                return Vec::new();
            }
            debug!(
                "No file headers found; emitting {} operation(s) under fallback path",
                operations.len()
            );
            return vec![FilePatch {
                file_path: UNKNOWN_FILE_PATH.to_string(),
                operations,
            }];
        }

        let mut patches: Vec<FilePatch> = Vec::new();
        for (idx, (start, path)) in headers.iter().enumerate() {
            let end = headers.get(idx + 1).map_or(raw.len(), |(next, _)| *next);
            let operations = extract_operations(&raw[*start..end]);
            if operations.is_empty() {
                continue;
            }
            // Same path seen again: append, preserving first-seen entry order.
            match patches.iter_mut().find(|patch| patch.file_path == *path) {
                Some(existing) => existing.operations.extend(operations),
                None => patches.push(FilePatch {
                    file_path: path.clone(),
                    operations,
                }),
            }
        }

        debug!("Parsed edit script into {} file patch(es)", patches.len());
        patches
    }
}

impl Default for PatchParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Locate every file header in the script as (byte offset, trimmed path).
///
/// A header whose path trims to nothing is treated as prose.
fn locate_headers(raw: &str) -> Vec<(usize, String)> {
    FILE_HEADER
        .captures_iter(raw)
        .filter_map(|caps| {
            let whole = caps.get(0).unwrap();
            let path = caps.get(1).unwrap().as_str().trim();
            if path.is_empty() {
                return None;
            }
            Some((whole.start(), path.to_string()))
        })
        .collect()
}

/// Extract every complete search/replace hunk from one segment, in document
/// order.
///
/// All fence lines are located up front and then paired in a single forward
/// walk; no scan position survives between calls. Unterminated hunks are
/// dropped without emitting anything.
fn extract_operations(segment: &str) -> Vec<PatchOperation> {
    let fences = scan_fences(segment);
    let mut operations = Vec::new();
    let mut idx = 0;

    while idx < fences.len() {
        if fences[idx].kind != FenceKind::SearchOpen {
            idx += 1;
            continue;
        }
        match complete_hunk(&fences, idx) {
            Some((divider, close)) => {
                operations.push(PatchOperation {
                    original_block: payload_between(segment, &fences[idx], &fences[divider]),
                    modified_block: payload_between(segment, &fences[divider], &fences[close]),
                });
                idx = close + 1;
            }
            None => {
                warn!("Dropping unterminated search/replace hunk");
                idx += 1;
            }
        }
    }

    operations
}

/// Find the divider and closing fence completing the hunk opened at `open`.
///
/// The first divider ends the search block and the first closing fence after
/// it ends the replacement; fence lines of the wrong kind for the current
/// phase are payload text. Another opening fence before completion abandons
/// the hunk.
fn complete_hunk(fences: &[FenceLine], open: usize) -> Option<(usize, usize)> {
    let mut divider = None;
    for idx in open + 1..fences.len() {
        match (fences[idx].kind, divider) {
            (FenceKind::SearchOpen, _) => return None,
            (FenceKind::Divider, None) => divider = Some(idx),
            (FenceKind::ReplaceClose, Some(div)) => return Some((div, idx)),
            _ => {}
        }
    }
    None
}

/// Scan a segment line by line, recording every fence line with its offsets.
fn scan_fences(segment: &str) -> Vec<FenceLine> {
    let mut fences = Vec::new();
    let mut line_start = 0;

    while line_start < segment.len() {
        let line_end = segment[line_start..]
            .find('\n')
            .map(|pos| line_start + pos)
            .unwrap_or(segment.len());
        let next_line = (line_end + 1).min(segment.len());

        if let Some(kind) = classify_fence(&segment[line_start..line_end]) {
            fences.push(FenceLine {
                kind,
                line_start,
                next_line,
            });
        }
        line_start = next_line;
    }

    fences
}

/// Classify one line (without its terminator) as a fence, if it is one.
///
/// A fence is a run of at least [`MIN_FENCE_WIDTH`] identical delimiter
/// characters followed by optional whitespace and the phase keyword: `<` runs
/// take `SEARCH`, `>` runs take `REPLACE` (both case-insensitive), `=` runs
/// take nothing. Any other trailing content keeps the line ordinary text, so
/// git conflict markers like `<<<<<<< HEAD` are never misread as fences.
fn classify_fence(line: &str) -> Option<FenceKind> {
    let trimmed = line.trim_end();
    let first = *trimmed.as_bytes().first()?;
    let run = trimmed.bytes().take_while(|&byte| byte == first).count();
    if run < MIN_FENCE_WIDTH {
        return None;
    }
    let rest = trimmed[run..].trim_start();

    match first {
        b'<' if rest.eq_ignore_ascii_case("SEARCH") => Some(FenceKind::SearchOpen),
        b'=' if rest.is_empty() => Some(FenceKind::Divider),
        b'>' if rest.eq_ignore_ascii_case("REPLACE") => Some(FenceKind::ReplaceClose),
        _ => None,
    }
}

/// Slice the verbatim payload between two fence lines.
///
/// The terminator ending the first fence line and the terminator immediately
/// before the second fence line are structural and excluded; everything in
/// between, including interior CRLF terminators and surrounding spaces, is
/// kept exactly as written.
fn payload_between(segment: &str, after: &FenceLine, before: &FenceLine) -> String {
    let start = after.next_line;
    let mut end = before.line_start;
    if end > start && segment.as_bytes()[end - 1] == b'\n' {
        end -= 1;
        if end > start && segment.as_bytes()[end - 1] == b'\r' {
            end -= 1;
        }
    }
    segment[start..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parse(raw: &str) -> Vec<FilePatch> {
        PatchParser::new().parse(raw)
    }

    #[test]
    fn parses_single_hunk_with_header() {
        let script = "### File: src/main.rs\n\
                      <<<<<<< SEARCH\n\
                      let x = 1;\n\
                      =======\n\
                      let x = 2;\n\
                      >>>>>>> REPLACE\n";

        let patches = parse(script);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].file_path, "src/main.rs");
        assert_eq!(patches[0].operations.len(), 1);
        assert_eq!(patches[0].operations[0].original_block, "let x = 1;");
        assert_eq!(patches[0].operations[0].modified_block, "let x = 2;");
    }

    #[test]
    fn parses_hunk_closed_at_end_of_text() {
        let script = "File: a.txt\n<<<<<<< SEARCH\nfoo\n=======\nbar\n>>>>>>> REPLACE";

        let patches = parse(script);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].operations[0].original_block, "foo");
        assert_eq!(patches[0].operations[0].modified_block, "bar");
    }

    #[test]
    fn captures_payload_verbatim() {
        let script = "<<<<<<< SEARCH\n    indented line  \n\nsecond\n=======\n\treplacement\n>>>>>>> REPLACE\n";

        let patches = parse(script);
        let op = &patches[0].operations[0];
        assert_eq!(op.original_block, "    indented line  \n\nsecond");
        assert_eq!(op.modified_block, "\treplacement");
    }

    #[test]
    fn captures_empty_blocks() {
        let script = "<<<<<<< SEARCH\n=======\nnew text\n>>>>>>> REPLACE\n";

        let patches = parse(script);
        let op = &patches[0].operations[0];
        assert_eq!(op.original_block, "");
        assert_eq!(op.modified_block, "new text");

        let script = "<<<<<<< SEARCH\nold text\n=======\n>>>>>>> REPLACE\n";
        let op = &parse(script)[0].operations[0];
        assert_eq!(op.original_block, "old text");
        assert_eq!(op.modified_block, "");
    }

    #[test]
    fn accepts_fence_width_and_case_variations() {
        let script = "<<<<<<<<<<<< search\nfoo\n==========\nbar\n>>>>> Replace\n";

        let patches = parse(script);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].operations[0].original_block, "foo");
    }

    #[test]
    fn accepts_keyword_without_separating_space() {
        let script = "<<<<<<<SEARCH\nfoo\n=======\nbar\n>>>>>>>REPLACE\n";

        let patches = parse(script);
        assert_eq!(patches.len(), 1);
    }

    #[test]
    fn conflict_markers_are_not_fences() {
        let script = "<<<<<<< HEAD\nours\n=======\ntheirs\n>>>>>>> branch\n";

        assert!(parse(script).is_empty());
    }

    #[test]
    fn short_fence_runs_are_ignored() {
        let script = "<<<< SEARCH\nfoo\n====\nbar\n>>>> REPLACE\n";

        assert!(parse(script).is_empty());
    }

    #[test]
    fn drops_hunk_without_divider() {
        let script = "<<<<<<< SEARCH\nfoo\n>>>>>>> REPLACE\n";

        assert!(parse(script).is_empty());
    }

    #[test]
    fn drops_hunk_without_closing_fence() {
        let script = "<<<<<<< SEARCH\nfoo\n=======\nbar\n";

        assert!(parse(script).is_empty());
    }

    #[test]
    fn reopened_hunk_drops_the_unterminated_one() {
        let script = "<<<<<<< SEARCH\nlost\n=======\n\
                      <<<<<<< SEARCH\nkept\n=======\nnew\n>>>>>>> REPLACE\n";

        let patches = parse(script);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].operations.len(), 1);
        assert_eq!(patches[0].operations[0].original_block, "kept");
    }

    #[test]
    fn closing_fence_before_divider_is_search_payload() {
        let script = "<<<<<<< SEARCH\nfoo\n>>>>>>> REPLACE\nbar\n=======\nbaz\n>>>>>>> REPLACE\n";

        let op = &parse(script)[0].operations[0];
        assert_eq!(op.original_block, "foo\n>>>>>>> REPLACE\nbar");
        assert_eq!(op.modified_block, "baz");
    }

    #[test]
    fn second_divider_is_replacement_payload() {
        let script = "<<<<<<< SEARCH\nfoo\n=======\nbar\n=======\n>>>>>>> REPLACE\n";

        let op = &parse(script)[0].operations[0];
        assert_eq!(op.original_block, "foo");
        assert_eq!(op.modified_block, "bar\n=======");
    }

    #[test]
    fn captures_multiple_hunks_in_document_order() {
        let script = "<<<<<<< SEARCH\na\n=======\nA\n>>>>>>> REPLACE\n\
                      prose in between\n\
                      <<<<<<< SEARCH\nb\n=======\nB\n>>>>>>> REPLACE\n";

        let ops = &parse(script)[0].operations;
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].original_block, "a");
        assert_eq!(ops[1].original_block, "b");
    }

    #[test]
    fn header_accepts_hash_and_case_variations() {
        for header in [
            "File: a.txt",
            "# File: a.txt",
            "## File: a.txt",
            "### File: a.txt",
            "###File: a.txt",
            "### file: a.txt",
            "### FILE: a.txt",
            "### File:   a.txt  ",
        ] {
            let script = format!("{header}\n<<<<<<< SEARCH\nx\n=======\ny\n>>>>>>> REPLACE\n");
            let patches = parse(&script);
            assert_eq!(patches.len(), 1, "header variant: {header:?}");
            assert_eq!(patches[0].file_path, "a.txt", "header variant: {header:?}");
        }
    }

    #[test]
    fn four_hashes_is_not_a_header() {
        let script = "#### File: a.txt\n<<<<<<< SEARCH\nx\n=======\ny\n>>>>>>> REPLACE\n";

        let patches = parse(script);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].file_path, UNKNOWN_FILE_PATH);
    }

    #[test]
    fn header_with_empty_path_is_prose() {
        let script = "### File:\n<<<<<<< SEARCH\nx\n=======\ny\n>>>>>>> REPLACE\n";

        let patches = parse(script);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].file_path, UNKNOWN_FILE_PATH);
    }

    #[test]
    fn repeated_header_appends_to_first_entry() {
        let script = "### File: a.txt\n\
                      <<<<<<< SEARCH\nfirst\n=======\nFIRST\n>>>>>>> REPLACE\n\
                      ### File: b.txt\n\
                      <<<<<<< SEARCH\nsecond\n=======\nSECOND\n>>>>>>> REPLACE\n\
                      ### File: a.txt\n\
                      <<<<<<< SEARCH\nthird\n=======\nTHIRD\n>>>>>>> REPLACE\n";

        let patches = parse(script);
        assert_eq!(patches.len(), 2);
        assert_eq!(patches[0].file_path, "a.txt");
        assert_eq!(patches[0].operations.len(), 2);
        assert_eq!(patches[0].operations[0].original_block, "first");
        assert_eq!(patches[0].operations[1].original_block, "third");
        assert_eq!(patches[1].file_path, "b.txt");
        assert_eq!(patches[1].operations.len(), 1);
    }

    #[test]
    fn headerless_script_uses_fallback_path() {
        let script = "<<<<<<< SEARCH\nfoo\n=======\nbar\n>>>>>>> REPLACE\n";

        let patches = parse(script);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].file_path, UNKNOWN_FILE_PATH);
    }

    #[test]
    fn headerless_script_without_hunks_is_empty() {
        assert!(parse("just some prose\nwith no hunks at all\n").is_empty());
        assert!(parse("").is_empty());
    }

    #[test]
    fn segment_without_hunks_contributes_no_entry() {
        let script = "### File: a.txt\nnothing here\n\
                      ### File: b.txt\n\
                      <<<<<<< SEARCH\nx\n=======\ny\n>>>>>>> REPLACE\n";

        let patches = parse(script);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].file_path, "b.txt");
    }

    #[test]
    fn empty_segment_does_not_block_later_same_path_segment() {
        let script = "### File: a.txt\nno hunks yet\n\
                      ### File: a.txt\n\
                      <<<<<<< SEARCH\nx\n=======\ny\n>>>>>>> REPLACE\n";

        let patches = parse(script);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].file_path, "a.txt");
        assert_eq!(patches[0].operations.len(), 1);
    }

    #[test]
    fn text_before_first_header_is_ignored() {
        let script = "<<<<<<< SEARCH\npreamble\n=======\nX\n>>>>>>> REPLACE\n\
                      ### File: a.txt\n\
                      <<<<<<< SEARCH\nkept\n=======\nY\n>>>>>>> REPLACE\n";

        let patches = parse(script);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].file_path, "a.txt");
        assert_eq!(patches[0].operations.len(), 1);
        assert_eq!(patches[0].operations[0].original_block, "kept");
    }

    #[test]
    fn crlf_terminators_around_fences_are_structural() {
        let script = "### File: a.txt\r\n\
                      <<<<<<< SEARCH\r\nfoo\r\nbar\r\n=======\r\nbaz\r\n>>>>>>> REPLACE\r\n";

        let op = &parse(script)[0].operations[0];
        // Interior CRLF survives; the terminators touching the fences do not.
        assert_eq!(op.original_block, "foo\r\nbar");
        assert_eq!(op.modified_block, "baz");
    }

    #[test]
    fn classify_fence_rejects_mixed_and_short_runs() {
        assert_eq!(classify_fence("<<<<<<< SEARCH"), Some(FenceKind::SearchOpen));
        assert_eq!(classify_fence("======="), Some(FenceKind::Divider));
        assert_eq!(classify_fence(">>>>>>> REPLACE  "), Some(FenceKind::ReplaceClose));
        assert_eq!(classify_fence("======= trailing"), None);
        assert_eq!(classify_fence("<<<< SEARCH"), None);
        assert_eq!(classify_fence("<<<<<<<"), None);
        assert_eq!(classify_fence(""), None);
        assert_eq!(classify_fence("plain text"), None);
    }

    #[test]
    fn parse_is_deterministic() {
        let script = "### File: a.txt\n\
                      <<<<<<< SEARCH\nfoo\n=======\nbar\n>>>>>>> REPLACE\n\
                      garbage <<<<<<< not a fence\n\
                      ### File: b.txt\n\
                      <<<<<<< SEARCH\nunfinished\n=======\n";

        assert_eq!(parse(script), parse(script));
    }

    prop_compose! {
        /// Payload text that cannot collide with fence or header lines.
        fn payload_text()(lines in prop::collection::vec("[a-z0-9 _.;(){}]{0,30}", 1..4)) -> String {
            lines.join("\n")
        }
    }

    proptest! {
        #[test]
        fn round_trips_arbitrary_payloads(
            path in "[a-z]{1,8}(/[a-z]{1,8}){0,2}\\.[a-z]{1,3}",
            search in payload_text(),
            replace in payload_text(),
        ) {
            let script = format!(
                "### File: {path}\n<<<<<<< SEARCH\n{search}\n=======\n{replace}\n>>>>>>> REPLACE\n"
            );

            let patches = parse(&script);
            prop_assert_eq!(patches.len(), 1);
            prop_assert_eq!(&patches[0].file_path, &path);
            prop_assert_eq!(patches[0].operations.len(), 1);
            prop_assert_eq!(&patches[0].operations[0].original_block, &search);
            prop_assert_eq!(&patches[0].operations[0].modified_block, &replace);
        }

        #[test]
        fn parse_never_panics_and_is_idempotent(
            // Printable ASCII lines, so fence and header characters appear often.
            lines in prop::collection::vec("[ -~]{0,20}", 0..12),
        ) {
            let raw = lines.join("\n");
            let first = parse(&raw);
            let second = parse(&raw);
            prop_assert_eq!(first, second);
        }
    }
}
