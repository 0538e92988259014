//! Patch application: the tiered match engine and the per-file fold.
//!
//! Each operation is matched against the working buffer through three tiers,
//! tried strictly in order:
//!
//! 1. **Exact**: verbatim substring, leftmost occurrence.
//! 2. **Newline-normalized**: CRLF collapsed to LF in buffer and search
//!    block, then substring again. A hit converts the whole buffer to LF for
//!    every later operation in the file; that stickiness is part of the
//!    contract.
//! 3. **Fuzzy token-anchor**: whitespace is discarded from both texts and
//!    the search block's character stream is anchored inside the buffer's,
//!    then mapped back to a real byte range and spliced.
//!
//! Failed operations never mutate the buffer and never stop later
//! operations; they surface as error strings on the [`ApplyResult`].

use tracing::{debug, warn};

use crate::error::MatchError;
use crate::types::{ApplyResult, PatchOperation};

/// Maximum characters of a search block quoted in error messages.
const PREVIEW_MAX_CHARS: usize = 50;

/// Options controlling match behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    /// Fail an operation whose fuzzy match is ambiguous (more than one
    /// candidate location in the buffer) instead of taking the leftmost.
    /// Off by default.
    pub strict_fuzzy: bool,
}

/// Applies a file's operations to its text, one buffer fold at a time.
///
/// Holds no state between calls; every `apply` invocation is independent and
/// performs no I/O.
pub struct PatchApplier {
    options: ApplyOptions,
}

impl PatchApplier {
    pub fn new() -> Self {
        Self {
            options: ApplyOptions::default(),
        }
    }

    pub fn with_options(options: ApplyOptions) -> Self {
        Self { options }
    }

    /// Apply operations strictly in order against an evolving buffer.
    ///
    /// Operation `n` always sees the buffer left behind by operation `n-1`,
    /// never an independent copy of the original text. A failed operation
    /// records one error and leaves the buffer untouched.
    pub fn apply(&self, original: &str, operations: &[PatchOperation]) -> ApplyResult {
        let mut buffer = original.to_string();
        let mut errors = Vec::new();

        for (index, operation) in operations.iter().enumerate() {
            match self.apply_operation(index, &buffer, operation) {
                Ok(next) => buffer = next,
                Err(err) => {
                    warn!("Operation {} failed: {}", index + 1, err);
                    errors.push(format!("operation {}: {}", index + 1, err));
                }
            }
        }

        ApplyResult {
            modified: buffer,
            errors,
        }
    }

    /// Run one operation through the match tiers; the first tier to match
    /// wins.
    fn apply_operation(
        &self,
        index: usize,
        buffer: &str,
        operation: &PatchOperation,
    ) -> Result<String, MatchError> {
        if let Some(next) = try_exact(buffer, operation) {
            debug!("Operation {} applied via exact match", index + 1);
            return Ok(next);
        }
        if let Some(next) = try_normalized(buffer, operation) {
            debug!("Operation {} applied via newline-normalized match", index + 1);
            return Ok(next);
        }
        let next = try_fuzzy(buffer, operation, self.options.strict_fuzzy)?;
        debug!("Operation {} applied via fuzzy match", index + 1);
        Ok(next)
    }
}

impl Default for PatchApplier {
    fn default() -> Self {
        Self::new()
    }
}

/// Tier 1: verbatim substring replacement, leftmost occurrence.
fn try_exact(buffer: &str, operation: &PatchOperation) -> Option<String> {
    buffer.find(&operation.original_block).map(|at| {
        splice(
            buffer,
            at,
            at + operation.original_block.len(),
            &operation.modified_block,
        )
    })
}

/// Tier 2: substring replacement after collapsing CRLF to LF in both the
/// buffer and the search block.
///
/// On success the returned buffer is the normalized one, so later operations
/// in the same file see LF line endings from this point on.
fn try_normalized(buffer: &str, operation: &PatchOperation) -> Option<String> {
    // Without a carriage return anywhere, normalization cannot change the
    // tier 1 outcome.
    if !buffer.contains('\r') && !operation.original_block.contains('\r') {
        return None;
    }

    let normalized_buffer = buffer.replace("\r\n", "\n");
    let normalized_search = operation.original_block.replace("\r\n", "\n");
    normalized_buffer.find(&normalized_search).map(|at| {
        splice(
            &normalized_buffer,
            at,
            at + normalized_search.len(),
            &operation.modified_block,
        )
    })
}

/// Tier 3: whitespace-insensitive anchor matching.
///
/// Both texts are reduced to their non-whitespace character streams. The
/// search stream is located as a contiguous substring of the buffer stream
/// (leftmost occurrence) and mapped back to a byte range of the actual
/// buffer through the position map, then the range is spliced with the
/// replacement block verbatim.
fn try_fuzzy(
    buffer: &str,
    operation: &PatchOperation,
    strict: bool,
) -> Result<String, MatchError> {
    let needle = TokenStream::build(&operation.original_block);
    if needle.compact.is_empty() {
        return Err(MatchError::EmptySearchBlock);
    }

    let haystack = TokenStream::build(buffer);
    let Some(found) = haystack.compact.find(&needle.compact) else {
        return Err(MatchError::NoMatch {
            preview: preview(&operation.original_block),
        });
    };

    if strict {
        let candidates = count_occurrences(&haystack.compact, &needle.compact);
        if candidates > 1 {
            return Err(MatchError::AmbiguousMatch {
                candidates,
                preview: preview(&operation.original_block),
            });
        }
    }

    let start = haystack.offsets[found];
    let last_char_at = haystack.offsets[found + needle.compact.len() - 1];
    let mut end = last_char_at + char_len_at(buffer, last_char_at);

    // Swallow trailing spaces and tabs so no ragged fragment of the matched
    // line survives the splice. Newlines and everything else stay.
    let bytes = buffer.as_bytes();
    while end < bytes.len() && (bytes[end] == b' ' || bytes[end] == b'\t') {
        end += 1;
    }

    Ok(splice(buffer, start, end, &operation.modified_block))
}

/// A text's whitespace-stripped view: the compact character stream plus, for
/// every compact byte, the byte offset of the originating character in the
/// source text.
///
/// Built fresh per match attempt. The buffer mutates between operations, so
/// a cached stream would go stale immediately.
struct TokenStream {
    compact: String,
    offsets: Vec<usize>,
}

impl TokenStream {
    fn build(text: &str) -> Self {
        let mut compact = String::with_capacity(text.len());
        let mut offsets = Vec::with_capacity(text.len());
        for (offset, ch) in text.char_indices() {
            if !ch.is_whitespace() {
                compact.push(ch);
                // One entry per UTF-8 byte keeps every compact byte position
                // addressable.
                for _ in 0..ch.len_utf8() {
                    offsets.push(offset);
                }
            }
        }
        Self { compact, offsets }
    }
}

/// Replace `buffer[start..end]` with `replacement`.
fn splice(buffer: &str, start: usize, end: usize, replacement: &str) -> String {
    let mut out = String::with_capacity(buffer.len() - (end - start) + replacement.len());
    out.push_str(&buffer[..start]);
    out.push_str(replacement);
    out.push_str(&buffer[end..]);
    out
}

/// Count every candidate start of `needle` in `haystack`, overlaps included.
fn count_occurrences(haystack: &str, needle: &str) -> usize {
    let mut count = 0;
    let mut from = 0;
    while let Some(found) = haystack[from..].find(needle) {
        count += 1;
        let at = from + found;
        from = at + char_len_at(haystack, at);
    }
    count
}

fn char_len_at(text: &str, offset: usize) -> usize {
    text[offset..].chars().next().map_or(1, char::len_utf8)
}

/// First characters of a search block for diagnostics, ellipsized when the
/// block is longer than the preview.
fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let mut out: String = chars.by_ref().take(PREVIEW_MAX_CHARS).collect();
    if chars.next().is_some() {
        out.push_str("...");
    }
    out
}
