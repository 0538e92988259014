//! Search/replace patch extraction and fuzzy application.
//!
//! Parses loosely structured, AI-generated edit scripts into per-file
//! search/replace operations and applies them to file text through a tiered
//! matching strategy that degrades gracefully: exact substring first, then
//! CRLF-normalized, then a whitespace-insensitive token anchor. Malformed
//! input never fails a whole script and a failed operation never corrupts
//! the regions around it.
//!
//! # Architecture
//!
//! Pure text transformation: no filesystem access, no I/O, no state between
//! calls. Callers own reading and writing files, and may apply different
//! files in parallel since every `apply` call is independent.
//!
//! # Usage
//!
//! ```
//! use weft_patch::{PatchApplier, PatchParser};
//!
//! let script = "### File: a.txt\n\
//!               <<<<<<< SEARCH\n\
//!               foo\n\
//!               =======\n\
//!               bar\n\
//!               >>>>>>> REPLACE\n";
//!
//! let patches = PatchParser::new().parse(script);
//! assert_eq!(patches[0].file_path, "a.txt");
//!
//! let result = PatchApplier::new().apply("foo baz", &patches[0].operations);
//! assert!(result.success());
//! assert_eq!(result.modified, "bar baz");
//! ```

mod applier;
mod error;
mod parser;
mod types;
mod yaml;

pub use applier::{ApplyOptions, PatchApplier};
pub use error::{MatchError, ParseError, Result};
pub use parser::PatchParser;
pub use types::{ApplyResult, FilePatch, PatchOperation, UNKNOWN_FILE_PATH};
pub use yaml::{parse_yaml_patch, try_parse_yaml_patch};
