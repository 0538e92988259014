//! Apply a fenced edit script to a file and print the result.
//!
//! The modified text goes to stdout; per-operation errors go to stderr.
//! Match diagnostics are available through `RUST_LOG=weft_patch=debug`.
//!
//! ```sh
//! cargo run --example apply -- edits.txt src/main.rs
//! ```

use std::fs;

use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;
use weft_patch::{PatchApplier, PatchParser};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(script_path), Some(target_path)) = (args.next(), args.next()) else {
        bail!("usage: apply <edit-script> <target-file>");
    };

    let script = fs::read_to_string(&script_path)
        .with_context(|| format!("reading edit script {script_path}"))?;
    let target = fs::read_to_string(&target_path)
        .with_context(|| format!("reading target file {target_path}"))?;

    let patches = PatchParser::new().parse(&script);
    let Some(patch) = patches.first() else {
        bail!("no patches found in {script_path}");
    };

    let result = PatchApplier::new().apply(&target, &patch.operations);
    for error in &result.errors {
        eprintln!("{}: {}", patch.file_path, error);
    }
    print!("{}", result.modified);

    if !result.success() {
        std::process::exit(1);
    }
    Ok(())
}
