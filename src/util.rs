#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::{MatchOptions, glob_with};

/// How many directory levels below an input directory are searched.
pub const SEARCH_DEPTH: usize = 4;

/// Documents under `root` whose extension is `extension` (no leading dot),
/// at most `depth` directories deep. Extensions match case-insensitively.
pub fn find_documents(root: &Path, extension: &str, depth: usize) -> Result<Vec<PathBuf>> {
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    let mut found = Vec::new();
    for level in 0..=depth {
        let mut pattern = root.to_path_buf();
        for _ in 0..level {
            pattern.push("*");
        }
        pattern.push(format!("*.{extension}"));
        let pattern = pattern
            .to_str()
            .with_context(|| format!("Search root {} is not valid UTF-8", root.display()))?
            .to_string();
        let entries = glob_with(&pattern, options)
            .with_context(|| format!("Could not build search pattern {pattern}"))?;
        found.extend(
            entries
                .filter_map(Result::ok)
                .filter(|p| p.is_file() && !is_lock_file(p)),
        );
    }
    Ok(found)
}

/// Expands the paths given on the command line: files are kept as they are,
/// directories are searched for documents with any of `extensions`. Office
/// lock files (`~$name.docx`) are skipped.
pub fn expand_inputs(inputs: &[PathBuf], extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for ext in extensions {
                out.extend(find_documents(input, ext, SEARCH_DEPTH)?);
            }
        } else {
            out.push(input.clone());
        }
    }
    out.sort();
    out.dedup();
    Ok(out)
}

/// Whether a path is an Office owner/lock file.
fn is_lock_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("~$"))
}
