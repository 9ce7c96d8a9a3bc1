//! Project file enumeration.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use razloc_std::error::prelude::*;
use razloc_std::path::{file_name_eq, unix_slash};
use razloc_std::Error;

/// Build output folders that never hold sources.
const SKIPPED_DIRS: &[&str] = &["bin", "obj", "node_modules"];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Selects files by include globs and excluded file names.
///
/// A pattern without a `/` is matched against the file name, otherwise
/// against the path relative to the walked root.
#[derive(Debug, Clone)]
pub struct FileSelection {
    include: Vec<Pattern>,
    exclude: Vec<String>,
}

impl FileSelection {
    /// Compiles the include patterns.
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        let include = include
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|err| {
                    Error::config(
                        "file selection",
                        format!("invalid include pattern {pattern:?}: {err}"),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            include,
            exclude: exclude.to_vec(),
        })
    }

    /// Whether `path`, relative to the walked root, is selected.
    pub fn matches(&self, rel: &Path) -> bool {
        if self.exclude.iter().any(|name| file_name_eq(rel, name)) {
            return false;
        }
        let rel_str = unix_slash(rel);
        let file_name = rel
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        self.include.iter().any(|pattern| {
            let candidate = if pattern.as_str().contains('/') {
                rel_str.as_str()
            } else {
                file_name.as_ref()
            };
            pattern.matches_with(candidate, MATCH_OPTIONS)
        })
    }

    /// All selected files under `root`, sorted by path. Hidden folders
    /// (including the backup folder) and build output are skipped.
    pub fn collect(&self, root: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .strip_prefix(root)
                    .is_ok_and(|rel| self.matches(rel))
            })
            .map(|e| e.into_path())
            .collect();
        files.sort();
        files
    }
}

fn is_skipped_dir(entry: &walkdir::DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.iter().any(|dir| name.eq_ignore_ascii_case(dir))
}
