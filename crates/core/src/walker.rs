//! Local filesystem enumeration
//!
//! Lists the files under a root directory, optionally recursively, skipping
//! any path that contains one of the configured ignore substrings.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Result;

/// Collect the files under `root`.
///
/// Paths are returned as `root` joined with the relative path, in file-name
/// order within each directory. Directory symlinks are not followed. A file
/// is dropped when its full path contains any of `ignore` as a plain substring.
///
/// Only a failure to read `root` itself is an error. Entries below it that
/// cannot be read are logged and skipped.
pub fn get_filelist(root: &Path, recursive: bool, ignore: &[String]) -> Result<Vec<PathBuf>> {
    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(std::io::Error::from(e).into()),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let file_type = entry.file_type();
        let is_file = file_type.is_file() || (file_type.is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }

        let full = entry.path().to_string_lossy();
        if let Some(pattern) = ignore.iter().find(|p| full.contains(p.as_str())) {
            tracing::debug!(path = %full, pattern = %pattern, "ignoring file");
            continue;
        }

        files.push(entry.into_path());
    }

    Ok(files)
}
