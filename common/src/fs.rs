//! Filesystem predicates and listing helpers.
//!
//! The predicates answer "can this be read right now?" and never fail: any
//! I/O error while checking is reported as `false`. Listing and metadata
//! lookups are real reads and surface their errors with the offending path.

use std::fs::{self, File};
use std::io;
use std::time::SystemTime;

use camino::{Utf8Path, Utf8PathBuf};
use log::trace;
use thiserror::Error;

/// Errors raised while reading directory contents or file metadata.
#[derive(Debug, Error)]
pub enum FsError {
    /// A directory could not be listed.
    #[error("failed to list files in {path}")]
    List {
        /// The directory that was being listed.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The last modification time of a path could not be read.
    #[error("failed to read last modified time of {path}")]
    Metadata {
        /// The path whose metadata was requested.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// A predicate applied to each candidate path by [`list_dir`].
pub type PathFilter<'a> = &'a dyn Fn(&Utf8Path) -> bool;

/// Returns `true` when `path` is an existing regular file that can be opened
/// for reading.
///
/// # Examples
///
/// ```
/// use bundle_common::fs::is_readable_file;
/// use camino::Utf8Path;
///
/// assert!(!is_readable_file(Utf8Path::new("/definitely/not/here.jar")));
/// ```
#[must_use]
pub fn is_readable_file(path: &Utf8Path) -> bool {
    fs::metadata(path).is_ok_and(|meta| meta.is_file()) && File::open(path).is_ok()
}

/// Returns `true` when `path` is an existing directory whose entries can be
/// listed.
#[must_use]
pub fn is_readable_dir(path: &Utf8Path) -> bool {
    fs::metadata(path).is_ok_and(|meta| meta.is_dir()) && fs::read_dir(path).is_ok()
}

/// Lists the immediate children of `root` that satisfy every filter.
///
/// Entries whose names are not valid UTF-8 are skipped. The result is sorted
/// by path so callers see a stable order regardless of how the platform
/// enumerates the directory.
///
/// # Errors
///
/// Returns [`FsError::List`] when `root` cannot be read as a directory.
pub fn list_dir(root: &Utf8Path, filters: &[PathFilter<'_>]) -> Result<Vec<Utf8PathBuf>, FsError> {
    let list_error = |source| FsError::List {
        path: root.to_owned(),
        source,
    };

    let mut matched = Vec::new();
    for entry in fs::read_dir(root).map_err(list_error)? {
        let entry = entry.map_err(list_error)?;
        let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) else {
            trace!("list_dir: skipping non-UTF-8 entry in {root}");
            continue;
        };
        if filters.iter().all(|filter| filter(&path)) {
            matched.push(path);
        }
    }

    matched.sort();
    Ok(matched)
}

/// Returns the last modification time of `path`.
///
/// # Errors
///
/// Returns [`FsError::Metadata`] when the metadata cannot be read or the
/// platform does not record modification times.
pub fn last_modified(path: &Utf8Path) -> Result<SystemTime, FsError> {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|source| FsError::Metadata {
            path: path.to_owned(),
            source,
        })
}

/// Returns the final component of `path`, or an empty string when there is
/// none.
#[must_use]
pub fn file_name_of(path: &Utf8Path) -> &str {
    path.file_name().unwrap_or_default()
}

#[cfg(test)]
#[path = "fs_tests.rs"]
mod tests;
