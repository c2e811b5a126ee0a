//! Error types for bundle extraction.

use std::io;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::archive::ArchiveError;
use crate::resolver::{ArtifactCoordinate, ResolveError};

/// Errors that can occur while supplying a distribution from the bundle.
#[derive(Debug, Error)]
pub enum BundleError {
    /// The destination temp file could not be created.
    #[error("failed to create temp file: {source}")]
    TempFile {
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The temp file was created at a path that is not valid UTF-8.
    #[error("temp file path {} is not valid UTF-8", path.display())]
    NonUtf8TempPath {
        /// Path of the created temp file.
        path: PathBuf,
    },

    /// Searching the local repository failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The bundle artifact is not present in any local repository.
    #[error("required artifact {coordinate} not found in the local repository")]
    ArtifactNotFound {
        /// Coordinate that was looked up.
        coordinate: ArtifactCoordinate,
    },

    /// Reading the bundle or writing the destination failed.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// The bundle does not contain the requested distribution.
    #[error("entry {entry} not found in {archive}")]
    EntryNotFound {
        /// Entry name that was looked up.
        entry: String,
        /// Bundle that was scanned.
        archive: Utf8PathBuf,
    },
}

/// Convenience alias for bundle results.
pub type Result<T> = std::result::Result<T, BundleError>;
