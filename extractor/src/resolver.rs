//! Artifact lookup inside the local repository.
//!
//! Artifacts live at
//! `<root>/<group segments>/<artifact>/<version dir>/<artifact>-<version><suffix>`.
//! A release version names its directory and file exactly. A snapshot
//! version matches any directory starting with `<version>-` and any file in
//! it starting with `<artifact>-<version>-` and ending with `<suffix>`, so
//! both `-SNAPSHOT` and timestamped builds are found. When several files
//! qualify, the most recently modified one wins.

use std::fmt;
use std::time::SystemTime;

use bundle_common::fs::{
    FsError, file_name_of, is_readable_dir, is_readable_file, last_modified, list_dir,
};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, trace};
use thiserror::Error;

use crate::repository::{LocateError, RepositoryLocator};

/// Errors raised while searching the repository.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The repository roots could not be determined.
    #[error("repository lookup failed: {0}")]
    Locate(#[from] LocateError),

    /// A candidate directory or file could not be inspected.
    #[error("repository scan failed: {0}")]
    Fs(#[from] FsError),
}

/// Identifies one artifact file in a Maven-layout repository.
///
/// # Examples
///
/// ```
/// use bundle_extractor::resolver::ArtifactCoordinate;
///
/// let coordinate = ArtifactCoordinate::new("com.github.valery1707", "mongo-bundle", "3.6.5", ".jar");
/// assert_eq!(coordinate.relative_dir(), "com/github/valery1707/mongo-bundle");
/// assert_eq!(coordinate.release_file_name(), "mongo-bundle-3.6.5.jar");
/// assert_eq!(coordinate.to_string(), "com.github.valery1707:mongo-bundle:3.6.5");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCoordinate {
    group: String,
    artifact: String,
    version: String,
    suffix: String,
    snapshot: bool,
}

impl ArtifactCoordinate {
    /// Creates a release (non-snapshot) coordinate.
    ///
    /// `suffix` is appended verbatim to the file name, so it carries any
    /// classifier and the extension, for example `.jar` or `-sources.jar`.
    #[must_use]
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
            suffix: suffix.into(),
            snapshot: false,
        }
    }

    /// Marks the coordinate as a snapshot (or release) version.
    #[must_use]
    pub const fn with_snapshot(mut self, snapshot: bool) -> Self {
        self.snapshot = snapshot;
        self
    }

    /// Dotted group identifier.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Artifact name.
    #[must_use]
    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    /// Version, without any snapshot qualifier.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// File name suffix.
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Whether snapshot matching applies.
    #[must_use]
    pub const fn is_snapshot(&self) -> bool {
        self.snapshot
    }

    /// Directory of the artifact relative to a repository root.
    #[must_use]
    pub fn relative_dir(&self) -> Utf8PathBuf {
        let mut dir: Utf8PathBuf = self
            .group
            .split('.')
            .filter(|segment| !segment.is_empty())
            .collect();
        dir.push(&self.artifact);
        dir
    }

    /// File name of the release artifact.
    #[must_use]
    pub fn release_file_name(&self) -> String {
        format!("{}-{}{}", self.artifact, self.version, self.suffix)
    }

    fn snapshot_dir_prefix(&self) -> String {
        format!("{}-", self.version)
    }

    fn snapshot_file_prefix(&self) -> String {
        format!("{}-{}-", self.artifact, self.version)
    }
}

impl fmt::Display for ArtifactCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)?;
        if self.snapshot {
            f.write_str(" (snapshot)")?;
        }
        Ok(())
    }
}

/// Finds artifacts under the roots reported by a [`RepositoryLocator`].
#[derive(Debug, Clone, Copy)]
pub struct ArtifactResolver<'a> {
    locator: &'a RepositoryLocator,
}

impl<'a> ArtifactResolver<'a> {
    /// Creates a resolver over `locator`'s repository roots.
    #[must_use]
    pub const fn new(locator: &'a RepositoryLocator) -> Self {
        Self { locator }
    }

    /// Returns the newest readable file matching `coordinate`, or `None` when
    /// no repository root holds one.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Locate`] when the repository roots cannot be
    /// determined and [`ResolveError::Fs`] when a candidate cannot be
    /// inspected.
    pub fn find_library(
        &self,
        coordinate: &ArtifactCoordinate,
    ) -> Result<Option<Utf8PathBuf>, ResolveError> {
        let roots = self.locator.repository_roots()?;
        let found = find_in_roots(&roots, coordinate)?;
        found.as_ref().map_or_else(
            || debug!("{coordinate} not found in {} repository root(s)", roots.len()),
            |path| debug!("resolved {coordinate} to {path}"),
        );
        Ok(found)
    }
}

/// Searches `roots` in order for files matching `coordinate` and returns the
/// most recently modified one.
///
/// Candidates are visited root by root, and in path order within each
/// directory; among equally recent files the first visited wins.
///
/// # Errors
///
/// Returns [`FsError`] when an existing, readable directory cannot be listed
/// or a candidate's modification time cannot be read.
pub fn find_in_roots(
    roots: &[Utf8PathBuf],
    coordinate: &ArtifactCoordinate,
) -> Result<Option<Utf8PathBuf>, FsError> {
    let mut candidates = Vec::new();
    for root in roots {
        let artifact_dir = root.join(coordinate.relative_dir());
        for version_dir in version_dirs(&artifact_dir, coordinate)? {
            candidates.extend(version_files(&version_dir, coordinate)?);
        }
    }
    newest(candidates)
}

fn version_dirs(
    artifact_dir: &Utf8Path,
    coordinate: &ArtifactCoordinate,
) -> Result<Vec<Utf8PathBuf>, FsError> {
    let dirs = if coordinate.is_snapshot() {
        if !is_readable_dir(artifact_dir) {
            trace!("no artifact directory at {artifact_dir}");
            return Ok(Vec::new());
        }
        let prefix = coordinate.snapshot_dir_prefix();
        list_dir(artifact_dir, &[&|path: &Utf8Path| {
            file_name_of(path).starts_with(prefix.as_str())
        }])?
    } else {
        vec![artifact_dir.join(coordinate.version())]
    };
    Ok(dirs.into_iter().filter(|dir| is_readable_dir(dir)).collect())
}

fn version_files(
    version_dir: &Utf8Path,
    coordinate: &ArtifactCoordinate,
) -> Result<Vec<Utf8PathBuf>, FsError> {
    let files = if coordinate.is_snapshot() {
        let prefix = coordinate.snapshot_file_prefix();
        list_dir(
            version_dir,
            &[
                &|path: &Utf8Path| file_name_of(path).starts_with(prefix.as_str()),
                &|path: &Utf8Path| file_name_of(path).ends_with(coordinate.suffix()),
            ],
        )?
    } else {
        vec![version_dir.join(coordinate.release_file_name())]
    };
    Ok(files
        .into_iter()
        .filter(|file| {
            let readable = is_readable_file(file);
            if !readable {
                trace!("{file} is not a readable file");
            }
            readable
        })
        .collect())
}

/// Picks the most recently modified path, keeping the earliest on ties.
fn newest(candidates: Vec<Utf8PathBuf>) -> Result<Option<Utf8PathBuf>, FsError> {
    let mut best: Option<(SystemTime, Utf8PathBuf)> = None;
    for candidate in candidates {
        let modified = last_modified(&candidate)?;
        let is_newer = best.as_ref().is_none_or(|(time, _)| modified > *time);
        if is_newer {
            best = Some((modified, candidate));
        }
    }
    Ok(best.map(|(_, path)| path))
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
