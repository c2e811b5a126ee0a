//! Supplies distribution archives from a bundle jar in the local repository.
//!
//! The download framework asks a [`Downloader`] for a distribution archive.
//! [`BundleExtractor`] answers without touching the network: it resolves the
//! bundle jar matching the distribution's version, then copies the one
//! entry holding the requested platform archive into a fresh temp file.

use std::fmt;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;

use crate::archive::{ArchiveExtractor, Extraction, ZipExtractor};
use crate::error::{BundleError, Result};
use crate::naming::{Distribution, EntryName};
use crate::repository::RepositoryLocator;
use crate::resolver::{ArtifactCoordinate, ArtifactResolver};

/// Download settings supplied by the host framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadConfig {
    /// Prefix for the names of downloaded files.
    pub download_prefix: String,
    /// Directory receiving downloaded files; the system temp directory when
    /// `None`.
    pub temp_dir: Option<Utf8PathBuf>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_prefix: "embedmongo-download-".to_owned(),
            temp_dir: None,
        }
    }
}

/// Supplies distribution archives to a download framework.
pub trait Downloader {
    /// Remote location the archive would be fetched from, if any.
    fn download_url(&self, config: &DownloadConfig, distribution: &Distribution) -> Option<String>;

    /// Produces a local file holding the archive for `distribution`.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError`] when the archive cannot be produced.
    fn download(&self, config: &DownloadConfig, distribution: &Distribution)
    -> Result<Utf8PathBuf>;
}

/// Where the bundle lives and how its entries are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSource {
    /// Group of the bundle artifact.
    pub group: String,
    /// Name of the bundle artifact.
    pub artifact: String,
    /// File suffix of the bundle artifact.
    pub suffix: String,
    /// Directory inside the bundle that holds the platform archives.
    pub namespace: String,
}

impl Default for BundleSource {
    fn default() -> Self {
        Self {
            group: "com.github.valery1707".to_owned(),
            artifact: "mongo-bundle".to_owned(),
            suffix: ".jar".to_owned(),
            namespace: "mongo".to_owned(),
        }
    }
}

impl BundleSource {
    /// Coordinate of the bundle carrying `distribution`.
    #[must_use]
    pub fn coordinate(&self, distribution: &Distribution, snapshot: bool) -> ArtifactCoordinate {
        ArtifactCoordinate::new(
            &*self.group,
            &*self.artifact,
            distribution.artifact_version(),
            &*self.suffix,
        )
        .with_snapshot(snapshot)
    }

    /// Name of the entry holding `distribution`'s archive.
    #[must_use]
    pub fn entry_name(&self, distribution: &Distribution) -> EntryName {
        EntryName::new(&self.namespace, distribution)
    }
}

/// What to do when the bundle lacks the requested entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingEntryPolicy {
    /// Delete the destination and report [`BundleError::EntryNotFound`].
    #[default]
    Fail,
    /// Return the destination as an empty file.
    KeepEmpty,
}

/// A [`Downloader`] backed by a bundle jar in the local Maven repository.
///
/// # Examples
///
/// ```no_run
/// use bundle_extractor::bundle::{BundleExtractor, DownloadConfig, Downloader};
/// use bundle_extractor::naming::{BitSize, Distribution, Platform};
///
/// let extractor = BundleExtractor::new();
/// let distribution = Distribution::new(Platform::Linux, "V3_6_5", BitSize::B64, "tgz");
/// let archive = extractor.download(&DownloadConfig::default(), &distribution)?;
/// println!("distribution extracted to {archive}");
/// # Ok::<(), bundle_extractor::error::BundleError>(())
/// ```
pub struct BundleExtractor {
    snapshot: bool,
    missing_entry: MissingEntryPolicy,
    source: BundleSource,
    locator: RepositoryLocator,
    extractor: Box<dyn ArchiveExtractor + Send + Sync>,
}

impl BundleExtractor {
    /// Creates an extractor over the system's local repository that accepts
    /// snapshot bundles and fails on missing entries.
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: true,
            missing_entry: MissingEntryPolicy::default(),
            source: BundleSource::default(),
            locator: RepositoryLocator::system(),
            extractor: Box::new(ZipExtractor),
        }
    }

    /// Chooses between snapshot and release bundle lookup.
    #[must_use]
    pub fn with_snapshot(mut self, snapshot: bool) -> Self {
        self.snapshot = snapshot;
        self
    }

    /// Sets the handling of bundles that lack the requested entry.
    #[must_use]
    pub fn with_missing_entry_policy(mut self, policy: MissingEntryPolicy) -> Self {
        self.missing_entry = policy;
        self
    }

    /// Replaces the bundle coordinates and entry namespace.
    #[must_use]
    pub fn with_source(mut self, source: BundleSource) -> Self {
        self.source = source;
        self
    }

    /// Replaces the repository locator.
    #[must_use]
    pub fn with_locator(mut self, locator: RepositoryLocator) -> Self {
        self.locator = locator;
        self
    }

    /// Replaces the archive reader.
    #[must_use]
    pub fn with_archive_extractor(
        mut self,
        extractor: impl ArchiveExtractor + Send + Sync + 'static,
    ) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    /// The repository locator in use.
    #[must_use]
    pub const fn locator(&self) -> &RepositoryLocator {
        &self.locator
    }

    /// Mutable access to the locator, for example to reset its cache.
    pub fn locator_mut(&mut self) -> &mut RepositoryLocator {
        &mut self.locator
    }

    fn resolve_bundle(&self, distribution: &Distribution) -> Result<Utf8PathBuf> {
        let coordinate = self.source.coordinate(distribution, self.snapshot);
        let resolver = ArtifactResolver::new(&self.locator);
        let Some(bundle) = resolver.find_library(&coordinate)? else {
            return Err(BundleError::ArtifactNotFound { coordinate });
        };
        Ok(bundle)
    }
}

impl Default for BundleExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BundleExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleExtractor")
            .field("snapshot", &self.snapshot)
            .field("missing_entry", &self.missing_entry)
            .field("source", &self.source)
            .field("locator", &self.locator)
            .finish_non_exhaustive()
    }
}

impl Downloader for BundleExtractor {
    fn download_url(&self, _config: &DownloadConfig, _distribution: &Distribution) -> Option<String> {
        None
    }

    fn download(
        &self,
        config: &DownloadConfig,
        distribution: &Distribution,
    ) -> Result<Utf8PathBuf> {
        let bundle = self.resolve_bundle(distribution)?;
        let entry = self.source.entry_name(distribution);
        let destination = create_destination(config, distribution)?;

        let outcome = self
            .extractor
            .extract_named_entry(&bundle, entry.as_str(), &destination)
            .inspect_err(|_| discard(&destination))?;

        match outcome {
            Extraction::Extracted { bytes, .. } => {
                debug!("supplied {entry} ({bytes} bytes) from {bundle} as {destination}");
                Ok(destination)
            }
            Extraction::NotFound => match self.missing_entry {
                MissingEntryPolicy::Fail => {
                    discard(&destination);
                    Err(BundleError::EntryNotFound {
                        entry: entry.to_string(),
                        archive: bundle,
                    })
                }
                MissingEntryPolicy::KeepEmpty => {
                    debug!("{entry} not found in {bundle}; returning empty {destination}");
                    Ok(destination)
                }
            },
        }
    }
}

/// Creates an empty, persisted file named
/// `<download prefix><random><.archive type>`.
fn create_destination(config: &DownloadConfig, distribution: &Distribution) -> Result<Utf8PathBuf> {
    let suffix = format!(".{}", distribution.archive_type());
    let mut builder = tempfile::Builder::new();
    builder.prefix(&config.download_prefix).suffix(&suffix);
    let file = config
        .temp_dir
        .as_ref()
        .map_or_else(|| builder.tempfile(), |dir| builder.tempfile_in(dir))
        .map_err(|source| BundleError::TempFile { source })?;

    let (_, path) = file
        .keep()
        .map_err(|err| BundleError::TempFile { source: err.error })?;
    Utf8PathBuf::from_path_buf(path).map_err(|path| {
        if let Err(err) = fs::remove_file(&path) {
            debug!("failed to remove {}: {err}", path.display());
        }
        BundleError::NonUtf8TempPath { path }
    })
}

fn discard(path: &Utf8Path) {
    if let Err(err) = fs::remove_file(path) {
        debug!("failed to remove {path}: {err}");
    }
}

#[cfg(test)]
#[path = "bundle_tests.rs"]
mod tests;
