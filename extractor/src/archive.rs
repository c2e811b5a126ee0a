//! Single-entry extraction from zip archives.
//!
//! Archives are read front to back through their local headers, one entry at
//! a time. Entries whose sizes follow their data in a trailing descriptor
//! (as written by the JDK `jar` tool) cannot be delimited that way; when the
//! first one is met the remaining entries are taken from the central
//! directory instead. Scanning stops at the first entry selected for
//! extraction.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::mem;

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, trace};
use thiserror::Error;
use zip::ZipArchive;
use zip::read::{ZipFile, read_zipfile_from_stream};
use zip::result::ZipError;

/// General purpose flag marking sizes and CRC as deferred to a data
/// descriptor.
const DATA_DESCRIPTOR_FLAG: u16 = 1 << 3;

/// Errors arising from archive extraction.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The archive file could not be opened.
    #[error("failed to open archive {archive}: {source}")]
    Open {
        /// Path of the archive.
        archive: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The archive structure could not be read.
    #[error("failed to read archive {archive}: {source}")]
    Read {
        /// Path of the archive.
        archive: Utf8PathBuf,
        /// The underlying zip error.
        #[source]
        source: ZipError,
    },

    /// The destination file could not be created.
    #[error("failed to create {destination}: {source}")]
    Create {
        /// Path of the destination file.
        destination: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Copying entry content failed part-way; the destination may be partial.
    #[error("failed to copy {entry} to {destination}: {source}")]
    Copy {
        /// Name of the entry being copied.
        entry: String,
        /// Path of the destination file.
        destination: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Outcome of scanning an archive for an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// An entry was selected and written to `destination`.
    Extracted {
        /// Name of the extracted entry.
        entry: String,
        /// File the entry was written to.
        destination: Utf8PathBuf,
        /// Number of bytes written.
        bytes: u64,
    },
    /// No entry was selected; no destination was touched.
    NotFound,
}

impl Extraction {
    /// Returns `true` when an entry was written.
    #[must_use]
    pub const fn is_extracted(&self) -> bool {
        matches!(self, Self::Extracted { .. })
    }
}

/// One archive entry: its name and a reader over its decompressed content.
pub struct Entry<R> {
    name: String,
    reader: R,
}

impl<R> Entry<R> {
    /// The entry's path-like name inside the archive.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<R: Read> Read for Entry<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

/// Lazy, forward-only sequence of archive entries.
///
/// Each call to [`next_entry`](Self::next_entry) reads one local header.
/// Unread content of the previous entry is skipped automatically. Once an
/// entry with a data descriptor is reached, the stream continues from the
/// central directory and skips names it has already yielded. To scan again,
/// open a new stream.
pub struct EntryStream<R> {
    source: Source<R>,
    yielded: HashSet<String>,
}

enum Source<R> {
    Local(R),
    Central { archive: ZipArchive<R>, next: usize },
    Exhausted,
}

impl EntryStream<BufReader<File>> {
    /// Opens the archive at `archive` for sequential reading.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Open`] when the file cannot be opened.
    pub fn open(archive: &Utf8Path) -> Result<Self, ArchiveError> {
        let file = File::open(archive).map_err(|source| ArchiveError::Open {
            archive: archive.to_owned(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read + Seek> EntryStream<R> {
    /// Wraps a reader positioned at the start of a zip archive.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            source: Source::Local(reader),
            yielded: HashSet::new(),
        }
    }

    /// Reads the next entry header.
    ///
    /// Returns `Ok(None)` once every entry has been yielded.
    ///
    /// # Errors
    ///
    /// Returns the zip error when a header or the central directory is
    /// corrupt, or an entry uses a feature the reader cannot handle.
    pub fn next_entry(&mut self) -> Result<Option<Entry<ZipFile<'_>>>, ZipError> {
        if let Source::Local(reader) = &mut self.source
            && sizes_deferred(reader)?
        {
            self.switch_to_central_directory()?;
        }

        match &mut self.source {
            Source::Local(reader) => {
                let Some(file) = read_zipfile_from_stream(reader)? else {
                    return Ok(None);
                };
                self.yielded.insert(file.name().to_owned());
                Ok(Some(Entry {
                    name: file.name().to_owned(),
                    reader: file,
                }))
            }
            Source::Central { archive, next } => {
                while archive
                    .name_for_index(*next)
                    .is_some_and(|name| self.yielded.contains(name))
                {
                    *next += 1;
                }
                if *next >= archive.len() {
                    return Ok(None);
                }
                let file = archive.by_index(*next)?;
                *next += 1;
                Ok(Some(Entry {
                    name: file.name().to_owned(),
                    reader: file,
                }))
            }
            Source::Exhausted => Ok(None),
        }
    }

    fn switch_to_central_directory(&mut self) -> Result<(), ZipError> {
        if let Source::Local(reader) = mem::replace(&mut self.source, Source::Exhausted) {
            trace!(
                "entry sizes follow the data; continuing from the central directory after {} entries",
                self.yielded.len()
            );
            self.source = Source::Central {
                archive: ZipArchive::new(reader)?,
                next: 0,
            };
        }
        Ok(())
    }
}

/// Reports whether the local header at the reader's position defers its
/// sizes to a data descriptor. The reader is left where it was.
fn sizes_deferred<R: Read + Seek>(reader: &mut R) -> io::Result<bool> {
    let start = reader.stream_position()?;
    let mut header = Vec::with_capacity(8);
    reader.by_ref().take(8).read_to_end(&mut header)?;
    reader.seek(SeekFrom::Start(start))?;

    Ok(match header.as_slice() {
        [b'P', b'K', 3, 4, _, _, low, high] => {
            u16::from_le_bytes([*low, *high]) & DATA_DESCRIPTOR_FLAG != 0
        }
        _ => false,
    })
}

/// Scans `archive` and copies the first entry for which `select` returns a
/// destination.
///
/// `select` is called with each entry name in archive order until it
/// returns `Some`. The chosen destination is created (or truncated) and
/// receives the entry's bytes verbatim; later entries are not read. When no
/// entry is selected the result is [`Extraction::NotFound`] and no file is
/// touched.
///
/// # Errors
///
/// Returns [`ArchiveError`] when the archive cannot be read or the
/// destination cannot be written. A failure while copying may leave a
/// partial destination file behind.
pub fn extract_entry<F>(archive: &Utf8Path, mut select: F) -> Result<Extraction, ArchiveError>
where
    F: FnMut(&str) -> Option<Utf8PathBuf>,
{
    let read_error = |source| ArchiveError::Read {
        archive: archive.to_owned(),
        source,
    };

    let mut entries = EntryStream::open(archive)?;
    while let Some(mut entry) = entries.next_entry().map_err(read_error)? {
        let Some(destination) = select(entry.name()) else {
            continue;
        };
        let bytes = copy_entry(&mut entry, &destination)?;
        debug!("extracted {} ({bytes} bytes) from {archive} to {destination}", entry.name());
        return Ok(Extraction::Extracted {
            entry: entry.name,
            destination,
            bytes,
        });
    }

    debug!("no matching entry in {archive}");
    Ok(Extraction::NotFound)
}

/// Copies the entry named exactly `name` from `archive` to `destination`.
///
/// # Errors
///
/// See [`extract_entry`].
pub fn extract_named_entry(
    archive: &Utf8Path,
    name: &str,
    destination: &Utf8Path,
) -> Result<Extraction, ArchiveError> {
    extract_entry(archive, |entry| {
        (entry == name).then(|| destination.to_owned())
    })
}

fn copy_entry<R: Read>(entry: &mut Entry<R>, destination: &Utf8Path) -> Result<u64, ArchiveError> {
    let file = File::create(destination).map_err(|source| ArchiveError::Create {
        destination: destination.to_owned(),
        source,
    })?;
    let copy_error = |source| ArchiveError::Copy {
        entry: entry.name.clone(),
        destination: destination.to_owned(),
        source,
    };

    let mut output = BufWriter::new(file);
    let bytes = io::copy(&mut entry.reader, &mut output).map_err(copy_error)?;
    output.flush().map_err(copy_error)?;
    Ok(bytes)
}

/// Extracts named entries from archives, enabling test mocking.
///
/// # Examples
///
/// ```
/// use bundle_extractor::archive::ZipExtractor;
///
/// let extractor = ZipExtractor;
/// // Use extractor.extract_named_entry(archive, entry, destination) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor {
    /// Copies the entry named `entry` from `archive` into `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError`] when reading the archive or writing the
    /// destination fails. A missing entry is reported as
    /// [`Extraction::NotFound`], not as an error.
    fn extract_named_entry(
        &self,
        archive: &Utf8Path,
        entry: &str,
        destination: &Utf8Path,
    ) -> Result<Extraction, ArchiveError>;
}

/// Default extractor reading zip and jar archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn extract_named_entry(
        &self,
        archive: &Utf8Path,
        entry: &str,
        destination: &Utf8Path,
    ) -> Result<Extraction, ArchiveError> {
        extract_named_entry(archive, entry, destination)
    }
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
