//! Shared test utilities for the extractor crate.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::SystemTime;

use camino::{Utf8Path, Utf8PathBuf};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use zip::ZipWriter;
use zip::result::ZipResult;
use zip::write::SimpleFileOptions;

use crate::env::Environment;

/// An [`Environment`] with a fixed set of variables and an optional home
/// directory.
///
/// Empty values are reported as unset, matching the system environment.
#[derive(Debug, Clone, Default)]
pub struct FixedEnvironment {
    vars: HashMap<String, String>,
    home: Option<PathBuf>,
}

impl FixedEnvironment {
    /// Creates an environment with no variables and no home directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the variable `name` to `value`.
    #[must_use]
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Sets the user's home directory.
    #[must_use]
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }
}

impl Environment for FixedEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        self.vars
            .get(name)
            .filter(|value| !value.is_empty())
            .cloned()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone()
    }
}

/// Writes a zip archive at `path` holding `entries` in the given order.
///
/// # Errors
///
/// Returns the zip error when the file cannot be created or written.
pub fn write_zip(path: &Utf8Path, entries: &[(&str, &[u8])]) -> ZipResult<()> {
    let mut writer = ZipWriter::new(File::create(path)?);
    for (name, data) in entries {
        writer.start_file(*name, SimpleFileOptions::default())?;
        writer.write_all(data)?;
    }
    writer.finish()?;
    Ok(())
}

/// Writes a zip archive at `path` the way the JDK `jar` tool does: every
/// entry is deflated and its sizes and CRC follow the data in a descriptor.
///
/// # Errors
///
/// Returns the I/O error when the archive cannot be assembled or written.
pub fn write_jar(path: &Utf8Path, entries: &[(&str, &[u8])]) -> io::Result<()> {
    entries
        .iter()
        .try_fold(JarBuilder::new(), |jar, (name, data)| jar.deflated(name, data))?
        .write(path)
}

const LOCAL_HEADER: u32 = 0x0403_4b50;
const DATA_DESCRIPTOR: u32 = 0x0807_4b50;
const CENTRAL_HEADER: u32 = 0x0201_4b50;
const END_OF_CENTRAL_DIRECTORY: u32 = 0x0605_4b50;
const VERSION: u16 = 20;
const UTF8_NAMES: u16 = 1 << 11;
const DESCRIPTOR_FOLLOWS: u16 = 1 << 3;
const STORED: u16 = 0;
const DEFLATED: u16 = 8;
// 2024-01-01 00:00 in DOS format.
const DOS_DATE: u16 = 0x5821;

/// Assembles zip archives byte by byte, for layouts `ZipWriter` will not
/// produce: duplicate names and entries closed by data descriptors.
#[derive(Debug, Default)]
pub struct JarBuilder {
    body: Vec<u8>,
    central: Vec<u8>,
    entries: u16,
}

struct EntryRecord<'a> {
    name: &'a str,
    flags: u16,
    method: u16,
    crc: u32,
    compressed: u32,
    size: u32,
    offset: u32,
}

impl JarBuilder {
    /// Creates an empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an uncompressed entry whose sizes sit in its local header.
    ///
    /// # Errors
    ///
    /// Returns an error when the entry is too large for a plain zip record.
    pub fn stored(mut self, name: &str, data: &[u8]) -> io::Result<Self> {
        let size = length(data)?;
        let record = EntryRecord {
            name,
            flags: UTF8_NAMES,
            method: STORED,
            crc: crc32fast::hash(data),
            compressed: size,
            size,
            offset: length(&self.body)?,
        };
        self.local_header(&record, false)?;
        self.body.extend_from_slice(data);
        self.central_header(&record)?;
        Ok(self)
    }

    /// Appends a deflated entry whose sizes follow its data in a
    /// descriptor, leaving zeros in the local header.
    ///
    /// # Errors
    ///
    /// Returns an error when compression fails or the entry is too large
    /// for a plain zip record.
    pub fn deflated(mut self, name: &str, data: &[u8]) -> io::Result<Self> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data)?;
        let compressed = encoder.finish()?;
        let record = EntryRecord {
            name,
            flags: UTF8_NAMES | DESCRIPTOR_FOLLOWS,
            method: DEFLATED,
            crc: crc32fast::hash(data),
            compressed: length(&compressed)?,
            size: length(data)?,
            offset: length(&self.body)?,
        };
        self.local_header(&record, true)?;
        self.body.extend_from_slice(&compressed);
        for field in [DATA_DESCRIPTOR, record.crc, record.compressed, record.size] {
            self.body.extend_from_slice(&field.to_le_bytes());
        }
        self.central_header(&record)?;
        Ok(self)
    }

    /// Writes the entries followed by the central directory to `path`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error when the file cannot be written.
    pub fn write(self, path: &Utf8Path) -> io::Result<()> {
        let Self {
            mut body,
            central,
            entries,
        } = self;
        let directory_offset = length(&body)?;
        let directory_size = length(&central)?;
        body.extend_from_slice(&central);
        body.extend_from_slice(&END_OF_CENTRAL_DIRECTORY.to_le_bytes());
        for field in [0, 0, entries, entries] {
            body.extend_from_slice(&field.to_le_bytes());
        }
        body.extend_from_slice(&directory_size.to_le_bytes());
        body.extend_from_slice(&directory_offset.to_le_bytes());
        body.extend_from_slice(&0_u16.to_le_bytes());
        fs::write(path, body)
    }

    fn local_header(&mut self, record: &EntryRecord<'_>, deferred: bool) -> io::Result<()> {
        let name_length = u16::try_from(record.name.len()).map_err(io::Error::other)?;
        let (crc, compressed, size) = if deferred {
            (0, 0, 0)
        } else {
            (record.crc, record.compressed, record.size)
        };
        self.body.extend_from_slice(&LOCAL_HEADER.to_le_bytes());
        for field in [VERSION, record.flags, record.method, 0, DOS_DATE] {
            self.body.extend_from_slice(&field.to_le_bytes());
        }
        for field in [crc, compressed, size] {
            self.body.extend_from_slice(&field.to_le_bytes());
        }
        for field in [name_length, 0] {
            self.body.extend_from_slice(&field.to_le_bytes());
        }
        self.body.extend_from_slice(record.name.as_bytes());
        Ok(())
    }

    fn central_header(&mut self, record: &EntryRecord<'_>) -> io::Result<()> {
        let name_length = u16::try_from(record.name.len()).map_err(io::Error::other)?;
        self.central.extend_from_slice(&CENTRAL_HEADER.to_le_bytes());
        for field in [VERSION, VERSION, record.flags, record.method, 0, DOS_DATE] {
            self.central.extend_from_slice(&field.to_le_bytes());
        }
        for field in [record.crc, record.compressed, record.size] {
            self.central.extend_from_slice(&field.to_le_bytes());
        }
        // Name, extra and comment lengths, disk number, internal attributes.
        for field in [name_length, 0, 0, 0, 0] {
            self.central.extend_from_slice(&field.to_le_bytes());
        }
        for field in [0, record.offset] {
            self.central.extend_from_slice(&field.to_le_bytes());
        }
        self.central.extend_from_slice(record.name.as_bytes());
        self.entries = self
            .entries
            .checked_add(1)
            .ok_or_else(|| io::Error::other("too many entries"))?;
        Ok(())
    }
}

fn length(bytes: &[u8]) -> io::Result<u32> {
    u32::try_from(bytes.len()).map_err(io::Error::other)
}

/// Writes `<maven_home>/conf/settings.xml` naming `local_repository` as the
/// local repository.
///
/// # Errors
///
/// Returns the I/O error when the directory or file cannot be written.
pub fn write_settings(maven_home: &Utf8Path, local_repository: &str) -> io::Result<Utf8PathBuf> {
    let conf = maven_home.join("conf");
    fs::create_dir_all(&conf)?;
    let settings = conf.join("settings.xml");
    fs::write(
        &settings,
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <settings>\n  <localRepository>{local_repository}</localRepository>\n</settings>\n"
        ),
    )?;
    Ok(settings)
}

/// Creates `<root>/<group path>/<artifact>/<version>/<artifact>-<version><suffix>`
/// and stamps it with `modified`.
///
/// # Errors
///
/// Returns the I/O error when the layout cannot be created.
pub fn create_library(
    root: &Utf8Path,
    group: &str,
    artifact: &str,
    version: &str,
    suffix: &str,
    modified: SystemTime,
) -> io::Result<Utf8PathBuf> {
    let mut dir = root.to_owned();
    dir.extend(group.split('.'));
    dir.push(artifact);
    dir.push(version);
    fs::create_dir_all(&dir)?;

    let path = dir.join(format!("{artifact}-{version}{suffix}"));
    let file = File::create(&path)?;
    file.set_modified(modified)?;
    Ok(path)
}
