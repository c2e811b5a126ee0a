//! Distribution descriptors and bundle entry naming.
//!
//! The bundle jar stores one archive per distribution under a namespace
//! directory, named `<namespace>/<platform>-<version>-<bitsize>.<archive type>`,
//! for example `mongo/Linux-V3_6_5-B64.tgz`.

use std::fmt;

/// Operating system of a distribution, spelled as the download framework
/// spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Linux.
    Linux,
    /// Windows.
    Windows,
    /// macOS.
    OsX,
    /// Solaris.
    Solaris,
    /// FreeBSD.
    FreeBsd,
}

impl Platform {
    /// Canonical name used in entry names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "Linux",
            Self::Windows => "Windows",
            Self::OsX => "OS_X",
            Self::Solaris => "Solaris",
            Self::FreeBsd => "FreeBSD",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pointer width of a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitSize {
    /// 32-bit.
    B32,
    /// 64-bit.
    B64,
}

impl BitSize {
    /// Canonical name used in entry names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::B32 => "B32",
            Self::B64 => "B64",
        }
    }
}

impl fmt::Display for BitSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A platform-specific distribution requested by the download framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    platform: Platform,
    version: String,
    bitsize: BitSize,
    archive_type: String,
}

impl Distribution {
    /// Describes a distribution.
    ///
    /// `version` is the framework's version token (such as `V3_6_5`) and
    /// `archive_type` the archive extension without a dot (such as `tgz`).
    #[must_use]
    pub fn new(
        platform: Platform,
        version: impl Into<String>,
        bitsize: BitSize,
        archive_type: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            version: version.into(),
            bitsize,
            archive_type: archive_type.into(),
        }
    }

    /// Operating system.
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Version token as given.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Pointer width.
    #[must_use]
    pub const fn bitsize(&self) -> BitSize {
        self.bitsize
    }

    /// Archive extension, without a leading dot.
    #[must_use]
    pub fn archive_type(&self) -> &str {
        &self.archive_type
    }

    /// Version in the dotted form used for the bundle artifact: a single
    /// leading `V` is dropped and underscores become dots.
    ///
    /// # Examples
    ///
    /// ```
    /// use bundle_extractor::naming::{BitSize, Distribution, Platform};
    ///
    /// let distribution = Distribution::new(Platform::Linux, "V3_6_5", BitSize::B64, "tgz");
    /// assert_eq!(distribution.artifact_version(), "3.6.5");
    /// ```
    #[must_use]
    pub fn artifact_version(&self) -> String {
        self.version
            .strip_prefix('V')
            .unwrap_or(&self.version)
            .replace('_', ".")
    }
}

/// Name of a distribution's archive inside the bundle.
///
/// # Examples
///
/// ```
/// use bundle_extractor::naming::{BitSize, Distribution, EntryName, Platform};
///
/// let distribution = Distribution::new(Platform::OsX, "V3_4_15", BitSize::B64, "tgz");
/// let name = EntryName::new("mongo", &distribution);
/// assert_eq!(name.as_str(), "mongo/OS_X-V3_4_15-B64.tgz");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryName(String);

impl EntryName {
    /// Formats the entry name for `distribution` under `namespace`.
    #[must_use]
    pub fn new(namespace: &str, distribution: &Distribution) -> Self {
        Self(format!(
            "{namespace}/{}-{}-{}.{}",
            distribution.platform(),
            distribution.version(),
            distribution.bitsize(),
            distribution.archive_type(),
        ))
    }

    /// The entry name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
