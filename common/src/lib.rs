//! Shared helpers for the bundle extractor: readability predicates and
//! directory listing over UTF-8 paths, slash-delimited tag paths, and a
//! streaming lookup of single values in XML settings files.

pub mod fs;
pub mod path;
pub mod xml;

pub use fs::{FsError, file_name_of, is_readable_dir, is_readable_file, last_modified, list_dir};
pub use path::TagPath;
pub use xml::{DocumentError, XmlError, extract_value};
