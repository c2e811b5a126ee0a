//! Streaming lookup of a single text value in an XML settings file.
//!
//! Only the first non-blank text under the requested element path matters,
//! so the reader stops as soon as it has one and never builds a document
//! tree. A document read to its end without a match must have exactly one
//! root element, closed.

use std::fs::File;
use std::io::{self, BufRead, BufReader};

use camino::{Utf8Path, Utf8PathBuf};
use quick_xml::Reader;
use quick_xml::errors::IllFormedError;
use quick_xml::events::Event;
use thiserror::Error;

use crate::path::TagPath;

/// Errors raised while reading a settings file.
#[derive(Debug, Error)]
pub enum XmlError {
    /// The file could not be opened.
    #[error("failed to open xml file {path}")]
    Io {
        /// Path of the file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The file is not well-formed XML, or reading it failed mid-stream.
    #[error("failed to parse xml from {path}")]
    Parse {
        /// Path of the file.
        path: Utf8PathBuf,
        /// What is wrong with the document.
        #[source]
        source: DocumentError,
    },
}

/// Why a settings document was rejected.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The parser rejected the input, including elements left open at the
    /// end of the file.
    #[error(transparent)]
    Syntax(#[from] quick_xml::Error),

    /// The document holds no element at all.
    #[error("document has no root element")]
    NoRoot,

    /// An element follows the closed root element.
    #[error("element <{name}> follows the root element")]
    SecondRoot {
        /// Local name of the extra element.
        name: String,
    },
}

/// Returns the first non-blank text found directly under `tag_path` in the
/// XML file at `path`.
///
/// `tag_path` is slash-delimited, for example `/settings/localRepository`.
/// Namespace prefixes on element names are ignored. Reading stops at the
/// first match, so later duplicates are never considered and content after
/// the match is not validated.
///
/// # Errors
///
/// Returns [`XmlError::Io`] when the file cannot be opened and
/// [`XmlError::Parse`] when the content before the match (or the whole
/// document, when there is no match) is malformed. Without a match, an
/// empty file, a truncated file and a file with several root elements are
/// all malformed.
pub fn extract_value(path: &Utf8Path, tag_path: &str) -> Result<Option<String>, XmlError> {
    let file = File::open(path).map_err(|source| XmlError::Io {
        path: path.to_owned(),
        source,
    })?;
    find_text(BufReader::new(file), &TagPath::parse(tag_path)).map_err(|source| XmlError::Parse {
        path: path.to_owned(),
        source,
    })
}

/// Scans `input` for the first non-blank text under `target`.
fn find_text<R: BufRead>(input: R, target: &TagPath) -> Result<Option<String>, DocumentError> {
    let mut reader = Reader::from_reader(input);
    let mut current = TagPath::default();
    let mut root_closed = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(DocumentError::Syntax)? {
            Event::Start(start) => {
                let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                if root_closed && current.is_empty() {
                    return Err(DocumentError::SecondRoot { name });
                }
                current.push(name);
            }
            Event::Empty(empty) if current.is_empty() => {
                if root_closed {
                    let name = String::from_utf8_lossy(empty.local_name().as_ref()).into_owned();
                    return Err(DocumentError::SecondRoot { name });
                }
                root_closed = true;
            }
            Event::End(_) => {
                current.pop();
                root_closed = current.is_empty();
            }
            Event::Text(text) if current == *target => {
                let value = text.unescape().map_err(DocumentError::Syntax)?;
                if !value.trim().is_empty() {
                    return Ok(Some(value.into_owned()));
                }
            }
            Event::CData(data) if current == *target => {
                let value = String::from_utf8_lossy(&data);
                if !value.trim().is_empty() {
                    return Ok(Some(value.into_owned()));
                }
            }
            Event::Eof => {
                return match current.segments().last() {
                    Some(open) => Err(quick_xml::Error::IllFormed(
                        IllFormedError::MissingEndTag(open.clone()),
                    )
                    .into()),
                    None if root_closed => Ok(None),
                    None => Err(DocumentError::NoRoot),
                };
            }
            _ => {}
        }
        buf.clear();
    }
}

#[cfg(test)]
#[path = "xml_tests.rs"]
mod tests;
