//! Bundle extractor library.
//!
//! This crate supplies database distribution archives from a bundle jar that
//! has already been installed in the local Maven repository, so a download
//! framework can run without network access. It locates the repository,
//! resolves the bundle for the requested version, and copies the single
//! platform archive out of it.
//!
//! # Modules
//!
//! - [`archive`] - Single-entry extraction from zip and jar archives
//! - [`bundle`] - The [`Downloader`](bundle::Downloader) backed by the bundle jar
//! - [`env`] - Environment variable and home directory access
//! - [`error`] - Error type for bundle extraction
//! - [`naming`] - Distribution descriptors and bundle entry names
//! - [`repository`] - Local repository discovery with a resettable cache
//! - [`resolver`] - Artifact lookup, including snapshot matching

pub mod archive;
pub mod bundle;
pub mod env;
pub mod error;
pub mod naming;
pub mod repository;
pub mod resolver;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
