//! Access to the process environment.
//!
//! Repository lookup reads a Maven home variable and the user's home
//! directory. Routing both through [`Environment`] lets tests supply a fixed
//! environment instead of mutating process-wide state.

use std::path::PathBuf;

/// Source of environment variables and the user's home directory.
#[cfg_attr(test, mockall::automock)]
pub trait Environment {
    /// Returns the value of the variable `name`.
    ///
    /// Unset, empty, and non-Unicode values are all reported as `None`.
    fn var(&self, name: &str) -> Option<String>;

    /// Returns the current user's home directory, if one can be determined.
    fn home_dir(&self) -> Option<PathBuf>;
}

/// The real process environment.
///
/// The home directory comes from [`directories_next::BaseDirs`], which
/// consults `HOME` on Unix and the user profile folder on Windows.
///
/// # Examples
///
/// ```
/// use bundle_extractor::env::{Environment, SystemEnvironment};
///
/// let env = SystemEnvironment;
/// let _maven_home = env.var("MAVEN_HOME");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|value| !value.is_empty())
    }

    fn home_dir(&self) -> Option<PathBuf> {
        directories_next::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
    }
}
