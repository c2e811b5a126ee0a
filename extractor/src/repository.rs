//! Local Maven repository discovery.
//!
//! The repository root is found by trying a fixed sequence of strategies and
//! keeping the first directory that exists and can be read:
//!
//! 1. [`SettingsFileStrategy`]: `<MAVEN_HOME>/conf/settings.xml`,
//!    element `/settings/localRepository`, with `${user.home}` expanded.
//! 2. [`UserHomeStrategy`]: `<user home>/.m2/repository`.
//!
//! Finding nothing is a normal outcome and yields an empty root list. The
//! outcome, empty or not, is cached by [`RepositoryLocator`] until
//! [`RepositoryLocator::reset`] is called.

use std::sync::Arc;

use bundle_common::fs::{is_readable_dir, is_readable_file};
use bundle_common::xml::{XmlError, extract_value};
use camino::Utf8PathBuf;
use log::{debug, trace};
use once_cell::sync::OnceCell;
use thiserror::Error;

use crate::env::{Environment, SystemEnvironment};

/// Errors raised while locating the repository root.
#[derive(Debug, Error)]
pub enum LocateError {
    /// The Maven settings file exists but could not be read or parsed.
    #[error("failed to read repository location from settings: {0}")]
    Settings(#[from] XmlError),
}

/// Names and conventions used to find the local repository.
///
/// The [`Default`] value describes a standard Maven installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorConfig {
    /// Variable naming the Maven installation directory.
    pub maven_home_var: String,
    /// Settings file location, relative to the Maven installation directory.
    pub settings_file: Utf8PathBuf,
    /// Element path holding the repository location inside the settings file.
    pub local_repository_tag: String,
    /// Token in the configured location that stands for the user's home.
    pub user_home_placeholder: String,
    /// Conventional repository location, relative to the user's home.
    pub default_repository: Utf8PathBuf,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            maven_home_var: "MAVEN_HOME".to_owned(),
            settings_file: Utf8PathBuf::from("conf").join("settings.xml"),
            local_repository_tag: "/settings/localRepository".to_owned(),
            user_home_placeholder: "${user.home}".to_owned(),
            default_repository: Utf8PathBuf::from(".m2").join("repository"),
        }
    }
}

/// One way of finding a repository root.
pub trait RootStrategy {
    /// Short name used in log messages.
    fn name(&self) -> &'static str;

    /// Returns a readable repository directory, or `None` when this strategy
    /// has no usable candidate.
    ///
    /// # Errors
    ///
    /// Returns an error only when an input that does exist cannot be read.
    fn locate(
        &self,
        env: &dyn Environment,
        config: &LocatorConfig,
    ) -> Result<Option<Utf8PathBuf>, LocateError>;
}

/// Reads the repository location from the Maven installation's settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsFileStrategy;

impl RootStrategy for SettingsFileStrategy {
    fn name(&self) -> &'static str {
        "maven settings"
    }

    fn locate(
        &self,
        env: &dyn Environment,
        config: &LocatorConfig,
    ) -> Result<Option<Utf8PathBuf>, LocateError> {
        let Some(maven_home) = env.var(&config.maven_home_var) else {
            trace!("{} is not set", config.maven_home_var);
            return Ok(None);
        };
        let settings = Utf8PathBuf::from(maven_home).join(&config.settings_file);
        if !is_readable_file(&settings) {
            trace!("no readable settings file at {settings}");
            return Ok(None);
        }

        let Some(configured) = extract_value(&settings, &config.local_repository_tag)? else {
            trace!("{settings} does not set {}", config.local_repository_tag);
            return Ok(None);
        };
        let Some(expanded) = expand_user_home(configured.trim(), env, config) else {
            trace!("cannot expand {} in {configured}", config.user_home_placeholder);
            return Ok(None);
        };
        Ok(accept_dir(Utf8PathBuf::from(expanded)))
    }
}

/// Uses the conventional repository directory under the user's home.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserHomeStrategy;

impl RootStrategy for UserHomeStrategy {
    fn name(&self) -> &'static str {
        "user home"
    }

    fn locate(
        &self,
        env: &dyn Environment,
        config: &LocatorConfig,
    ) -> Result<Option<Utf8PathBuf>, LocateError> {
        let Some(home) = user_home(env) else {
            return Ok(None);
        };
        Ok(accept_dir(home.join(&config.default_repository)))
    }
}

/// Finds and caches the local repository roots.
///
/// The first call to [`repository_roots`](Self::repository_roots) runs the
/// strategies; every later call returns the same shared list until
/// [`reset`](Self::reset). Concurrent first calls run the strategies once.
pub struct RepositoryLocator {
    env: Box<dyn Environment + Send + Sync>,
    config: LocatorConfig,
    strategies: Vec<Box<dyn RootStrategy + Send + Sync>>,
    roots: OnceCell<Arc<[Utf8PathBuf]>>,
}

impl RepositoryLocator {
    /// Creates a locator reading from `env` with the default Maven
    /// conventions and strategies.
    #[must_use]
    pub fn new(env: impl Environment + Send + Sync + 'static) -> Self {
        let strategies: Vec<Box<dyn RootStrategy + Send + Sync>> =
            vec![Box::new(SettingsFileStrategy), Box::new(UserHomeStrategy)];
        Self {
            env: Box::new(env),
            config: LocatorConfig::default(),
            strategies,
            roots: OnceCell::new(),
        }
    }

    /// Creates a locator over the real process environment.
    #[must_use]
    pub fn system() -> Self {
        Self::new(SystemEnvironment)
    }

    /// Replaces the lookup conventions.
    #[must_use]
    pub fn with_config(mut self, config: LocatorConfig) -> Self {
        self.config = config;
        self.roots = OnceCell::new();
        self
    }

    /// Replaces the strategy sequence. Strategies run in the given order.
    #[must_use]
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn RootStrategy + Send + Sync>>) -> Self {
        self.strategies = strategies;
        self.roots = OnceCell::new();
        self
    }

    /// Returns the lookup conventions in use.
    #[must_use]
    pub const fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// Returns the repository roots, resolving them on first use.
    ///
    /// An empty list means no repository was found. The list is cached even
    /// when empty, so later changes to the environment or filesystem are not
    /// observed until [`reset`](Self::reset).
    ///
    /// # Errors
    ///
    /// Returns [`LocateError`] when a settings file exists but cannot be
    /// parsed. Nothing is cached in that case.
    pub fn repository_roots(&self) -> Result<Arc<[Utf8PathBuf]>, LocateError> {
        self.roots
            .get_or_try_init(|| self.resolve())
            .map(Arc::clone)
    }

    /// Forgets the cached roots so the next lookup starts afresh.
    pub fn reset(&mut self) {
        self.roots.take();
    }

    fn resolve(&self) -> Result<Arc<[Utf8PathBuf]>, LocateError> {
        for strategy in &self.strategies {
            if let Some(root) = strategy.locate(self.env.as_ref(), &self.config)? {
                debug!("local repository {root} found via {}", strategy.name());
                return Ok(Arc::from(vec![root]));
            }
        }
        debug!("no local repository found");
        Ok(Arc::from(Vec::new()))
    }
}

impl std::fmt::Debug for RepositoryLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryLocator")
            .field("config", &self.config)
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("roots", &self.roots.get())
            .finish_non_exhaustive()
    }
}

/// Returns the user's home directory when it exists and is valid UTF-8.
fn user_home(env: &dyn Environment) -> Option<Utf8PathBuf> {
    let Some(home) = env.home_dir() else {
        trace!("user home directory is unknown");
        return None;
    };
    Utf8PathBuf::from_path_buf(home)
        .inspect_err(|path| trace!("user home {} is not valid UTF-8", path.display()))
        .ok()
}

/// Substitutes the user-home placeholder in `configured`.
///
/// Returns `None` when the placeholder is present but the home directory is
/// unknown.
fn expand_user_home(
    configured: &str,
    env: &dyn Environment,
    config: &LocatorConfig,
) -> Option<String> {
    if !configured.contains(&config.user_home_placeholder) {
        return Some(configured.to_owned());
    }
    let home = user_home(env)?;
    Some(configured.replace(&config.user_home_placeholder, home.as_str()))
}

fn accept_dir(candidate: Utf8PathBuf) -> Option<Utf8PathBuf> {
    if is_readable_dir(&candidate) {
        Some(candidate)
    } else {
        trace!("{candidate} is not a readable directory");
        None
    }
}

#[cfg(test)]
#[path = "repository_tests.rs"]
mod tests;
