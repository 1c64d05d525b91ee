//! Bundled-resource resolution.
//!
//! The hosted application addresses its packaged resources with
//! bundle-relative URLs: anything starting with `./` or `/`. Resolution
//! flattens the path down to its base name and extension — `./a/b.json`
//! and `./b.json` both name the bundle file `b.json` — which matches how
//! the application's resources are packaged (one flat directory).
//! Every other URL is a live network endpoint.

use std::path::{Path, PathBuf};

/// Whether `url` addresses a bundled resource rather than the network.
#[must_use]
pub fn is_bundle_url(url: &str) -> bool {
    url.starts_with("./") || url.starts_with('/')
}

/// The application's bundled resource set, rooted at one directory.
#[derive(Debug, Clone)]
pub struct BundleResources {
    root: PathBuf,
}

/// Failure to read a bundled resource.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// The URL does not contain a `name.ext` tail to look up.
    #[error("bundle URL '{0}' has no base name and extension")]
    Unresolvable(String),
    /// The resolved file could not be read.
    #[error("failed to read bundled '{url}': {source}")]
    Io {
        /// The bundle URL as requested by the script.
        url: String,
        /// The underlying filesystem error.
        source: std::io::Error,
    },
}

impl BundleResources {
    /// Create a resource set rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The bundle root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a bundle URL to a path under the root.
    ///
    /// Splits the URL on `/` and `.` and keeps the last two components as
    /// base name and extension; returns `None` when there are fewer than
    /// two components (no extension to look up).
    #[must_use]
    pub fn resolve(&self, url: &str) -> Option<PathBuf> {
        let parts: Vec<&str> = url
            .split(['/', '.'])
            .filter(|part| !part.is_empty())
            .collect();
        if parts.len() < 2 {
            return None;
        }
        let ext = parts[parts.len() - 1];
        let name = parts[parts.len() - 2];
        Some(self.root.join(format!("{name}.{ext}")))
    }

    /// Read a bundled resource as raw bytes.
    ///
    /// # Errors
    ///
    /// [`BundleError::Unresolvable`] when the URL has no `name.ext` tail,
    /// [`BundleError::Io`] when the file cannot be read.
    pub fn read(&self, url: &str) -> Result<Vec<u8>, BundleError> {
        let path = self
            .resolve(url)
            .ok_or_else(|| BundleError::Unresolvable(url.to_string()))?;
        std::fs::read(&path).map_err(|source| BundleError::Io {
            url: url.to_string(),
            source,
        })
    }

    /// Read a bundled resource as UTF-8 text.
    ///
    /// # Errors
    ///
    /// As [`BundleResources::read`]; invalid UTF-8 is replaced rather than
    /// rejected, since scripts expect best-effort text.
    pub fn read_to_string(&self, url: &str) -> Result<String, BundleError> {
        let bytes = self.read(url)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
