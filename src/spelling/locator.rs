//! Uniform resource addressing across the four storage namespaces.
//!
//! A [`ResourceRef`] names a resource by `(namespace, relative path)` without
//! touching the filesystem. Concrete paths are only produced on demand via
//! [`ResourceRef::absolute_path`] against a [`StorageRoots`] configuration,
//! so the same ref is valid on any host.

use std::fmt;
use std::path::PathBuf;

/// The storage namespace a [`ResourceRef`] addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Read-only assets bundled with the application.
    BundledAssets,
    /// Volatile cache storage; may be wiped between runs.
    Cache,
    /// Durable internal storage.
    Internal,
    /// An arbitrary external URI or filesystem path.
    External,
}

/// A typed, immutable locator for a resource in one of the four namespaces.
///
/// The stored path never begins with a path separator; equality and hashing
/// are by `(namespace, path)`. Derived refs ([`ResourceRef::sub_path`]) are
/// new values, never mutations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    namespace: Namespace,
    path: String,
}

impl ResourceRef {
    fn new(namespace: Namespace, path: &str) -> Self {
        Self {
            namespace,
            path: path.trim_start_matches('/').to_string(),
        }
    }

    /// A ref into the bundled read-only assets.
    pub fn assets(path: &str) -> Self {
        Self::new(Namespace::BundledAssets, path)
    }

    /// A ref into volatile cache storage.
    pub fn cache(path: &str) -> Self {
        Self::new(Namespace::Cache, path)
    }

    /// A ref into durable internal storage.
    pub fn internal(path: &str) -> Self {
        Self::new(Namespace::Internal, path)
    }

    /// A ref wrapping an arbitrary external URI or path.
    ///
    /// The URI is accepted structurally; a malformed URI fails at resolution
    /// time, never at construction.
    pub fn external(uri: &str) -> Self {
        Self {
            namespace: Namespace::External,
            path: uri.to_string(),
        }
    }

    /// Parse a ref from a URI string.
    ///
    /// Recognizes the `assets:`, `cache:` and `internal:` schemes (with or
    /// without a `//` authority part); any other input becomes an external
    /// ref. Construction never fails.
    pub fn from_uri(uri: &str) -> Self {
        for (scheme, namespace) in [
            ("assets:", Namespace::BundledAssets),
            ("cache:", Namespace::Cache),
            ("internal:", Namespace::Internal),
        ] {
            if let Some(rest) = uri.strip_prefix(scheme) {
                let rest = rest.strip_prefix("//").unwrap_or(rest);
                return Self::new(namespace, rest);
            }
        }
        Self::external(uri)
    }

    /// The namespace this ref addresses.
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// The relative path (or, for external refs, the full URI).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The final path segment, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.path.rsplit('/').next().filter(|s| !s.is_empty())
    }

    /// Returns a new ref with `name` appended as a path segment.
    ///
    /// For external refs this appends to the URI path; for the other three
    /// namespaces it joins the relative path.
    pub fn sub_path(&self, name: &str) -> Self {
        let name = name.trim_start_matches('/');
        let path = if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.path.trim_end_matches('/'), name)
        };
        Self {
            namespace: self.namespace,
            path,
        }
    }

    /// Map this ref to a concrete filesystem path.
    ///
    /// Cache and internal refs resolve under the configured roots. External
    /// refs strip an optional `file:` scheme and are otherwise taken as
    /// plain paths. Bundled-asset refs resolve to their relative path as-is;
    /// they are interpreted by the bundled-asset reader, not the filesystem.
    pub fn absolute_path(&self, roots: &StorageRoots) -> PathBuf {
        match self.namespace {
            Namespace::BundledAssets => PathBuf::from(&self.path),
            Namespace::Cache => roots.cache.join(&self.path),
            Namespace::Internal => roots.internal.join(&self.path),
            Namespace::External => {
                let raw = self
                    .path
                    .strip_prefix("file://")
                    .or_else(|| self.path.strip_prefix("file:"))
                    .unwrap_or(&self.path);
                PathBuf::from(raw)
            }
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.namespace {
            Namespace::BundledAssets => write!(f, "assets:{}", self.path),
            Namespace::Cache => write!(f, "cache:{}", self.path),
            Namespace::Internal => write!(f, "internal:{}", self.path),
            Namespace::External => write!(f, "{}", self.path),
        }
    }
}

/// Platform storage roots a [`ResourceRef`] resolves against.
///
/// The assets root is optional: headless or test contexts may have no
/// bundled assets, in which case asset reads fail with
/// [`ContextUnavailable`](crate::spelling::SpellingError::ContextUnavailable).
#[derive(Debug, Clone)]
pub struct StorageRoots {
    pub assets: Option<PathBuf>,
    pub cache: PathBuf,
    pub internal: PathBuf,
}

impl StorageRoots {
    pub fn new(cache: PathBuf, internal: PathBuf) -> Self {
        Self {
            assets: None,
            cache,
            internal,
        }
    }

    /// Conventional layout under a single data directory:
    /// `<data>/cache` and `<data>/files`.
    pub fn under(data_dir: &std::path::Path) -> Self {
        Self::new(data_dir.join("cache"), data_dir.join("files"))
    }

    pub fn with_assets(mut self, assets: PathBuf) -> Self {
        self.assets = Some(assets);
        self
    }
}
