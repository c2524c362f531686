use crate::url::{parse_target, ParsedTarget};
use crate::{UrlError, UrlResult};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Canonical identity of a pad: the URL path without its leading slash
///
/// Two URLs that only differ in query or fragment name the same document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Vault-relative path of the file holding this document (`{identity}.md`)
    pub fn file_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.md", self.0))
    }

    /// Recovers the identity from a vault-relative `*.md` path
    ///
    /// Returns `None` for paths that do not end in `.md` or that are not
    /// plain relative paths.
    pub fn from_file_path(relative: &Path) -> Option<Self> {
        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_str()?),
                _ => return None,
            }
        }
        let joined = parts.join("/");
        joined.strip_suffix(".md").map(Self::new)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derives the document identity from a URL
///
/// Takes the path component and strips exactly one leading `/`. Query and
/// fragment never contribute. Relative URLs are resolved as server paths.
///
/// # Errors
///
/// `UrlError::Malformed` if the input cannot be parsed as a URL at all. An
/// empty path is not an error and yields the empty identity.
///
/// # Examples
///
/// ```
/// use medusa::url::identity_from_url;
///
/// let id = identity_from_url("https://md.example.com/navigation?both#top").unwrap();
/// assert_eq!(id.as_str(), "navigation");
/// ```
pub fn identity_from_url(url: &str) -> UrlResult<DocumentId> {
    let parsed = parse_target(url.trim())
        .map_err(|e| UrlError::Malformed(format!("{}: {}", url, e)))?;

    let path = match &parsed {
        ParsedTarget::Absolute(u) | ParsedTarget::Relative(u) => u.path(),
    };

    Ok(DocumentId::new(path.strip_prefix('/').unwrap_or(path)))
}
