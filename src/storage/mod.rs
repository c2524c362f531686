//! Storage module for the local vault
//!
//! This module handles everything that touches the filesystem:
//! - The vault directory with one `{identity}.md` file per pad
//! - A hidden cache of raw pad downloads and rename bookkeeping inside the vault
//! - The fetch-or-load document store used by the crawler

mod store;
mod vault;

pub use store::{checksum, DocumentStore, MaterializedDocument};
pub use vault::{Vault, CACHE_DIR};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path escapes the vault: {0}")]
    UnsafePath(String),

    #[error("Refusing to overwrite {}", .0.display())]
    Occupied(PathBuf),
}

impl StorageError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Creates (if needed) and opens the vault at `path`
///
/// # Arguments
///
/// * `path` - Directory the pads are mirrored into
///
/// # Returns
///
/// * `Ok(Vault)` - The vault directory exists and is usable
/// * `Err(StorageError)` - The directory could not be created
pub fn open_vault(path: &Path) -> StorageResult<Vault> {
    Vault::create(path)
}
