use crate::crawler::{FetchResult, Fetcher};
use crate::storage::{StorageResult, Vault};
use crate::url::DocumentId;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// A pad written to the vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedDocument {
    pub identity: DocumentId,
    /// Absolute path of the written file
    pub path: PathBuf,
    pub bytes: usize,
    /// SHA-256 of the written content, hex encoded
    pub checksum: String,
}

/// Computes the hex encoded SHA-256 of a document's content
pub fn checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Fetch-or-load access to pad contents
///
/// Contents are remembered for the lifetime of the store, so a pad is
/// downloaded at most once per run unless a refresh is forced. Raw downloads
/// are also kept in the vault's hidden cache directory; the converted vault
/// files are never read back as pad contents.
pub struct DocumentStore {
    fetcher: Arc<dyn Fetcher>,
    vault: Vault,
    memo: Mutex<HashMap<DocumentId, String>>,
}

impl DocumentStore {
    pub fn new(fetcher: Arc<dyn Fetcher>, vault: Vault) -> Self {
        Self {
            fetcher,
            vault,
            memo: Mutex::new(HashMap::new()),
        }
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    /// Returns the content of a pad
    ///
    /// Without `force_refresh` the in-memory copy is used first, then the
    /// raw cache, then the server. With `force_refresh` the server is always
    /// asked. A failed download yields an empty string, which is remembered
    /// so the failure is only reported once.
    ///
    /// # Arguments
    ///
    /// * `id` - Identity of the pad
    /// * `force_refresh` - Skip both the memo and the raw cache
    pub async fn get(&self, id: &DocumentId, force_refresh: bool) -> String {
        if !force_refresh {
            let memoized = self.memo.lock().unwrap().get(id).cloned();
            if let Some(content) = memoized {
                return content;
            }

            match self.vault.read_cached(id) {
                Ok(Some(content)) => {
                    tracing::debug!("Loaded {} from cache", id);
                    self.remember(id, &content);
                    return content;
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Ignoring unreadable cache entry for {}: {}", id, e),
            }
        }

        let content = match self.fetcher.fetch(id).await {
            FetchResult::Found { content } => {
                if let Err(e) = self.vault.write_cached(id, &content) {
                    tracing::warn!("Failed to cache {}: {}", id, e);
                }
                content
            }
            FetchResult::Missing { status_code } => {
                tracing::warn!("Pad {} is not available (HTTP {})", id, status_code);
                String::new()
            }
            FetchResult::Unreachable { error } => {
                tracing::warn!("Failed to download {}: {}", id, error);
                String::new()
            }
        };

        self.remember(id, &content);
        content
    }

    fn remember(&self, id: &DocumentId, content: &str) {
        self.memo
            .lock()
            .unwrap()
            .insert(id.clone(), content.to_string());
    }

    /// Downloads a fresh copy of a pad and writes it verbatim to `{id}.md`
    ///
    /// # Returns
    ///
    /// * `Ok(MaterializedDocument)` - The file was written
    /// * `Err(StorageError)` - The identity maps outside the vault or the write failed
    pub async fn materialize(&self, id: &DocumentId) -> StorageResult<MaterializedDocument> {
        let content = self.get(id, true).await;
        let path = self.vault.write(&id.file_path(), &content)?;
        tracing::debug!("Wrote {} ({} bytes)", path.display(), content.len());

        Ok(MaterializedDocument {
            identity: id.clone(),
            path,
            bytes: content.len(),
            checksum: checksum(&content),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::testing::MemoryFetcher;
    use crate::storage::StorageError;

    fn store(fetcher: Arc<MemoryFetcher>) -> (tempfile::TempDir, DocumentStore) {
        let dir = tempfile::tempdir().unwrap();
        let vault = Vault::create(dir.path()).unwrap();
        (dir, DocumentStore::new(fetcher, vault))
    }

    #[tokio::test]
    async fn test_get_fetches_once() {
        let fetcher = Arc::new(MemoryFetcher::new([("a", "# A")]));
        let (_dir, store) = store(fetcher.clone());
        let id = DocumentId::new("a");

        assert_eq!(store.get(&id, false).await, "# A");
        assert_eq!(store.get(&id, false).await, "# A");
        assert_eq!(fetcher.calls(&id), 1);
    }

    #[tokio::test]
    async fn test_force_refresh_goes_to_server() {
        let fetcher = Arc::new(MemoryFetcher::new([("a", "# A")]));
        let (_dir, store) = store(fetcher.clone());
        let id = DocumentId::new("a");

        store.get(&id, false).await;
        store.get(&id, true).await;
        assert_eq!(fetcher.calls(&id), 2);
    }

    #[tokio::test]
    async fn test_cached_copy_is_used_across_stores() {
        let dir = tempfile::tempdir().unwrap();
        let id = DocumentId::new("a");

        let first = Arc::new(MemoryFetcher::new([("a", "# A")]));
        let vault = Vault::create(dir.path()).unwrap();
        DocumentStore::new(first, vault.clone()).get(&id, true).await;

        let second = Arc::new(MemoryFetcher::new([("a", "# changed")]));
        let store = DocumentStore::new(second.clone(), vault);
        assert_eq!(store.get(&id, false).await, "# A");
        assert_eq!(second.calls(&id), 0);
    }

    #[tokio::test]
    async fn test_missing_pad_is_empty_and_remembered() {
        let fetcher = Arc::new(MemoryFetcher::default());
        let (_dir, store) = store(fetcher.clone());
        let id = DocumentId::new("gone");

        assert_eq!(store.get(&id, false).await, "");
        assert_eq!(store.get(&id, false).await, "");
        assert_eq!(fetcher.calls(&id), 1);
        assert_eq!(store.vault().read_cached(&id).unwrap(), None);
    }

    #[tokio::test]
    async fn test_materialize_writes_verbatim() {
        let fetcher = Arc::new(MemoryFetcher::new([("notes/a", "# A\n[b](/b)\n")]));
        let (dir, store) = store(fetcher);
        let id = DocumentId::new("notes/a");

        let doc = store.materialize(&id).await.unwrap();
        assert_eq!(doc.path, dir.path().join("notes/a.md"));
        assert_eq!(
            std::fs::read_to_string(&doc.path).unwrap(),
            "# A\n[b](/b)\n"
        );
        assert_eq!(doc.bytes, 12);
        assert_eq!(doc.checksum, checksum("# A\n[b](/b)\n"));
    }

    #[tokio::test]
    async fn test_materialize_rejects_escaping_identity() {
        let fetcher = Arc::new(MemoryFetcher::new([("../x", "x")]));
        let (_dir, store) = store(fetcher);
        let result = store.materialize(&DocumentId::new("../x")).await;
        assert!(matches!(result, Err(StorageError::UnsafePath(_))));
    }

    #[test]
    fn test_checksum_is_sha256_hex() {
        assert_eq!(
            checksum(""),
            "e3b0c44298fc1c149afbe4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
