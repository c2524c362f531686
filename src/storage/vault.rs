use crate::storage::{StorageError, StorageResult};
use crate::url::DocumentId;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Hidden directory inside the vault that holds raw downloads and bookkeeping
pub const CACHE_DIR: &str = ".medusa";

/// The local directory pads are mirrored into
///
/// All paths taken and returned by the vault are relative to its root.
#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
}

impl Vault {
    /// Opens the vault at `path`, creating the directory if it is missing
    pub fn create(path: &Path) -> StorageResult<Self> {
        fs::create_dir_all(path).map_err(StorageError::io(path))?;
        Ok(Self {
            root: path.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of `relative`, refusing anything that leaves the vault
    pub fn resolve(&self, relative: &Path) -> StorageResult<PathBuf> {
        let mut has_name = false;
        for component in relative.components() {
            match component {
                Component::Normal(_) => has_name = true,
                _ => return Err(StorageError::UnsafePath(relative.display().to_string())),
            }
        }
        if !has_name {
            return Err(StorageError::UnsafePath(relative.display().to_string()));
        }
        Ok(self.root.join(relative))
    }

    pub fn exists(&self, relative: &Path) -> bool {
        self.resolve(relative).map(|p| p.is_file()).unwrap_or(false)
    }

    pub fn read(&self, relative: &Path) -> StorageResult<String> {
        let path = self.resolve(relative)?;
        fs::read_to_string(&path).map_err(StorageError::io(&path))
    }

    /// Writes `content` to `relative`, creating parent directories
    pub fn write(&self, relative: &Path, content: &str) -> StorageResult<PathBuf> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(StorageError::io(parent))?;
        }
        fs::write(&path, content).map_err(StorageError::io(&path))?;
        Ok(path)
    }

    /// Moves a document; fails with `Occupied` if something is already at `to`
    pub fn rename(&self, from: &Path, to: &Path) -> StorageResult<()> {
        let from = self.resolve(from)?;
        let to = self.resolve(to)?;
        if to.exists() {
            return Err(StorageError::Occupied(to));
        }
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(StorageError::io(parent))?;
        }
        fs::rename(&from, &to).map_err(StorageError::io(&from))
    }

    pub fn remove(&self, relative: &Path) -> StorageResult<()> {
        let path = self.resolve(relative)?;
        fs::remove_file(&path).map_err(StorageError::io(&path))
    }

    fn cache_path(id: &DocumentId) -> PathBuf {
        Path::new(CACHE_DIR).join("raw").join(id.file_path())
    }

    /// Reads `relative`, `None` if the file does not exist
    fn read_optional(&self, relative: &Path) -> StorageResult<Option<String>> {
        let path = self.resolve(relative)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io { path, source: e }),
        }
    }

    /// Reads a bookkeeping file kept next to the raw cache
    pub fn read_internal(&self, name: &str) -> StorageResult<Option<String>> {
        self.read_optional(&Path::new(CACHE_DIR).join(name))
    }

    pub fn write_internal(&self, name: &str, content: &str) -> StorageResult<()> {
        self.write(&Path::new(CACHE_DIR).join(name), content).map(|_| ())
    }

    /// Drops every raw download, forcing the next crawl back to the server
    pub fn clear_cache(&self) -> StorageResult<()> {
        let path = self.root.join(CACHE_DIR).join("raw");
        match fs::remove_dir_all(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io { path, source: e }),
        }
    }

    /// Reads the raw cached copy of a pad, `None` if there is none
    pub fn read_cached(&self, id: &DocumentId) -> StorageResult<Option<String>> {
        self.read_optional(&Self::cache_path(id))
    }

    pub fn write_cached(&self, id: &DocumentId, content: &str) -> StorageResult<()> {
        self.write(&Self::cache_path(id), content).map(|_| ())
    }

    /// Lists every `*.md` document of the vault, sorted
    ///
    /// Descends into subdirectories and skips hidden entries, which keeps the
    /// raw cache and temporary files out of the listing.
    pub fn list_documents(&self) -> StorageResult<Vec<PathBuf>> {
        let mut documents = Vec::new();
        self.collect_documents(Path::new(""), &mut documents)?;
        documents.sort();
        Ok(documents)
    }

    fn collect_documents(&self, relative: &Path, out: &mut Vec<PathBuf>) -> StorageResult<()> {
        let dir = self.root.join(relative);
        let entries = fs::read_dir(&dir).map_err(StorageError::io(&dir))?;

        for entry in entries {
            let entry = entry.map_err(StorageError::io(&dir))?;
            let name = entry.file_name();
            let Some(name_str) = name.to_str() else {
                tracing::warn!("Skipping non UTF-8 file name in {}", dir.display());
                continue;
            };
            if name_str.starts_with('.') {
                continue;
            }

            let child = relative.join(name_str);
            let file_type = entry.file_type().map_err(StorageError::io(&dir))?;
            if file_type.is_dir() {
                self.collect_documents(&child, out)?;
            } else if file_type.is_file() && name_str.ends_with(".md") {
                out.push(child);
            }
        }

        Ok(())
    }
}
