use crate::document::{Document, TitleSource};
use crate::storage::{StorageResult, Vault};
use crate::url::DocumentId;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

/// Bookkeeping file of the rename pass, inside the vault's hidden directory
pub const MANIFEST_FILE: &str = "renames.toml";

/// Result of a rename pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameReport {
    /// `(old, new)` relative paths of every moved document
    pub renamed: Vec<(PathBuf, PathBuf)>,
    /// Documents that kept their name
    pub kept: usize,
    /// Documents whose content had references rewritten
    pub rewritten: usize,
    /// Copies left by an earlier pass whose original was written again
    pub replaced: Vec<PathBuf>,
}

/// Returns true if `title` can be used as a file name inside the vault
///
/// The title must be a single path component that is neither hidden nor a
/// relative path marker.
pub fn is_safe_file_name(title: &str) -> bool {
    !title.trim().is_empty()
        && title != "."
        && title != ".."
        && !title.starts_with('.')
        && !title.contains(&['/', '\\', '\0'][..])
        && !title.chars().any(char::is_control)
}

/// Files produced by earlier rename passes, `renamed file -> original file`
///
/// Only a file listed here may be replaced by a later pass, and only once
/// its original has been written to the vault again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameManifest {
    #[serde(default)]
    renames: BTreeMap<String, String>,
}

impl RenameManifest {
    /// Loads the manifest of `vault`; a missing or unreadable manifest is empty
    pub fn load(vault: &Vault) -> StorageResult<Self> {
        let Some(text) = vault.read_internal(MANIFEST_FILE)? else {
            return Ok(Self::default());
        };
        match toml::from_str(&text) {
            Ok(manifest) => Ok(manifest),
            Err(e) => {
                tracing::warn!("Ignoring malformed rename manifest: {}", e);
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, vault: &Vault) -> StorageResult<()> {
        match toml::to_string(self) {
            Ok(text) => vault.write_internal(MANIFEST_FILE, &text),
            Err(e) => {
                tracing::error!("Failed to serialize the rename manifest: {}", e);
                Ok(())
            }
        }
    }

    /// The file `renamed` was originally written as, if a pass renamed it
    pub fn origin(&self, renamed: &Path) -> Option<PathBuf> {
        self.renames.get(&key(renamed)).map(PathBuf::from)
    }

    /// Records that `old` was moved to `new`
    pub fn record(&mut self, old: &Path, new: &Path) {
        let origin = self.renames.remove(&key(old)).unwrap_or_else(|| key(old));
        if origin == key(new) {
            self.renames.remove(&origin);
        } else {
            self.renames.insert(key(new), origin);
        }
    }

    pub fn forget(&mut self, renamed: &Path) {
        self.renames.remove(&key(renamed));
    }

    /// Drops entries whose renamed file no longer exists
    pub fn retain_existing(&mut self, vault: &Vault) {
        self.renames.retain(|renamed, _| vault.exists(Path::new(renamed)));
    }

    /// Renamed files whose original is listed in `documents` again
    pub fn stale_copies(&self, documents: &[PathBuf]) -> BTreeSet<PathBuf> {
        let listed: HashSet<String> = documents.iter().map(|d| key(d)).collect();
        self.renames
            .iter()
            .filter(|(renamed, origin)| {
                renamed != origin && listed.contains(*renamed) && listed.contains(*origin)
            })
            .map(|(renamed, _)| PathBuf::from(renamed))
            .collect()
    }
}

/// Manifest key of a vault-relative path, `/` separated
fn key(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Mapping from every vault document to the name it ends up with
///
/// Built completely before any file is touched, then used to rewrite
/// references in content and to move the files.
#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    entries: BTreeMap<PathBuf, PathBuf>,
}

impl TranslationTable {
    /// Resolves the title of every listed document
    ///
    /// A document keeps its name when its title comes from its identity or
    /// is not a safe file name. Every document that keeps its name claims
    /// that name first; a document whose new name is already claimed, by one
    /// that stays or by an earlier one in path order, keeps its name too.
    pub fn build(vault: &Vault, documents: &[PathBuf]) -> Self {
        let desired: BTreeMap<&PathBuf, Option<PathBuf>> = documents
            .iter()
            .map(|relative| {
                let target = Self::target_for(vault, relative).filter(|t| t != relative);
                (relative, target)
            })
            .collect();

        let mut staying: HashSet<&PathBuf> = desired
            .iter()
            .filter(|(_, target)| target.is_none())
            .map(|(relative, _)| *relative)
            .collect();

        // a blocked move turns into a stayer, which can block moves assigned earlier
        loop {
            let mut claimed: HashSet<&Path> = staying.iter().map(|p| p.as_path()).collect();
            let mut moves = BTreeMap::new();
            let mut blocked = Vec::new();

            for (relative, target) in &desired {
                let Some(target) = target else { continue };
                if staying.contains(relative) {
                    continue;
                }
                if claimed.insert(target.as_path()) {
                    moves.insert((*relative).clone(), target.clone());
                } else {
                    blocked.push(*relative);
                }
            }

            if blocked.is_empty() {
                let entries = documents
                    .iter()
                    .map(|relative| {
                        let new = moves.remove(relative).unwrap_or_else(|| relative.clone());
                        (relative.clone(), new)
                    })
                    .collect();
                return Self { entries };
            }

            for relative in blocked {
                tracing::warn!(
                    "{} would collide with another document, keeping its name",
                    relative.display()
                );
                staying.insert(relative);
            }
        }
    }

    /// Name a document should get, `None` if it keeps its own
    fn target_for(vault: &Vault, relative: &Path) -> Option<PathBuf> {
        let identity = DocumentId::from_file_path(relative)?;
        let content = match vault.read(relative) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Failed to read {}, keeping its name: {}", relative.display(), e);
                return None;
            }
        };

        let document = Document::with_content(identity, "", content);
        let resolved = document.resolved_title()?;
        if resolved.source == TitleSource::Identity {
            return None;
        }
        if !is_safe_file_name(&resolved.title) {
            tracing::warn!(
                "Title {:?} of {} is not a usable file name, keeping its name",
                resolved.title,
                relative.display()
            );
            return None;
        }

        Some(relative.with_file_name(document.filename()?))
    }

    /// Entries whose name changes
    pub fn moves(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.entries
            .iter()
            .filter(|(old, new)| old != new)
            .map(|(old, new)| (old.as_path(), new.as_path()))
    }

    /// Builds a rewriter for references to moved documents
    ///
    /// Returns `None` when nothing moves.
    pub fn rewriter(&self) -> Result<Option<ReferenceRewriter>, regex::Error> {
        let mut stems = BTreeMap::new();
        let mut files = BTreeMap::new();

        for (old, new) in self.moves() {
            let (Some(old_id), Some(new_id)) =
                (DocumentId::from_file_path(old), DocumentId::from_file_path(new))
            else {
                continue;
            };
            files.insert(format!("{}.md", old_id), format!("{}.md", new_id));
            stems.insert(old_id.to_string(), new_id.to_string());
        }

        if stems.is_empty() {
            return Ok(None);
        }

        let pattern = Regex::new(&format!(
            r"\[\[(?P<stem>{})(?P<close>\||\]\])|(?P<pre>^|[^\w./\-])(?P<file>{})\b",
            alternation(stems.keys()),
            alternation(files.keys())
        ))?;

        Ok(Some(ReferenceRewriter {
            pattern,
            stems,
            files,
        }))
    }
}

/// Regex alternation of escaped literals, longest first
fn alternation<'a>(literals: impl Iterator<Item = &'a String>) -> String {
    let mut literals: Vec<&String> = literals.collect();
    literals.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    literals
        .into_iter()
        .map(|literal| regex::escape(literal))
        .collect::<Vec<_>>()
        .join("|")
}

/// Rewrites `[[old|` / `[[old]]` wiki links and `old.md` mentions in one pass
#[derive(Debug, Clone)]
pub struct ReferenceRewriter {
    pattern: Regex,
    stems: BTreeMap<String, String>,
    files: BTreeMap<String, String>,
}

impl ReferenceRewriter {
    pub fn rewrite(&self, content: &str) -> String {
        self.pattern
            .replace_all(content, |caps: &Captures| {
                if let Some(stem) = caps.name("stem") {
                    format!("[[{}{}", self.stems[stem.as_str()], &caps["close"])
                } else {
                    format!("{}{}", &caps["pre"], self.files[&caps["file"]])
                }
            })
            .into_owned()
    }
}

/// Renames every vault document after its resolved title
///
/// Phase one builds the [`TranslationTable`] for the whole vault. Phase two
/// rewrites references to moved documents in every file and then moves the
/// files, going through hidden temporary names so that two documents can
/// swap names. No document is ever overwritten: the only files removed are
/// copies an earlier pass produced (see [`RenameManifest`]) whose original
/// was written again, which is what a repeated mirror run does.
///
/// Failures on single documents are logged and do not stop the pass.
pub fn rename_documents(vault: &Vault) -> StorageResult<RenameReport> {
    let mut manifest = RenameManifest::load(vault)?;
    let listed = vault.list_documents()?;
    let stale = manifest.stale_copies(&listed);
    let documents: Vec<PathBuf> = listed
        .into_iter()
        .filter(|relative| !stale.contains(relative))
        .collect();

    let table = TranslationTable::build(vault, &documents);
    let mut report = RenameReport::default();

    let rewriter = match table.rewriter() {
        Ok(rewriter) => rewriter,
        Err(e) => {
            tracing::error!("Failed to build the reference pattern: {}", e);
            report.kept = documents.len();
            return Ok(report);
        }
    };

    if let Some(rewriter) = &rewriter {
        for relative in &documents {
            let content = match vault.read(relative) {
                Ok(content) => content,
                Err(e) => {
                    tracing::error!("Failed to read {}: {}", relative.display(), e);
                    continue;
                }
            };
            let updated = rewriter.rewrite(&content);
            if updated == content {
                continue;
            }
            match vault.write(relative, &updated) {
                Ok(_) => report.rewritten += 1,
                Err(e) => tracing::error!("Failed to write {}: {}", relative.display(), e),
            }
        }
    }

    for copy in stale {
        match vault.remove(&copy) {
            Ok(()) => {
                tracing::debug!(
                    "Removed {}, its original {} was written again",
                    copy.display(),
                    manifest.origin(&copy).unwrap_or_default().display()
                );
                manifest.forget(&copy);
                report.replaced.push(copy);
            }
            Err(e) => tracing::error!("Failed to remove {}: {}", copy.display(), e),
        }
    }

    let mut staged = Vec::new();
    for (index, (old, new)) in table.moves().enumerate() {
        let temporary = old.with_file_name(format!(".medusa-rename-{}.md", index));
        match vault.rename(old, &temporary) {
            Ok(()) => staged.push((old, temporary, new)),
            Err(e) => tracing::error!("Failed to move {}: {}", old.display(), e),
        }
    }

    for (old, temporary, new) in staged {
        match vault.rename(&temporary, new) {
            Ok(()) => {
                tracing::debug!("Renamed {} to {}", old.display(), new.display());
                manifest.record(old, new);
                report.renamed.push((old.to_path_buf(), new.to_path_buf()));
            }
            Err(e) => {
                tracing::error!("Failed to rename {} to {}: {}", old.display(), new.display(), e);
                if let Err(e) = vault.rename(&temporary, old) {
                    tracing::error!("Failed to restore {}: {}", old.display(), e);
                }
            }
        }
    }

    manifest.retain_existing(vault);
    manifest.save(vault)?;

    report.kept = documents.len() - report.renamed.len();
    if rewriter.is_none() {
        tracing::info!("No documents to rename");
    } else {
        tracing::info!(
            "Renamed {} documents, {} kept their name",
            report.renamed.len(),
            report.kept
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault_with(files: &[(&str, &str)]) -> (tempfile::TempDir, Vault) {
        let dir = tempfile::tempdir().unwrap();
        let vault = Vault::create(dir.path()).unwrap();
        for (name, content) in files {
            vault.write(Path::new(name), content).unwrap();
        }
        (dir, vault)
    }

    fn names(vault: &Vault) -> Vec<String> {
        vault
            .list_documents()
            .unwrap()
            .iter()
            .map(|p| p.display().to_string())
            .collect()
    }

    #[test]
    fn test_safe_file_names() {
        assert!(is_safe_file_name("Alpha"));
        assert!(is_safe_file_name("Meeting Notes 2024"));

        assert!(!is_safe_file_name(""));
        assert!(!is_safe_file_name("  "));
        assert!(!is_safe_file_name(".."));
        assert!(!is_safe_file_name(".hidden"));
        assert!(!is_safe_file_name("a/b"));
        assert!(!is_safe_file_name("a\\b"));
    }

    #[test]
    fn test_two_phase_rename() {
        let (_dir, vault) = vault_with(&[
            ("a.md", "# Alpha\nsee b.md\n"),
            ("b.md", "# Beta\n"),
        ]);

        let report = rename_documents(&vault).unwrap();

        assert_eq!(names(&vault), vec!["Alpha.md", "Beta.md"]);
        assert_eq!(
            vault.read(Path::new("Alpha.md")).unwrap(),
            "# Alpha\nsee Beta.md\n"
        );
        assert_eq!(report.renamed.len(), 2);
        assert_eq!(report.kept, 0);
        assert_eq!(report.rewritten, 1);
    }

    #[test]
    fn test_wiki_links_follow_renames() {
        let (_dir, vault) = vault_with(&[
            ("nav.md", "---\ntitle: Navigation\n---\n[[page|The page]] and [[page]]\n"),
            ("page.md", "# The Page\n[[nav|back]]\n"),
        ]);

        rename_documents(&vault).unwrap();

        assert_eq!(names(&vault), vec!["Navigation.md", "The_Page.md"]);
        assert_eq!(
            vault.read(Path::new("Navigation.md")).unwrap(),
            "---\ntitle: Navigation\n---\n[[The_Page|The page]] and [[The_Page]]\n"
        );
        assert_eq!(
            vault.read(Path::new("The_Page.md")).unwrap(),
            "# The Page\n[[Navigation|back]]\n"
        );
    }

    #[test]
    fn test_references_need_a_boundary() {
        let (_dir, vault) = vault_with(&[
            ("a.md", "# Alpha\n"),
            ("notes.md", "a.md, data.md, a.mdx, [[ab|x]], [[a]]\n"),
        ]);

        rename_documents(&vault).unwrap();

        assert_eq!(
            vault.read(Path::new("notes.md")).unwrap(),
            "Alpha.md, data.md, a.mdx, [[ab|x]], [[Alpha]]\n"
        );
    }

    #[test]
    fn test_identity_titles_keep_their_name() {
        let (_dir, vault) = vault_with(&[("plain.md", "no heading here\n")]);
        let report = rename_documents(&vault).unwrap();
        assert_eq!(names(&vault), vec!["plain.md"]);
        assert_eq!(report.kept, 1);
        assert!(report.renamed.is_empty());
    }

    #[test]
    fn test_unsafe_metadata_title_keeps_its_name() {
        let (_dir, vault) = vault_with(&[("x.md", "---\ntitle: ../escape\n---\nbody\n")]);
        rename_documents(&vault).unwrap();
        assert_eq!(names(&vault), vec!["x.md"]);
    }

    #[test]
    fn test_colliding_titles_keep_later_names() {
        let (_dir, vault) = vault_with(&[("a.md", "# Same\n"), ("b.md", "# Same\n")]);

        let report = rename_documents(&vault).unwrap();

        assert_eq!(names(&vault), vec!["Same.md", "b.md"]);
        assert_eq!(report.renamed.len(), 1);
        assert_eq!(report.kept, 1);
    }

    #[test]
    fn test_documents_can_swap_names() {
        let (_dir, vault) = vault_with(&[("x.md", "# y\nfirst\n"), ("y.md", "# x\nsecond\n")]);

        rename_documents(&vault).unwrap();

        assert_eq!(vault.read(Path::new("y.md")).unwrap(), "# y\nfirst\n");
        assert_eq!(vault.read(Path::new("x.md")).unwrap(), "# x\nsecond\n");
    }

    #[test]
    fn test_rename_replaces_stale_copy() {
        let (_dir, vault) = vault_with(&[("a.md", "# Alpha\nold\n")]);
        rename_documents(&vault).unwrap();
        assert_eq!(names(&vault), vec!["Alpha.md"]);

        // the next mirror run writes the pad under its identity again
        vault.write(Path::new("a.md"), "# Alpha\nfresh\n").unwrap();
        let report = rename_documents(&vault).unwrap();

        assert_eq!(names(&vault), vec!["Alpha.md"]);
        assert_eq!(vault.read(Path::new("Alpha.md")).unwrap(), "# Alpha\nfresh\n");
        assert_eq!(report.replaced, vec![PathBuf::from("Alpha.md")]);
    }

    #[test]
    fn test_stale_copy_is_dropped_when_the_title_changes() {
        let (_dir, vault) = vault_with(&[("a.md", "# Alpha\n")]);
        rename_documents(&vault).unwrap();

        vault.write(Path::new("a.md"), "# Gamma\n").unwrap();
        rename_documents(&vault).unwrap();

        assert_eq!(names(&vault), vec!["Gamma.md"]);
        let manifest = RenameManifest::load(&vault).unwrap();
        assert_eq!(manifest.origin(Path::new("Gamma.md")), Some(PathBuf::from("a.md")));
        assert_eq!(manifest.origin(Path::new("Alpha.md")), None);
    }

    #[test]
    fn test_rename_never_replaces_another_pad() {
        let (_dir, vault) = vault_with(&[
            ("Beta.md", "pad named Beta, no heading\n"),
            ("b.md", "# Beta\nother pad\n"),
        ]);

        let report = rename_documents(&vault).unwrap();

        assert_eq!(names(&vault), vec!["Beta.md", "b.md"]);
        assert_eq!(
            vault.read(Path::new("Beta.md")).unwrap(),
            "pad named Beta, no heading\n"
        );
        assert!(report.renamed.is_empty());
        assert_eq!(report.kept, 2);
    }

    #[test]
    fn test_unrecorded_file_at_target_is_kept() {
        let (_dir, vault) = vault_with(&[
            ("a.md", "# Alpha\nfresh\n"),
            ("Alpha.md", "# Alpha\nwritten by hand\n"),
        ]);

        rename_documents(&vault).unwrap();

        assert_eq!(names(&vault), vec!["Alpha.md", "a.md"]);
        assert_eq!(
            vault.read(Path::new("Alpha.md")).unwrap(),
            "# Alpha\nwritten by hand\n"
        );
    }

    #[test]
    fn test_blocked_moves_cascade() {
        // c stays, so b cannot become c, so a cannot become b
        let (_dir, vault) = vault_with(&[
            ("a.md", "# b\nfirst\n"),
            ("b.md", "# c\nsecond\n"),
            ("c.md", "third\n"),
        ]);

        rename_documents(&vault).unwrap();

        assert_eq!(names(&vault), vec!["a.md", "b.md", "c.md"]);
        assert_eq!(vault.read(Path::new("b.md")).unwrap(), "# c\nsecond\n");
    }

    #[test]
    fn test_manifest_follows_chained_renames() {
        let (_dir, vault) = vault_with(&[]);
        let mut manifest = RenameManifest::default();
        manifest.record(Path::new("a.md"), Path::new("Alpha.md"));
        manifest.record(Path::new("Alpha.md"), Path::new("Gamma.md"));
        manifest.save(&vault).unwrap();

        let loaded = RenameManifest::load(&vault).unwrap();
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.origin(Path::new("Gamma.md")), Some(PathBuf::from("a.md")));
        assert_eq!(loaded.origin(Path::new("Alpha.md")), None);

        let mut back = loaded.clone();
        back.record(Path::new("Gamma.md"), Path::new("a.md"));
        assert_eq!(back, RenameManifest::default());
    }

    #[test]
    fn test_malformed_manifest_is_ignored() {
        let (_dir, vault) = vault_with(&[("a.md", "# Alpha\n")]);
        vault.write_internal(MANIFEST_FILE, "not [ toml").unwrap();

        rename_documents(&vault).unwrap();

        assert_eq!(names(&vault), vec!["Alpha.md"]);
    }

    #[test]
    fn test_documents_in_folders_stay_in_their_folder() {
        let (_dir, vault) = vault_with(&[
            ("folder/p.md", "# Deep\n"),
            ("index.md", "[[folder/p|deep]]\n"),
        ]);

        rename_documents(&vault).unwrap();

        assert_eq!(names(&vault), vec!["folder/Deep.md", "index.md"]);
        assert_eq!(
            vault.read(Path::new("index.md")).unwrap(),
            "[[folder/Deep|deep]]\n"
        );
    }

    #[test]
    fn test_translation_table() {
        let (_dir, vault) = vault_with(&[("a.md", "# Alpha\n"), ("b.md", "plain\n")]);
        let documents = vault.list_documents().unwrap();
        let table = TranslationTable::build(&vault, &documents);

        assert_eq!(
            table.moves().collect::<Vec<_>>(),
            vec![(Path::new("a.md"), Path::new("Alpha.md"))]
        );
    }
}
