use crate::url::{clean_url, DocumentId};
use crate::ConfigError;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// One entry of a HedgeDoc `history.json` export
///
/// The export carries more fields (`text`, `time`, `tags`, `pinned`); only
/// the pad id matters here.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub id: Option<String>,
}

/// Reads the pad identities listed in a history export
///
/// Entries without an id, or whose id is empty once query and fragment are
/// stripped, are skipped.
///
/// # Errors
///
/// `ConfigError::Io` if the file cannot be read, `ConfigError::History` if
/// it is not a JSON array of entries.
pub fn load_history(path: &Path) -> Result<BTreeSet<DocumentId>, ConfigError> {
    let contents = fs::read_to_string(path)?;
    parse_history(&contents)
}

/// Parses the contents of a history export, see [`load_history`]
pub fn parse_history(contents: &str) -> Result<BTreeSet<DocumentId>, ConfigError> {
    let entries: Vec<HistoryEntry> = serde_json::from_str(contents)?;
    let total = entries.len();

    let ids: BTreeSet<DocumentId> = entries
        .into_iter()
        .filter_map(|entry| entry.id)
        .map(|id| DocumentId::new(clean_url(id.trim().trim_start_matches('/'))))
        .filter(|id| !id.is_empty())
        .collect();

    if ids.len() < total {
        tracing::debug!("{} history entries were skipped or repeated", total - ids.len());
    }
    Ok(ids)
}
