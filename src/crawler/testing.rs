//! In-memory fetcher for unit tests

use crate::crawler::{FetchResult, Fetcher};
use crate::url::DocumentId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Serves pads from a map and counts every request
#[derive(Debug, Default)]
pub(crate) struct MemoryFetcher {
    pads: HashMap<DocumentId, String>,
    calls: Mutex<HashMap<DocumentId, usize>>,
}

impl MemoryFetcher {
    pub(crate) fn new<'a>(pads: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            pads: pads
                .into_iter()
                .map(|(id, content)| (DocumentId::new(id), content.to_string()))
                .collect(),
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn calls(&self, id: &DocumentId) -> usize {
        self.calls.lock().unwrap().get(id).copied().unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Fetcher for MemoryFetcher {
    async fn fetch(&self, id: &DocumentId) -> FetchResult {
        *self.calls.lock().unwrap().entry(id.clone()).or_insert(0) += 1;
        match self.pads.get(id) {
            Some(content) => FetchResult::Found {
                content: content.clone(),
            },
            None => FetchResult::Missing { status_code: 404 },
        }
    }
}
