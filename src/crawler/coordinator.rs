//! Crawler coordinator - discovery and materialization
//!
//! This module contains the crawl loop that coordinates:
//! - Handing out frontier batches from the crawl state
//! - Loading pads and extracting their same-server links concurrently
//! - Admitting newly discovered pads after each batch
//! - Writing every discovered pad into the vault

use crate::document::Document;
use crate::state::{CrawlState, FrontierExpansion};
use crate::storage::{DocumentStore, MaterializedDocument};
use crate::url::DocumentId;
use crate::MedusaError;
use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Outcome of a discovery crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Every pad reached from the start pad, including the start pad
    pub documents: BTreeSet<DocumentId>,
    /// Frontier growth, one entry per processed pad
    pub trace: Vec<FrontierExpansion>,
    /// Pads that came back without content (failed download or blank pad)
    pub empty: BTreeSet<DocumentId>,
}

/// What processing one pad produced
struct Discovery {
    identity: DocumentId,
    targets: Vec<DocumentId>,
    empty: bool,
}

/// Breadth-first crawler over one HedgeDoc server
pub struct Crawler {
    store: Arc<DocumentStore>,
    root: String,
    max_concurrent: usize,
}

impl Crawler {
    /// Creates a new crawler
    ///
    /// # Arguments
    ///
    /// * `store` - Where pad contents are loaded from
    /// * `root` - Server origin; links elsewhere are not followed
    /// * `max_concurrent` - Pads processed concurrently per batch (at least 1)
    pub fn new(store: Arc<DocumentStore>, root: impl Into<String>, max_concurrent: usize) -> Self {
        Self {
            store,
            root: root.into(),
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Discovers every pad reachable from `start`
    ///
    /// Each batch is loaded and link-extracted concurrently; the crawl state
    /// is only updated once the whole batch is in, in identity order, so the
    /// result does not depend on which download finished first.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The visited set and the expansion trace
    /// * `Err(MedusaError)` - The crawl state was misused
    pub async fn crawl(&self, start: DocumentId) -> Result<CrawlReport, MedusaError> {
        tracing::info!("Starting crawl at {}/{}", self.root, start);
        self.crawl_from([start]).await
    }

    /// Discovers every pad reachable from any of `seeds`
    pub async fn crawl_from<I>(&self, seeds: I) -> Result<CrawlReport, MedusaError>
    where
        I: IntoIterator<Item = DocumentId>,
    {
        let mut state = CrawlState::new();
        state.seed_all(seeds)?;
        tracing::debug!("Crawl seeded with {} pads", state.frontier().len());
        let mut empty = BTreeSet::new();
        let mut processed = 0usize;

        loop {
            let batch = state.next_batch(self.max_concurrent);
            if batch.is_empty() {
                tracing::info!("Frontier is empty, crawl complete");
                break;
            }

            let mut discoveries: Vec<Discovery> = stream::iter(batch)
                .map(|id| self.discover(id))
                .buffer_unordered(self.max_concurrent)
                .collect()
                .await;
            discoveries.sort_by(|a, b| a.identity.cmp(&b.identity));

            for discovery in discoveries {
                if discovery.empty {
                    empty.insert(discovery.identity.clone());
                }
                state.complete(discovery.identity, discovery.targets);
                processed += 1;
            }

            tracing::info!(
                "Progress: {} pads processed, {} in frontier",
                processed,
                state.frontier().len()
            );
        }

        state.finish()?;
        let (documents, trace) = state.into_parts();
        Ok(CrawlReport {
            documents,
            trace,
            empty,
        })
    }

    /// Loads one pad and collects the identities it links to
    async fn discover(&self, identity: DocumentId) -> Discovery {
        let document = Document::new(identity, self.root.clone());
        let empty = document.load(&self.store).await.is_empty();

        let targets = document
            .outgoing_links()
            .unwrap_or_default()
            .iter()
            .map(|link| link.target_identity.clone())
            .collect();

        Discovery {
            identity: document.identity().clone(),
            targets,
            empty,
        }
    }

    /// Writes a fresh copy of every given pad into the vault
    ///
    /// A pad that cannot be written is logged and left out of the result;
    /// the others are still written.
    pub async fn materialize(&self, documents: &BTreeSet<DocumentId>) -> Vec<MaterializedDocument> {
        let mut written: Vec<MaterializedDocument> = stream::iter(documents.iter())
            .map(|id| async move {
                match self.store.materialize(id).await {
                    Ok(doc) => Some(doc),
                    Err(e) => {
                        tracing::error!("Failed to materialize {}: {}", id, e);
                        None
                    }
                }
            })
            .buffer_unordered(self.max_concurrent)
            .filter_map(|doc| async move { doc })
            .collect()
            .await;
        written.sort_by(|a, b| a.identity.cmp(&b.identity));

        for doc in &written {
            tracing::debug!("{} sha256={}", doc.identity, doc.checksum);
        }
        tracing::info!("Materialized {} of {} pads", written.len(), documents.len());
        written
    }
}
