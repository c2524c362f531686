//! The mirror pipeline
//!
//! crawl -> materialize -> convert -> rename (optional)

use crate::config::{load_history, Config};
use crate::convert::{rename_documents, ConversionReport, Converter, RenameReport};
use crate::crawler::{build_http_client, CrawlReport, Crawler, Fetcher, HttpFetcher};
use crate::storage::{open_vault, DocumentStore, MaterializedDocument, Vault};
use crate::url::DocumentId;
use crate::MedusaError;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

/// Everything one mirror run did
#[derive(Debug, Clone, Default)]
pub struct MirrorSummary {
    pub crawl: CrawlReport,
    pub materialized: Vec<MaterializedDocument>,
    pub conversion: ConversionReport,
    /// `None` when renaming is disabled
    pub renames: Option<RenameReport>,
}

/// Opens the configured vault and builds the HTTP fetcher for the server
///
/// The vault is created first, so an unusable output directory fails before
/// any request is made.
fn open(config: &Config) -> Result<(Vault, Arc<dyn Fetcher>), MedusaError> {
    let vault = open_vault(Path::new(&config.vault.path))?;
    let client = build_http_client(&config.fetch)?;
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(client, &config.hedgedoc.root));
    Ok((vault, fetcher))
}

/// Mirrors the configured server into the configured vault
///
/// # Arguments
///
/// * `config` - A validated configuration
///
/// # Returns
///
/// * `Ok(MirrorSummary)` - The run finished; single pad failures are logged
/// * `Err(MedusaError)` - Setup failed (vault, HTTP client) or a pass could not start
///
/// # Example
///
/// ```no_run
/// use medusa::config::Config;
/// use medusa::crawler::mirror;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::for_root("https://md.example.com");
/// let summary = mirror(&config).await?;
/// println!("{} pads mirrored", summary.materialized.len());
/// # Ok(())
/// # }
/// ```
pub async fn mirror(config: &Config) -> Result<MirrorSummary, MedusaError> {
    let (vault, fetcher) = open(config)?;
    mirror_with(config, vault, fetcher).await
}

fn build_crawler(config: &Config, vault: Vault, fetcher: Arc<dyn Fetcher>) -> Result<Crawler, MedusaError> {
    if config.fetch.refresh {
        tracing::info!("Dropping cached downloads");
        vault.clear_cache()?;
    }

    let store = Arc::new(DocumentStore::new(fetcher, vault));
    Ok(Crawler::new(
        store,
        config.hedgedoc.root.as_str(),
        config.fetch.max_concurrent_fetches,
    ))
}

/// Pads the crawl starts from: the start pad plus every pad of the
/// configured history export
fn seeds(config: &Config) -> Result<BTreeSet<DocumentId>, MedusaError> {
    let mut seeds = BTreeSet::from([DocumentId::new(config.hedgedoc.start.as_str())]);
    if let Some(history) = &config.hedgedoc.history {
        let listed = load_history(Path::new(history))?;
        tracing::info!("Seeding crawl with {} pads from {}", listed.len(), history);
        seeds.extend(listed);
    }
    Ok(seeds)
}

/// Runs the pipeline against an explicit vault and fetcher
pub async fn mirror_with(
    config: &Config,
    vault: Vault,
    fetcher: Arc<dyn Fetcher>,
) -> Result<MirrorSummary, MedusaError> {
    let seeds = seeds(config)?;
    let crawler = build_crawler(config, vault.clone(), fetcher)?;

    let crawl = crawler.crawl_from(seeds).await?;
    tracing::info!("Discovered {} pads", crawl.documents.len());
    if !crawl.empty.is_empty() {
        tracing::warn!("{} pads came back empty", crawl.empty.len());
    }

    let materialized = crawler.materialize(&crawl.documents).await;
    let (conversion, renames) = convert_existing(config, &vault)?;

    Ok(MirrorSummary {
        crawl,
        materialized,
        conversion,
        renames,
    })
}

/// Crawls the configured server without writing any vault document
///
/// Raw downloads still land in the vault's cache directory.
pub async fn discover(config: &Config) -> Result<CrawlReport, MedusaError> {
    let seeds = seeds(config)?;
    let (vault, fetcher) = open(config)?;
    build_crawler(config, vault, fetcher)?
        .crawl_from(seeds)
        .await
}

/// Converts links in the documents already in the vault, then renames them
/// if enabled
pub fn convert_existing(
    config: &Config,
    vault: &Vault,
) -> Result<(ConversionReport, Option<RenameReport>), MedusaError> {
    let converter = Converter::new(&config.hedgedoc.root)?;
    let conversion = converter.convert_vault(vault)?;

    let renames = if config.vault.rename {
        Some(rename_documents(vault)?)
    } else {
        None
    };

    Ok((conversion, renames))
}
