//! Crawler module for pad discovery and mirroring
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching of pad sources
//! - Breadth-first discovery with bounded concurrency
//! - Writing discovered pads into the vault
//! - The full mirror pipeline (crawl, materialize, convert, rename)

mod coordinator;
mod fetcher;
mod mirror;
#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::{CrawlReport, Crawler};
pub use fetcher::{build_http_client, fetch_url, FetchResult, Fetcher, HttpFetcher};
pub use mirror::{convert_existing, discover, mirror, mirror_with, MirrorSummary};
