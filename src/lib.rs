//! Medusa: a local mirror of your HedgeDoc, inside a wiki vault
//!
//! This crate crawls a HedgeDoc pad server starting from one seed pad, follows
//! every link that points back at the same server, stores each pad as a
//! markdown file exactly once and rewrites the server links into local
//! `[[identity|text]]` wiki links.

pub mod config;
pub mod convert;
pub mod crawler;
pub mod document;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Medusa operations
#[derive(Debug, Error)]
pub enum MedusaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Markdown parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Invalid link pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Failed to parse history export: {0}")]
    History(#[from] serde_json::Error),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Errors raised while reading a pad into a document tree
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Malformed front matter: {0}")]
    FrontMatter(String),
}

/// Result type alias for Medusa operations
pub type Result<T> = std::result::Result<T, MedusaError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use document::{Document, LinkModel};
pub use state::{CrawlPhase, CrawlState};
pub use url::{clean_url, identity_from_url, is_same_origin, DocumentId};
