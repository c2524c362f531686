//! Configuration module for Medusa
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use medusa::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("medusa.toml")).unwrap();
//! println!("Crawl starts at: {}", config.hedgedoc.start);
//! ```

mod history;
mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetchConfig, HedgedocConfig, VaultConfig};

// Re-export parser functions
pub use history::{load_history, parse_history, HistoryEntry};
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
