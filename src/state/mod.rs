//! State module for tracking crawl progress
//!
//! This module provides the bookkeeping of a single crawl.
//!
//! # Components
//!
//! - `CrawlPhase`: Lifecycle of a crawl (idle, running, done)
//! - `CrawlState`: Frontier, in-flight and visited sets plus the expansion trace
//! - `FrontierExpansion`: One recorded growth step of the frontier

mod crawl_state;

// Re-export main types
pub use crawl_state::{CrawlPhase, CrawlState, FrontierExpansion};
