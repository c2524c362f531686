//! URL handling module for Medusa
//!
//! This module turns raw link targets into canonical document identities and
//! decides which links point back at the mirrored HedgeDoc server.

mod canonical;
mod identity;
mod origin;

// Re-export main functions
pub use canonical::clean_url;
pub use identity::{identity_from_url, DocumentId};
pub use origin::{is_same_origin, origin_of};

use ::url::Url;

/// Base used to resolve relative links when only their path matters
const RELATIVE_BASE: &str = "http://relative.invalid/";

/// Classifies how a raw link target has to be interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ParsedTarget {
    /// Target carries its own scheme and authority
    Absolute(Url),
    /// Target is relative to the server it was found on
    Relative(Url),
}

/// Parses a raw link target, resolving relative targets against a placeholder base
pub(crate) fn parse_target(raw: &str) -> Result<ParsedTarget, ::url::ParseError> {
    match Url::parse(raw) {
        Ok(url) => Ok(ParsedTarget::Absolute(url)),
        Err(::url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse(RELATIVE_BASE)?;
            base.join(raw).map(ParsedTarget::Relative)
        }
        Err(e) => Err(e),
    }
}
