use crate::document::frontmatter::scalar_to_string;
use crate::document::render::plain_text;
use crate::document::tree::DocumentTree;
use crate::url::DocumentId;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Runs of characters that are collapsed to a single underscore in heading titles
    static ref SEPARATOR_RUN: Regex = Regex::new(r"[\-~#/\s]+").unwrap();
}

/// Where a resolved title came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleSource {
    /// `title` field of the front matter, used verbatim
    Metadata,
    /// First rank-1 heading, sanitized
    Heading,
    /// No title found; the document identity
    Identity,
}

/// A resolved document title with its provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTitle {
    pub title: String,
    pub source: TitleSource,
}

/// Resolves the title of a document
///
/// Precedence:
/// 1. front matter `title`, rendered to plain text and used verbatim
/// 2. first rank-1 top-level heading, sanitized with [`sanitize_title`]
/// 3. the fallback identity, unsanitized
///
/// Metadata titles are deliberately not sanitized; callers that turn titles
/// into file names must check the [`TitleSource`].
pub fn resolve(tree: &DocumentTree, fallback: &DocumentId) -> ResolvedTitle {
    if let Some(title) = tree
        .metadata
        .get("title")
        .and_then(scalar_to_string)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
    {
        tracing::debug!("Found title {:?} in metadata", title);
        return ResolvedTitle {
            title,
            source: TitleSource::Metadata,
        };
    }

    if let Some(heading) = tree.first_title_heading() {
        let title = sanitize_title(&plain_text(&heading.content));
        if !title.is_empty() {
            tracing::debug!("First heading was {:?}", title);
            return ResolvedTitle {
                title,
                source: TitleSource::Heading,
            };
        }
    }

    tracing::debug!("No title found, using {}", fallback);
    ResolvedTitle {
        title: fallback.to_string(),
        source: TitleSource::Identity,
    }
}

/// Resolves only the title text; see [`resolve`]
pub fn resolve_title(tree: &DocumentTree, fallback: &DocumentId) -> String {
    resolve(tree, fallback).title
}

/// Collapses runs of `-`, `~`, `#`, `/` and whitespace into `_` and trims `_`
pub fn sanitize_title(title: &str) -> String {
    SEPARATOR_RUN
        .replace_all(title, "_")
        .trim_matches('_')
        .to_string()
}
