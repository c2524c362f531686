use crate::document::render::render_inlines;
use crate::document::tree::{DocumentTree, LinkNode};
use crate::url::{clean_url, identity_from_url, is_same_origin, origin_of, DocumentId};
use crate::UrlResult;

/// Schemes that never address a pad
const NON_DOCUMENT_SCHEMES: &[&str] = &["mailto:", "tel:", "javascript:", "data:"];

/// One hyperlink occurrence inside a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkModel {
    /// Exact source text of the link, the substring a rewrite replaces
    pub raw_text: String,

    /// Anchor text rendered from the parsed inline content
    pub display_text: String,

    /// Link target with query and fragment removed
    pub target_url: String,

    /// Authority of the target, `None` for relative targets
    pub target_origin: Option<String>,

    /// Identity of the document the link points at
    pub target_identity: DocumentId,
}

impl LinkModel {
    /// Builds the link model for a parsed link node
    ///
    /// `source` is the text the tree was parsed from; the node's span is
    /// sliced out of it to recover the raw link text.
    pub fn from_node(node: &LinkNode, source: &str) -> UrlResult<Self> {
        let target_url = clean_url(&node.target);
        let target_identity = identity_from_url(&target_url)?;

        Ok(Self {
            raw_text: source
                .get(node.span.clone())
                .unwrap_or_default()
                .to_string(),
            display_text: render_inlines(&node.content),
            target_origin: origin_of(&target_url),
            target_url,
            target_identity,
        })
    }

    /// Returns true if the link points at a pad on `root`
    pub fn is_same_origin(&self, root: &str) -> bool {
        is_same_origin(&self.target_url, root)
    }
}

/// Collects every document link of a parsed tree in document order
///
/// Duplicates are preserved. Targets that cannot address a pad (`mailto:`,
/// fragment-only anchors, ...) are left out, and malformed targets are
/// skipped without aborting the rest of the extraction.
pub fn extract_links(tree: &DocumentTree, source: &str) -> Vec<LinkModel> {
    let mut links = Vec::with_capacity(tree.links.len());

    for node in &tree.links {
        if !is_document_target(&node.target) {
            tracing::trace!("Skipping non-document link target {:?}", node.target);
            continue;
        }

        match LinkModel::from_node(node, source) {
            Ok(link) => links.push(link),
            Err(e) => tracing::debug!("Skipping link {:?}: {}", node.target, e),
        }
    }

    links
}

/// Returns false for link targets that can never name a pad
fn is_document_target(target: &str) -> bool {
    let target = target.trim();

    if target.is_empty() || target.starts_with('#') {
        return false;
    }

    let lowercase = target.to_ascii_lowercase();
    !NON_DOCUMENT_SCHEMES
        .iter()
        .any(|scheme| lowercase.starts_with(scheme))
}
