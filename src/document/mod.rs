//! Pad documents: parsing, link extraction and title resolution
//!
//! A [`Document`] is created as soon as its identity is known. Its content is
//! loaded on demand, and title and outgoing links are derived from that
//! content exactly once.

mod frontmatter;
mod links;
mod render;
mod title;
mod tree;

pub use frontmatter::{split_front_matter, FrontMatter, Metadata};
pub use links::{extract_links, LinkModel};
pub use render::{plain_text, render_inlines};
pub use title::{resolve, resolve_title, sanitize_title, ResolvedTitle, TitleSource};
pub use tree::{parse, DocumentTree, Heading, Inline, LinkAttributes, LinkKind, LinkNode};

use crate::storage::DocumentStore;
use crate::url::DocumentId;
use std::path::PathBuf;
use std::sync::OnceLock;
use tokio::sync::OnceCell;

/// One pad on the server
///
/// All derived fields are memoized: once set they never change. Reading a
/// fresh copy of the pad means constructing a new `Document`.
#[derive(Debug)]
pub struct Document {
    identity: DocumentId,
    root: String,
    raw_content: OnceCell<String>,
    tree: OnceLock<Option<DocumentTree>>,
    title: OnceLock<ResolvedTitle>,
    outgoing_links: OnceLock<Vec<LinkModel>>,
}

impl Document {
    /// Creates a document whose content is not loaded yet
    ///
    /// `root` is the server origin used to decide which links are internal.
    pub fn new(identity: DocumentId, root: impl Into<String>) -> Self {
        Self {
            identity,
            root: root.into(),
            raw_content: OnceCell::new(),
            tree: OnceLock::new(),
            title: OnceLock::new(),
            outgoing_links: OnceLock::new(),
        }
    }

    /// Creates a document from content that is already at hand
    pub fn with_content(identity: DocumentId, root: impl Into<String>, content: String) -> Self {
        Self {
            raw_content: OnceCell::from(content),
            ..Self::new(identity, root)
        }
    }

    pub fn identity(&self) -> &DocumentId {
        &self.identity
    }

    /// Loads the content through the store on first use and returns it
    pub async fn load(&self, store: &DocumentStore) -> &str {
        self.raw_content
            .get_or_init(|| store.get(&self.identity, false))
            .await
            .as_str()
    }

    /// The content, if it was loaded
    pub fn content(&self) -> Option<&str> {
        self.raw_content.get().map(String::as_str)
    }

    /// The parsed tree; `None` before loading or if the content failed to parse
    pub fn tree(&self) -> Option<&DocumentTree> {
        let content = self.content()?;
        self.tree
            .get_or_init(|| match parse(content) {
                Ok(tree) => Some(tree),
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse {}, treating it as having no links: {}",
                        self.identity,
                        e
                    );
                    None
                }
            })
            .as_ref()
    }

    /// The resolved title with its source; `None` before loading
    pub fn resolved_title(&self) -> Option<&ResolvedTitle> {
        self.content()?;
        Some(self.title.get_or_init(|| match self.tree() {
            Some(tree) => resolve(tree, &self.identity),
            None => ResolvedTitle {
                title: self.identity.to_string(),
                source: TitleSource::Identity,
            },
        }))
    }

    pub fn title(&self) -> Option<&str> {
        self.resolved_title().map(|t| t.title.as_str())
    }

    /// File name the rename pass gives this document (`{title}.md`)
    pub fn filename(&self) -> Option<PathBuf> {
        self.title().map(|title| PathBuf::from(format!("{}.md", title)))
    }

    /// Links from this document to pads on the same server, in document order
    pub fn outgoing_links(&self) -> Option<&[LinkModel]> {
        let content = self.content()?;
        let links = self.outgoing_links.get_or_init(|| {
            let Some(tree) = self.tree() else {
                return Vec::new();
            };
            extract_links(tree, content)
                .into_iter()
                .filter(|link| {
                    let internal = link.is_same_origin(&self.root);
                    if !internal {
                        tracing::trace!("{} is an external url", link.target_url);
                    }
                    internal
                })
                .collect()
        });
        Some(links.as_slice())
    }
}
