//! Markdown parsing into a small document tree
//!
//! Only the parts of a pad that matter for mirroring are kept: front matter
//! metadata, top-level headings and every hyperlink with its source span.

use crate::document::frontmatter::{split_front_matter, Metadata};
use crate::ParseError;
use pulldown_cmark::{Event, HeadingLevel, LinkType, Options, Parser, Tag};
use std::ops::Range;

/// Inline content of a heading or link text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Code(String),
    Html(String),
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Strikethrough(Vec<Inline>),
    Link {
        content: Vec<Inline>,
        target: String,
    },
    Image {
        alt: Vec<Inline>,
        target: String,
    },
    SoftBreak,
    HardBreak,
}

/// Attributes of a hyperlink that are not part of its text or target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkAttributes {
    /// Optional link title (`[text](url "title")`)
    pub title: String,
    pub kind: LinkKind,
}

/// Source syntax a hyperlink was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// `[text](url)`
    Inline,
    /// `[text][label]`, `[text][]` or `[text]`
    Reference,
    /// `<https://...>`
    Autolink,
}

/// One hyperlink node of the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkNode {
    pub attributes: LinkAttributes,
    pub content: Vec<Inline>,
    pub target: String,
    /// Byte range of the link's source text in the parsed input
    pub span: Range<usize>,
}

/// A heading block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    pub content: Vec<Inline>,
}

/// Parsed representation of a pad
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentTree {
    pub metadata: Metadata,
    /// Headings that are not nested in lists, quotes or footnotes, in order
    pub headings: Vec<Heading>,
    /// Every hyperlink in document order, duplicates included
    pub links: Vec<LinkNode>,
}

impl DocumentTree {
    /// The first rank-1 top-level heading, if any
    pub fn first_title_heading(&self) -> Option<&Heading> {
        self.headings.iter().find(|h| h.level == 1)
    }
}

/// Parses pad text into a document tree
///
/// # Errors
///
/// `ParseError::FrontMatter` if the pad starts with a malformed YAML block.
pub fn parse(text: &str) -> Result<DocumentTree, ParseError> {
    let (metadata, body_offset) = match split_front_matter(text)? {
        Some(front_matter) => (front_matter.fields, front_matter.body_offset),
        None => (Metadata::new(), 0),
    };

    let body = &text[body_offset..];
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;
    let mut builder = TreeBuilder::new(body_offset);

    for (event, range) in Parser::new_ext(body, options).into_offset_iter() {
        builder.push(event, range, text);
    }

    Ok(DocumentTree {
        metadata,
        headings: builder.headings,
        links: builder.links,
    })
}

enum FrameKind {
    Heading(u8),
    Emphasis,
    Strong,
    Strikethrough,
    Link {
        attributes: LinkAttributes,
        target: String,
        span: Range<usize>,
    },
    Image {
        target: String,
    },
}

struct Frame {
    kind: FrameKind,
    content: Vec<Inline>,
}

/// Folds the flat pulldown event stream into headings and links
struct TreeBuilder {
    offset: usize,
    containers: usize,
    stack: Vec<Frame>,
    headings: Vec<Heading>,
    links: Vec<LinkNode>,
}

impl TreeBuilder {
    fn new(offset: usize) -> Self {
        Self {
            offset,
            containers: 0,
            stack: Vec::new(),
            headings: Vec::new(),
            links: Vec::new(),
        }
    }

    fn push(&mut self, event: Event<'_>, range: Range<usize>, text: &str) {
        match event {
            Event::Start(tag) => self.start(tag, range),
            Event::End(tag) => self.end(tag, text),
            Event::Text(t) => self.inline(Inline::Text(t.to_string())),
            Event::Code(c) => self.inline(Inline::Code(c.to_string())),
            Event::Html(h) => self.inline(Inline::Html(h.to_string())),
            Event::SoftBreak => self.inline(Inline::SoftBreak),
            Event::HardBreak => self.inline(Inline::HardBreak),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>, range: Range<usize>) {
        let kind = match tag {
            Tag::BlockQuote | Tag::List(_) | Tag::Item | Tag::FootnoteDefinition(_) => {
                self.containers += 1;
                return;
            }
            Tag::Heading(level, _, _) => FrameKind::Heading(heading_rank(level)),
            Tag::Emphasis => FrameKind::Emphasis,
            Tag::Strong => FrameKind::Strong,
            Tag::Strikethrough => FrameKind::Strikethrough,
            Tag::Link(link_type, dest, title) => {
                let Some(kind) = link_kind(link_type) else {
                    // Email autolinks are never pad links; keep their text only
                    return;
                };
                FrameKind::Link {
                    attributes: LinkAttributes {
                        title: title.to_string(),
                        kind,
                    },
                    target: dest.to_string(),
                    span: (range.start + self.offset)..(range.end + self.offset),
                }
            }
            Tag::Image(_, dest, _) => FrameKind::Image {
                target: dest.to_string(),
            },
            _ => return,
        };

        self.stack.push(Frame {
            kind,
            content: Vec::new(),
        });
    }

    fn end(&mut self, tag: Tag<'_>, text: &str) {
        match tag {
            Tag::BlockQuote | Tag::List(_) | Tag::Item | Tag::FootnoteDefinition(_) => {
                self.containers = self.containers.saturating_sub(1);
                return;
            }
            Tag::Link(link_type, _, _) if link_kind(link_type).is_none() => return,
            Tag::Heading(..)
            | Tag::Emphasis
            | Tag::Strong
            | Tag::Strikethrough
            | Tag::Link(..)
            | Tag::Image(..) => {}
            _ => return,
        }

        let Some(frame) = self.stack.pop() else {
            return;
        };

        match frame.kind {
            FrameKind::Heading(level) => {
                if self.containers == 0 {
                    self.headings.push(Heading {
                        level,
                        content: frame.content,
                    });
                }
            }
            FrameKind::Emphasis => self.inline(Inline::Emphasis(frame.content)),
            FrameKind::Strong => self.inline(Inline::Strong(frame.content)),
            FrameKind::Strikethrough => self.inline(Inline::Strikethrough(frame.content)),
            FrameKind::Image { target } => self.inline(Inline::Image {
                alt: frame.content,
                target,
            }),
            FrameKind::Link {
                attributes,
                target,
                span,
            } => {
                let span = clamp_span(span, text);
                self.inline(Inline::Link {
                    content: frame.content.clone(),
                    target: target.clone(),
                });
                self.links.push(LinkNode {
                    attributes,
                    content: frame.content,
                    target,
                    span,
                });
            }
        }
    }

    fn inline(&mut self, inline: Inline) {
        if let Some(frame) = self.stack.last_mut() {
            frame.content.push(inline);
        }
    }
}

fn heading_rank(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn link_kind(link_type: LinkType) -> Option<LinkKind> {
    match link_type {
        LinkType::Inline => Some(LinkKind::Inline),
        LinkType::Reference
        | LinkType::ReferenceUnknown
        | LinkType::Collapsed
        | LinkType::CollapsedUnknown
        | LinkType::Shortcut
        | LinkType::ShortcutUnknown => Some(LinkKind::Reference),
        LinkType::Autolink => Some(LinkKind::Autolink),
        LinkType::Email => None,
    }
}

fn clamp_span(span: Range<usize>, text: &str) -> Range<usize> {
    let end = span.end.min(text.len());
    let start = span.start.min(end);
    start..end
}
