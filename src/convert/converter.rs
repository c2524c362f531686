use crate::document::{Document, LinkModel};
use crate::storage::{StorageResult, Vault};
use crate::url::{clean_url, DocumentId};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

/// Characters a pad path may contain inside a server link
const PAD_CHARS: &str = r"[A-Za-z0-9\-_.#?/%]";

/// Totals of a vault conversion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionReport {
    /// Documents read
    pub documents: usize,
    /// Server links found across all documents
    pub links: usize,
    /// Documents that could not be read or written back
    pub failed: usize,
}

/// Rewrites markdown links to one HedgeDoc server into wiki links
#[derive(Debug, Clone)]
pub struct Converter {
    root: String,
    pattern: Regex,
}

impl Converter {
    /// Builds the link pattern for `root`
    ///
    /// Link text may contain one level of balanced brackets so that
    /// `[see [1]](ROOT/pad)` is matched as a whole; the root is matched
    /// literally, ignoring case like host names do.
    pub fn new(root: &str) -> Result<Self, regex::Error> {
        let root = root.trim().trim_end_matches('/').to_string();
        let pattern = Regex::new(&format!(
            r"\[(?P<text>(?:[^\[\]\n]|\[[^\[\]\n]*\])+)\]\((?P<url>(?i:{}))/(?P<pad>{}*)\)",
            regex::escape(&root),
            PAD_CHARS
        ))?;
        Ok(Self { root, pattern })
    }

    /// Converts every server link of `text`
    ///
    /// Each match `[text](ROOT/pad?query#fragment)` becomes `[[pad|text]]`,
    /// replacing every literal occurrence of the matched link. Returns the
    /// converted text and the number of matches found.
    pub fn convert_document(&self, text: &str) -> (String, usize) {
        let matches: Vec<(String, String, String)> = self
            .pattern
            .captures_iter(text)
            .map(|caps| {
                (
                    caps[0].to_string(),
                    caps["text"].to_string(),
                    caps["pad"].to_string(),
                )
            })
            .collect();

        let mut converted = text.to_string();
        for (link, link_text, pad) in &matches {
            let identity = DocumentId::new(clean_url(pad));
            if identity.is_empty() {
                tracing::debug!("Leaving link to the server root as is: {}", link);
                continue;
            }
            if !converted.contains(link.as_str()) {
                tracing::debug!("{} was already converted", link);
                continue;
            }

            let replacement = format!("[[{}|{}]]", identity, link_text);
            converted = converted.replace(link.as_str(), &replacement);
        }

        (converted, matches.len())
    }

    /// Converts the server links the pattern cannot see
    ///
    /// Relative targets (`[x](/pad)`), autolinks and reference links are
    /// taken from the parsed document and rewritten to `[[identity|text]]`.
    /// Links to the server root are left alone. Returns the converted text
    /// and the number of links rewritten.
    pub fn convert_parsed_links(&self, relative: &Path, text: &str) -> (String, usize) {
        let identity =
            DocumentId::from_file_path(relative).unwrap_or_else(|| DocumentId::new(""));
        let document = Document::with_content(identity, self.root.as_str(), text.to_string());

        let links: Vec<LinkModel> = document
            .outgoing_links()
            .unwrap_or_default()
            .iter()
            .filter(|link| !link.target_identity.is_empty())
            .cloned()
            .collect();
        if links.is_empty() {
            return (text.to_string(), 0);
        }

        (rewrite_links(text, &links, DocumentId::to_string), links.len())
    }

    /// Converts every document of the vault in place
    ///
    /// Only documents whose text changed are written back. A document that
    /// fails to read or write is logged and counted, the rest continue.
    pub fn convert_vault(&self, vault: &Vault) -> StorageResult<ConversionReport> {
        let mut report = ConversionReport::default();

        for relative in vault.list_documents()? {
            report.documents += 1;

            let text = match vault.read(&relative) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!("Failed to read {}: {}", relative.display(), e);
                    report.failed += 1;
                    continue;
                }
            };

            let (converted, links) = self.convert_document(&text);
            let (converted, parsed_links) = self.convert_parsed_links(&relative, &converted);
            let links = links + parsed_links;
            report.links += links;
            if converted == text {
                continue;
            }

            match vault.write(&relative, &converted) {
                Ok(_) => tracing::debug!("Converted {} links in {}", links, relative.display()),
                Err(e) => {
                    tracing::error!("Failed to write {}: {}", relative.display(), e);
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            "Converted {} links in {} documents",
            report.links,
            report.documents
        );
        Ok(report)
    }
}

/// Converts the server links of one document
///
/// # Example
///
/// ```
/// use medusa::convert::convert_document;
///
/// let (text, count) = convert_document(
///     "See [Navigation](https://md.example.com/navigation) for more.",
///     "https://md.example.com",
/// )
/// .unwrap();
/// assert_eq!(text, "See [[navigation|Navigation]] for more.");
/// assert_eq!(count, 1);
/// ```
pub fn convert_document(text: &str, root: &str) -> Result<(String, usize), regex::Error> {
    Ok(Converter::new(root)?.convert_document(text))
}

/// Rewrites parsed links into `[[title|display text]]`
///
/// Unlike [`Converter::convert_document`] this works from the links a
/// document's tree yielded, so it handles relative targets and any link
/// syntax the parser understands. `title_of` names the target of each link.
/// Every occurrence of a link's raw text is replaced; raw text that cannot
/// be found in `text` is reported and skipped.
pub fn rewrite_links<F>(text: &str, links: &[LinkModel], title_of: F) -> String
where
    F: Fn(&DocumentId) -> String,
{
    let mut rewritten = text.to_string();
    let mut done: HashSet<&str> = HashSet::new();

    for link in links {
        if done.contains(link.raw_text.as_str()) {
            continue;
        }
        if link.raw_text.is_empty() || !rewritten.contains(link.raw_text.as_str()) {
            tracing::error!(
                "Link to {} not found verbatim in the document, leaving it unchanged",
                link.target_identity
            );
            continue;
        }

        let replacement = format!(
            "[[{}|{}]]",
            title_of(&link.target_identity),
            link.display_text
        );
        rewritten = rewritten.replace(link.raw_text.as_str(), &replacement);
        done.insert(link.raw_text.as_str());
    }

    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use std::path::Path;

    const ROOT: &str = "https://md.example.com";

    fn convert(text: &str) -> (String, usize) {
        Converter::new(ROOT).unwrap().convert_document(text)
    }

    #[test]
    fn test_converts_server_link() {
        assert_eq!(
            convert("See [Navigation](https://md.example.com/navigation) for more."),
            ("See [[navigation|Navigation]] for more.".to_string(), 1)
        );
    }

    #[test]
    fn test_query_and_fragment_are_dropped() {
        assert_eq!(
            convert("[Page](https://md.example.com/page?foo=bar)").0,
            "[[page|Page]]"
        );
        assert_eq!(
            convert("[Page](https://md.example.com/page#section)").0,
            "[[page|Page]]"
        );
        assert_eq!(
            convert("[Page](https://md.example.com/page?both#x)").0,
            "[[page|Page]]"
        );
    }

    #[test]
    fn test_foreign_links_are_untouched() {
        let text = "[Other](https://other.example/page) and [Sub](https://sub.md.example.com/x)";
        assert_eq!(convert(text), (text.to_string(), 0));
    }

    #[test]
    fn test_root_is_matched_literally() {
        // an unescaped '.' would match any character here
        let text = "[x](https://mdXexample.com/pad)";
        assert_eq!(convert(text).1, 0);
    }

    #[test]
    fn test_root_host_ignores_case() {
        let (text, count) = convert("[x](https://MD.Example.com/pad)");
        assert_eq!(text, "[[pad|x]]");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_root_with_port() {
        let converter = Converter::new("http://127.0.0.1:3000/").unwrap();
        let (text, count) = converter.convert_document("[a](http://127.0.0.1:3000/a)");
        assert_eq!(text, "[[a|a]]");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_nested_path_and_encoding_are_kept() {
        assert_eq!(
            convert("[Deep](https://md.example.com/folder/My%20Pad)").0,
            "[[folder/My%20Pad|Deep]]"
        );
    }

    #[test]
    fn test_link_text_with_markup_and_brackets() {
        assert_eq!(
            convert("[**Bold** and [1]](https://md.example.com/p)").0,
            "[[p|**Bold** and [1]]]"
        );
    }

    #[test]
    fn test_two_links_on_one_line() {
        let (text, count) =
            convert("[A](https://md.example.com/a) | [B](https://md.example.com/b)");
        assert_eq!(text, "[[a|A]] | [[b|B]]");
        assert_eq!(count, 2);
    }

    #[test]
    fn test_duplicate_links_are_counted_and_replaced() {
        let (text, count) =
            convert("[A](https://md.example.com/a)\n\n[A](https://md.example.com/a)");
        assert_eq!(text, "[[a|A]]\n\n[[a|A]]");
        assert_eq!(count, 2);
    }

    #[test]
    fn test_link_to_server_root_is_left_alone() {
        let text = "[Home](https://md.example.com/)";
        assert_eq!(convert(text).0, text);
    }

    #[test]
    fn test_conversion_is_idempotent() {
        let (once, _) = convert("[A](https://md.example.com/a) text");
        let (twice, count) = convert(&once);
        assert_eq!(once, twice);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_free_function() {
        let (text, count) =
            convert_document("[Navigation](https://md.example.com/navigation)", ROOT).unwrap();
        assert_eq!(text, "[[navigation|Navigation]]");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_convert_vault() {
        let dir = tempfile::tempdir().unwrap();
        let vault = Vault::create(dir.path()).unwrap();
        vault
            .write(Path::new("a.md"), "[B](https://md.example.com/b)")
            .unwrap();
        vault.write(Path::new("b.md"), "no links").unwrap();

        let report = Converter::new(ROOT).unwrap().convert_vault(&vault).unwrap();

        assert_eq!(
            report,
            ConversionReport {
                documents: 2,
                links: 1,
                failed: 0,
            }
        );
        assert_eq!(vault.read(Path::new("a.md")).unwrap(), "[[b|B]]");
        assert_eq!(vault.read(Path::new("b.md")).unwrap(), "no links");
    }

    #[test]
    fn test_convert_vault_handles_links_the_pattern_misses() {
        let dir = tempfile::tempdir().unwrap();
        let vault = Vault::create(dir.path()).unwrap();
        vault
            .write(
                Path::new("p.md"),
                "[rel](/pad?edit), <https://md.example.com/auto>, [ref][r], [home](/)\n\n\
                 [r]: https://md.example.com/refd\n",
            )
            .unwrap();
        let converter = Converter::new(ROOT).unwrap();

        let report = converter.convert_vault(&vault).unwrap();

        assert_eq!(report.links, 3);
        assert_eq!(
            vault.read(Path::new("p.md")).unwrap(),
            "[[pad|rel]], [[auto|https://md.example.com/auto]], [[refd|ref]], [home](/)\n\n\
             [r]: https://md.example.com/refd\n"
        );

        let again = converter.convert_vault(&vault).unwrap();
        assert_eq!(again.links, 0);
    }

    #[test]
    fn test_parsed_links_skip_foreign_and_converted() {
        let converter = Converter::new(ROOT).unwrap();
        let text = "[[a|A]] [out](https://other.example/x) [in](https://md.example.com/in)";
        let (converted, count) = converter.convert_parsed_links(Path::new("p.md"), text);
        assert_eq!(converted, "[[a|A]] [out](https://other.example/x) [[in|in]]");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_rewrite_links_uses_titles() {
        let text = "Go to [the *index*](/index?edit) or [out](https://other.example/x).";
        let doc = Document::with_content(DocumentId::new("pad"), ROOT, text.to_string());
        let links = doc.outgoing_links().unwrap();

        let rewritten = rewrite_links(text, links, |id| format!("Title of {}", id));
        assert_eq!(
            rewritten,
            "Go to [[Title of index|the *index*]] or [out](https://other.example/x)."
        );
    }

    #[test]
    fn test_rewrite_links_handles_duplicates_and_missing_text() {
        let text = "[a](/a) [a](/a)";
        let doc = Document::with_content(DocumentId::new("pad"), ROOT, text.to_string());
        let mut links = doc.outgoing_links().unwrap().to_vec();
        assert_eq!(links.len(), 2);

        let mut stale = links[0].clone();
        stale.raw_text = "[gone](/gone)".to_string();
        links.push(stale);

        let rewritten = rewrite_links(text, &links, |id| id.to_string());
        assert_eq!(rewritten, "[[a|a]] [[a|a]]");
    }
}
