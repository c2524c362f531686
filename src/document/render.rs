use crate::document::tree::Inline;

/// Renders inline content back to markdown, keeping nested formatting
///
/// Used for link display text so `[**bold** text](...)` keeps its emphasis
/// when it becomes `[[target|**bold** text]]`.
pub fn render_inlines(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        render_markdown(inline, &mut out);
    }
    out.trim().to_string()
}

/// Renders inline content as plain text, dropping all markup
pub fn plain_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        render_plain(inline, &mut out);
    }
    out.trim().to_string()
}

fn render_markdown(inline: &Inline, out: &mut String) {
    match inline {
        Inline::Text(text) | Inline::Html(text) => out.push_str(text),
        Inline::Code(code) => {
            out.push('`');
            out.push_str(code);
            out.push('`');
        }
        Inline::Emphasis(children) => wrap_markdown(children, "*", out),
        Inline::Strong(children) => wrap_markdown(children, "**", out),
        Inline::Strikethrough(children) => wrap_markdown(children, "~~", out),
        Inline::Link { content, target } => {
            out.push('[');
            content.iter().for_each(|c| render_markdown(c, out));
            out.push_str("](");
            out.push_str(target);
            out.push(')');
        }
        Inline::Image { alt, target } => {
            out.push_str("![");
            alt.iter().for_each(|c| render_markdown(c, out));
            out.push_str("](");
            out.push_str(target);
            out.push(')');
        }
        Inline::SoftBreak | Inline::HardBreak => out.push(' '),
    }
}

fn wrap_markdown(children: &[Inline], marker: &str, out: &mut String) {
    out.push_str(marker);
    children.iter().for_each(|c| render_markdown(c, out));
    out.push_str(marker);
}

fn render_plain(inline: &Inline, out: &mut String) {
    match inline {
        Inline::Text(text) | Inline::Code(text) => out.push_str(text),
        Inline::Html(_) => {}
        Inline::Emphasis(children) | Inline::Strong(children) | Inline::Strikethrough(children) => {
            children.iter().for_each(|c| render_plain(c, out))
        }
        Inline::Link { content, .. } => content.iter().for_each(|c| render_plain(c, out)),
        Inline::Image { alt, .. } => alt.iter().for_each(|c| render_plain(c, out)),
        Inline::SoftBreak | Inline::HardBreak => out.push(' '),
    }
}
