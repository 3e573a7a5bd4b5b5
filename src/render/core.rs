use std::io::Write;

use crate::dom::{Document, NodeId, NodeKind};
use crate::error::Result;

const INDENT: usize = 2;

/// Markup output parameters.
#[derive(Debug, Clone, Default)]
pub struct RendererSettings {
    /// Emit one node per line, indented two spaces per level.
    pub pretty: bool,
}

/// Serializes document subtrees as HTML-like markup.
#[derive(Debug, Clone, Default)]
pub struct MarkupRenderer {
    settings: RendererSettings,
}

impl MarkupRenderer {
    pub fn new(settings: RendererSettings) -> Self {
        Self { settings }
    }

    pub fn with_default() -> Self {
        Self::new(RendererSettings::default())
    }

    pub fn pretty() -> Self {
        Self::new(RendererSettings { pretty: true })
    }

    pub fn render(&self, writer: &mut impl Write, document: &Document) -> Result<()> {
        let markup = self.document_markup(document);
        writer.write_all(markup.as_bytes())?;
        if self.settings.pretty && !markup.is_empty() {
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn document_markup(&self, document: &Document) -> String {
        let root = document.root();
        let mut out = String::new();
        if let Some(node) = document.node(root) {
            for child in node.children() {
                self.write_node(document, *child, 0, &mut out);
            }
        }
        self.finish(out)
    }

    fn finish(&self, out: String) -> String {
        if self.settings.pretty {
            out.trim_end().to_string()
        } else {
            out
        }
    }

    fn write_node(&self, document: &Document, id: NodeId, depth: usize, out: &mut String) {
        let Some(node) = document.node(id) else {
            return;
        };
        let pad = if self.settings.pretty {
            " ".repeat(depth * INDENT)
        } else {
            String::new()
        };
        match node.kind() {
            NodeKind::Text(text) => {
                out.push_str(&pad);
                out.push_str(&escape(text));
                self.newline(out);
            }
            NodeKind::Element { tag, attrs } => {
                out.push_str(&pad);
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push_str(&format!(" {}=\"{}\"", name, escape(value)));
                }
                out.push('>');
                if !node.children().is_empty() {
                    self.newline(out);
                    for child in node.children() {
                        self.write_node(document, *child, depth + 1, out);
                    }
                    out.push_str(&pad);
                }
                out.push_str(&format!("</{}>", tag));
                self.newline(out);
            }
        }
    }

    fn newline(&self, out: &mut String) {
        if self.settings.pretty {
            out.push('\n');
        }
    }
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        doc.set_attr(div, "class", "a b").unwrap();
        doc.set_attr(div, "data-x", "1").unwrap();
        let span = doc.create_element("span");
        let text = doc.create_text("x < y & z");
        doc.append_child(span, text).unwrap();
        doc.append_child(div, span).unwrap();
        doc.append_child(doc.root(), div).unwrap();
        doc
    }

    #[test]
    fn compact_markup_escapes_and_orders_attributes() {
        let markup = MarkupRenderer::with_default().document_markup(&sample());
        assert_eq!(
            markup,
            "<div class=\"a b\" data-x=\"1\"><span>x &lt; y &amp; z</span></div>"
        );
    }

    #[test]
    fn pretty_markup_indents_children() {
        let markup = MarkupRenderer::pretty().document_markup(&sample());
        let lines: Vec<_> = markup.lines().collect();
        assert_eq!(lines[0], "<div class=\"a b\" data-x=\"1\">");
        assert_eq!(lines[1], "  <span>");
        assert_eq!(lines[2], "    x &lt; y &amp; z");
        assert_eq!(lines.last().copied(), Some("</div>"));
    }

    #[test]
    fn render_writes_to_writer() {
        let mut buffer = Vec::new();
        MarkupRenderer::with_default()
            .render(&mut buffer, &sample())
            .unwrap();
        assert!(String::from_utf8(buffer).unwrap().starts_with("<div"));
    }
}
