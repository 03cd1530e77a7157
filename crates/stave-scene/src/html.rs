//! HTML serialization of a document.

use crate::document::{Document, NodeData, NodeId};

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

/// Write comment text so it cannot close the comment early.
///
/// Consecutive dashes get a space between them, and a leading `>` or `->`
/// or a trailing `-` is padded.
fn escape_comment(text: &str, out: &mut String) {
    if text.starts_with('>') || text.starts_with("->") {
        out.push(' ');
    }
    let mut previous = None;
    for c in text.chars() {
        if c == '-' && previous == Some('-') {
            out.push(' ');
        }
        out.push(c);
        previous = Some(c);
    }
    if previous == Some('-') {
        out.push(' ');
    }
}

impl Document {
    /// Serialize `id` and its subtree.
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Serialize the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_node(child, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let Some(data) = self.get(id) else {
            return;
        };

        match data {
            NodeData::Fragment => {
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
            }
            NodeData::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_attribute(value, out);
                    out.push('"');
                }
                out.push('>');

                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
            NodeData::Text(text) => escape_text(text, out),
            NodeData::Comment(text) => {
                out.push_str("<!--");
                escape_comment(text, out);
                out.push_str("-->");
            }
            NodeData::RawMarkup(html) => out.push_str(html),
        }
    }
}
