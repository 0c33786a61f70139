//! Type-specific content for overlay elements, guarded by a raw-content fingerprint.

use std::collections::HashMap;

use crate::{
    foundation::math::Fnv1a64,
    render::backend::ElementContent,
    scene::model::NodeContent,
};

pub const DEFAULT_TABLE_DELIMITER: &str = ";";

/// Turns authored text (possibly with embedded math) into markup.
pub trait MarkupRenderer {
    fn render(&self, raw: &str) -> String;
}

impl<F> MarkupRenderer for F
where
    F: Fn(&str) -> String,
{
    fn render(&self, raw: &str) -> String {
        self(raw)
    }
}

/// Escapes text and keeps line breaks.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainText;

impl MarkupRenderer for PlainText {
    fn render(&self, raw: &str) -> String {
        escape_html(raw).replace('\n', "<br>")
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// The raw text a node's content is rendered from, or `None` for content drawn elsewhere.
pub fn content_source(content: &NodeContent) -> Option<String> {
    match content {
        NodeContent::Text { text } => Some(text.clone()),
        NodeContent::Image { src } | NodeContent::HtmlFrame { src } => Some(src.clone()),
        NodeContent::Qr { url } => Some(url.clone()),
        NodeContent::Bullets { items } => Some(items.join("\n")),
        NodeContent::Table { rows, delimiter } => {
            let d = delimiter.as_deref().unwrap_or(DEFAULT_TABLE_DELIMITER);
            Some(
                rows.iter()
                    .map(|r| r.join(d))
                    .collect::<Vec<_>>()
                    .join("\n"),
            )
        }
        NodeContent::Line(_) | NodeContent::Arrow(_) | NodeContent::Unknown => None,
    }
}

pub fn fingerprint(kind: &str, raw: &str) -> u64 {
    let mut h = Fnv1a64::new_default();
    h.write_str(kind);
    h.write_str(raw);
    h.finish()
}

/// Paint the element content for `content`.
pub fn paint(content: &NodeContent, renderer: &dyn MarkupRenderer) -> ElementContent {
    match content {
        NodeContent::Text { text } => ElementContent::Markup {
            html: renderer.render(text),
        },
        NodeContent::Image { src } => ElementContent::Image { src: src.clone() },
        NodeContent::Qr { url } => ElementContent::Markup {
            html: format!(
                r#"<div class="qr" data-url="{}"></div>"#,
                escape_html(url)
            ),
        },
        NodeContent::HtmlFrame { src } => ElementContent::Markup {
            html: format!(
                r#"<iframe src="{}" frameborder="0" allowfullscreen></iframe>"#,
                escape_html(src)
            ),
        },
        NodeContent::Bullets { items } => {
            let mut html = String::from("<ul>");
            for item in items {
                html.push_str("<li>");
                html.push_str(&renderer.render(item));
                html.push_str("</li>");
            }
            html.push_str("</ul>");
            ElementContent::Markup { html }
        }
        NodeContent::Table { rows, delimiter } => ElementContent::Markup {
            html: paint_table(
                rows,
                delimiter.as_deref().unwrap_or(DEFAULT_TABLE_DELIMITER),
                renderer,
            ),
        },
        NodeContent::Line(_) | NodeContent::Arrow(_) | NodeContent::Unknown => {
            ElementContent::Empty
        }
    }
}

/// Rows may be pre-split or single strings joined by `delimiter`; the first row is the header.
fn paint_table(rows: &[Vec<String>], delimiter: &str, renderer: &dyn MarkupRenderer) -> String {
    let mut html = String::from("<table>");
    for (i, row) in rows.iter().enumerate() {
        let cells: Vec<&str> = match row.as_slice() {
            [single] if !delimiter.is_empty() => single.split(delimiter).map(str::trim).collect(),
            _ => row.iter().map(String::as_str).collect(),
        };
        let tag = if i == 0 { "th" } else { "td" };
        html.push_str("<tr>");
        for cell in cells {
            html.push_str(&format!("<{tag}>{}</{tag}>", renderer.render(cell)));
        }
        html.push_str("</tr>");
    }
    html.push_str("</table>");
    html
}

/// Last content fingerprint written per node id.
#[derive(Debug, Default)]
pub struct ContentCache {
    fingerprints: HashMap<String, u64>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_current(&self, id: &str, fingerprint: u64) -> bool {
        self.fingerprints.get(id) == Some(&fingerprint)
    }

    pub fn record(&mut self, id: &str, fingerprint: u64) {
        self.fingerprints.insert(id.to_string(), fingerprint);
    }

    pub fn forget(&mut self, id: &str) {
        self.fingerprints.remove(id);
    }
}
