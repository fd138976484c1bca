//! Region markup as terminal text.

use scraper::{ElementRef, Html, Node, Selector};

const BLOCKS: &[&str] = &[
    "article", "br", "div", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "p", "pre", "section", "table", "tr", "ul", "ol",
];

/// Whether the markup is (or contains) the loading placeholder.
pub fn is_loading(html: &str) -> bool {
    let Ok(selector) = Selector::parse("[data-loading]") else {
        return false;
    };
    Html::parse_fragment(html).select(&selector).next().is_some()
}

/// Visible text of `html`, one entry per block-level line.
pub fn text_lines(html: &str) -> Vec<String> {
    let fragment = Html::parse_fragment(html);
    let mut lines = Vec::new();
    let mut current = String::new();
    collect(fragment.root_element(), &mut lines, &mut current);
    flush(&mut lines, &mut current);
    lines
}

fn collect(element: ElementRef<'_>, lines: &mut Vec<String>, current: &mut String) {
    let name = element.value().name();
    if matches!(name, "script" | "style" | "template") {
        return;
    }
    let block = BLOCKS.contains(&name);
    if block {
        flush(lines, current);
    }

    for child in element.children() {
        if let Some(child) = ElementRef::wrap(child) {
            collect(child, lines, current);
        } else if let Node::Text(text) = child.value() {
            for word in text.split_whitespace() {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
            }
        }
    }

    if block {
        flush(lines, current);
    }
}

fn flush(lines: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        lines.push(std::mem::take(current));
    }
}
