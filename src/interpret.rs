//! Turns failed responses into displayable error fragments.
//!
//! Markup error pages are mined for a handful of well-known blocks, JSON
//! payloads are shown with their `error` field as headline, and everything
//! else collapses to a fixed fallback message. Nothing in here fails: a body
//! that cannot be understood produces the fallback.

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use v_htmlescape::escape;

use crate::transport::FetchResponse;

pub const FALLBACK_MESSAGE: &str = "Error: Unable to process your request.";

const UNKNOWN_TITLE: &str = "Unknown Error";
const UNKNOWN_JSON_ERROR: &str = "An unexpected error occurred.";
const STRIPED_TABLE: &str = r#"<table class="table table-striped""#;

const HEADER: &str = "header";
const SUBHEADER: &str = "#container > h2";
const EXCEPTION: &str = ".exception-message";
const EXCEPTION_FALLBACK: &str = "#container > pre";
const SOURCE_FRAME: &str = "#frame-source-0-0";
const DEFAULT_ERROR_PAGE: &str = ".rails-default-error-page";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Markup,
    Structured,
    Other,
}

impl ContentKind {
    pub fn classify(content_type: Option<&str>) -> Self {
        match content_type {
            Some(content_type) if content_type.contains("text/html") => Self::Markup,
            Some(content_type) if content_type.contains("application/json") => Self::Structured,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorFragment {
    pub kind: ContentKind,
    pub headline: Option<String>,
    pub html: String,
    pub reveal_banners: bool,
}

impl ErrorFragment {
    fn fallback(kind: ContentKind) -> Self {
        Self {
            kind,
            headline: None,
            html: FALLBACK_MESSAGE.to_string(),
            reveal_banners: kind != ContentKind::Other,
        }
    }
}

pub fn interpret(response: &FetchResponse) -> ErrorFragment {
    let kind = ContentKind::classify(response.content_type());
    let fragment = match kind {
        ContentKind::Markup => from_markup(&String::from_utf8_lossy(&response.body)),
        ContentKind::Structured => from_json(&response.body),
        ContentKind::Other => None,
    };
    fragment.unwrap_or_else(|| ErrorFragment::fallback(kind))
}

fn from_markup(html: &str) -> Option<ErrorFragment> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let title = first(root, "title")
        .map(text_of)
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());
    let header = first(root, HEADER).map(text_of);
    let subheader = first(root, SUBHEADER).map(text_of);
    let exception = first(root, EXCEPTION)
        .or_else(|| first(root, EXCEPTION_FALLBACK))
        .map(|block| block.inner_html());
    let body = first(root, SOURCE_FRAME)
        .map(striped_tables)
        .or_else(|| first(root, DEFAULT_ERROR_PAGE).map(|block| block.inner_html()));

    if header.is_none() && subheader.is_none() && exception.is_none() && body.is_none() {
        return None;
    }

    let html = format!(
        concat!(
            "<div class=\"error-panel\">Error:<br/>{title}<br/>Details:<br/>",
            "<div class=\"error-header\">{header}</div>",
            "<div class=\"error-subheader\">{subheader}</div>",
            "<div class=\"error-exception\">{exception}</div>",
            "<div class=\"error-body\">{body}</div>",
            "</div>"
        ),
        title = escape(&title),
        header = escape(&header.unwrap_or_default()),
        subheader = escape(&subheader.unwrap_or_default()),
        exception = exception.unwrap_or_default(),
        body = body.unwrap_or_default(),
    );

    Some(ErrorFragment {
        kind: ContentKind::Markup,
        headline: Some(title),
        html,
        reveal_banners: true,
    })
}

fn from_json(body: &[u8]) -> Option<ErrorFragment> {
    let payload: Value = serde_json::from_slice(body).ok()?;
    let headline = match payload.get("error") {
        Some(Value::String(message)) => message.clone(),
        Some(Value::Null) | None => UNKNOWN_JSON_ERROR.to_string(),
        Some(other) => other.to_string(),
    };
    let detail = serde_json::to_string_pretty(&payload).ok()?;

    let html = format!(
        "<div class=\"error-header\">{}</div><div class=\"error-panel\">JSON Error:<br/><pre>{}</pre></div>",
        escape(&headline),
        escape(&detail),
    );

    Some(ErrorFragment {
        kind: ContentKind::Structured,
        headline: Some(headline),
        html,
        reveal_banners: true,
    })
}

fn first<'a>(root: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    root.select(&selector).next()
}

fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Source-frame tables render unstyled; give the first one the striped look
/// unless it already carries classes.
fn striped_tables(frame: ElementRef<'_>) -> String {
    let html = frame.inner_html();
    match first(frame, "table") {
        Some(table) if table.value().attr("class").is_none() => {
            html.replacen("<table", STRIPED_TABLE, 1)
        }
        _ => html,
    }
}
