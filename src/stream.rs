//! Out-of-band update envelopes.
//!
//! The server can push region replacements outside the request that targeted
//! a region, either as a response with [`STREAM_CONTENT_TYPE`] or through
//! [`crate::page::Page::push_stream`]. Each envelope looks like
//!
//! ```html
//! <turbo-stream action="replace" target="cart">
//!   <template><div data-content-region id="cart">...</div></template>
//! </turbo-stream>
//! ```

use std::fmt;

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::document::{RegionMarkup, region_markup};

pub const STREAM_CONTENT_TYPE: &str = "text/vnd.turbo-stream.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamVerb {
    /// Swap the whole region node.
    Replace,
    /// Swap only the region's content.
    Update,
}

impl StreamVerb {
    fn parse(action: &str) -> Option<Self> {
        match action {
            "replace" => Some(Self::Replace),
            "update" => Some(Self::Update),
            _ => None,
        }
    }
}

impl fmt::Display for StreamVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace => write!(f, "replace"),
            Self::Update => write!(f, "update"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamAction {
    pub verb: StreamVerb,
    pub target: String,
    /// `None` when the envelope carried no template.
    pub payload: Option<RegionMarkup>,
}

impl StreamAction {
    pub fn replace(target: impl Into<String>, html: &str) -> Self {
        Self {
            verb: StreamVerb::Replace,
            target: target.into(),
            payload: Some(region_markup(html)),
        }
    }

    fn from_element(element: ElementRef<'_>, templates: &Selector) -> Result<Self, StreamError> {
        let value = element.value();
        let action = value.attr("action").unwrap_or_default();
        let verb =
            StreamVerb::parse(action).ok_or_else(|| StreamError::UnsupportedAction(action.to_string()))?;
        let target = value
            .attr("target")
            .filter(|target| !target.is_empty())
            .ok_or(StreamError::MissingTarget)?;

        let payload = element
            .select(templates)
            .next()
            .map(|template| region_markup(&template.inner_html()));

        Ok(Self {
            verb,
            target: target.to_string(),
            payload,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    #[error("stream envelope is missing a target")]
    MissingTarget,
    #[error("unsupported stream action `{0}`")]
    UnsupportedAction(String),
}

/// Parse every envelope in `body`. Malformed envelopes are logged and skipped.
pub fn parse_stream(body: &str) -> Vec<StreamAction> {
    let (Ok(envelopes), Ok(templates)) = (
        Selector::parse("turbo-stream"),
        Selector::parse("template"),
    ) else {
        return Vec::new();
    };

    let fragment = Html::parse_fragment(body);
    fragment
        .root_element()
        .select(&envelopes)
        .filter_map(|element| match StreamAction::from_element(element, &templates) {
            Ok(action) => Some(action),
            Err(error) => {
                warn!(%error, "skipping stream envelope");
                None
            }
        })
        .collect()
}
