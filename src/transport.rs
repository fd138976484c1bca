//! Network collaborator.
//!
//! The controllers never talk to the network directly. Loads go through a
//! [`Transport`], which races the request against the request's
//! [`AbortSignal`] and hands back the raw response. Interpreting status codes
//! and content types is left to the caller.

mod client;
#[cfg(test)]
pub mod scripted;

use async_trait::async_trait;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use tokio_util::bytes::Bytes;

use crate::document::Element;
use crate::stream::STREAM_CONTENT_TYPE;
use crate::sync::AbortSignal;

pub use client::HttpTransport;

/// Header naming the region a load renders into.
pub const REGION_HEADER: &str = "x-content-region";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub method: Method,
    pub form: Vec<(String, String)>,
    pub region: Option<String>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            form: Vec::new(),
            region: None,
        }
    }

    /// The request an activated trigger issues, if it points anywhere.
    pub fn for_element(element: &Element) -> Option<Self> {
        Some(Self {
            url: element.action.clone()?,
            method: element.method.clone(),
            form: element.fields.clone(),
            region: element.target.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Cloning shares the buffer, so any number of consumers can read it.
    pub body: Bytes,
    pub url: String,
}

impl FetchResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
            url: String::new(),
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(content_type) {
            self.headers.insert(CONTENT_TYPE, value);
        }
        self
    }

    /// Only an exact 200 counts as success.
    pub fn is_success(&self) -> bool {
        self.status == StatusCode::OK
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    pub fn is_stream(&self) -> bool {
        self.content_type()
            .is_some_and(|content_type| content_type.contains(STREAM_CONTENT_TYPE))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request aborted: {0}")]
    Aborted(String),
    #[error("network failure: {0}")]
    Network(String),
    #[error("invalid request url `{0}`")]
    InvalidUrl(String),
}

impl TransportError {
    pub fn abort_reason(&self) -> Option<&str> {
        match self {
            Self::Aborted(reason) => Some(reason),
            Self::Network(_) | Self::InvalidUrl(_) => None,
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(
        &self,
        request: FetchRequest,
        signal: AbortSignal,
    ) -> Result<FetchResponse, TransportError>;
}
