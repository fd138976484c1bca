use std::time::Duration;

use async_trait::async_trait;
use color_eyre::Result;
use http::header::ACCEPT;
use http::Method;
use reqwest::{Client, RequestBuilder, Url};
use tracing::debug;

use super::{FetchRequest, FetchResponse, REGION_HEADER, Transport, TransportError};
use crate::sync::AbortSignal;

const ACCEPTED: &str = "text/vnd.turbo-stream.html, text/html, application/json";

/// `reqwest`-backed transport resolving relative URLs against a base URL.
pub struct HttpTransport {
    client: Client,
    base: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    fn resolve(&self, url: &str) -> Result<Url, TransportError> {
        self.base
            .join(url)
            .map_err(|_| TransportError::InvalidUrl(url.to_string()))
    }

    fn build(&self, request: FetchRequest) -> Result<RequestBuilder, TransportError> {
        let url = self.resolve(&request.url)?;
        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .header(ACCEPT, ACCEPTED);

        if let Some(region) = &request.region {
            builder = builder.header(REGION_HEADER, region);
        }
        if !request.form.is_empty() {
            builder = if request.method == Method::GET {
                builder.query(&request.form)
            } else {
                builder.form(&request.form)
            };
        }
        Ok(builder)
    }
}

async fn execute(builder: RequestBuilder) -> Result<FetchResponse, reqwest::Error> {
    let response = builder.send().await?;
    let status = response.status();
    let headers = response.headers().clone();
    let url = response.url().to_string();
    let body = response.bytes().await?;

    Ok(FetchResponse {
        status,
        headers,
        body,
        url,
    })
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(
        &self,
        request: FetchRequest,
        signal: AbortSignal,
    ) -> Result<FetchResponse, TransportError> {
        debug!(url = %request.url, method = %request.method, "fetching");
        let builder = self.build(request)?;

        tokio::select! {
            reason = signal.aborted() => Err(TransportError::Aborted(reason)),
            result = execute(builder) => result.map_err(|e| TransportError::Network(e.to_string())),
        }
    }
}
