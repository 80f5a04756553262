//! HTTP client shared by every uploader of a run

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Client, Proxy, Response};
use thiserror::Error;
use tracing::debug;

use crate::adapter::{PreparedBody, PreparedRequest};
use crate::config::HttpSettings;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Invalid proxy '{url}': {source}")]
    InvalidProxy {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

/// A finished request/response round trip, body fully read
#[derive(Debug, Clone)]
pub struct HttpExchange {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpExchange {
    pub async fn read(response: Response) -> Result<Self, reqwest::Error> {
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(Self {
            status,
            headers,
            body,
        })
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Thin wrapper over `reqwest::Client`
///
/// Transport defaults apply: no timeout override and no retries.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(settings: &HttpSettings) -> Result<Self, HttpError> {
        let mut builder = Client::builder().user_agent(&settings.user_agent);

        if let Some(url) = settings.proxy.as_deref().filter(|url| !url.is_empty()) {
            let proxy = Proxy::all(url).map_err(|source| HttpError::InvalidProxy {
                url: url.to_string(),
                source,
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(HttpError::Build)?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Send a prepared adapter request and read the whole response
    pub async fn execute(&self, request: PreparedRequest) -> Result<HttpExchange, reqwest::Error> {
        let PreparedRequest {
            method,
            url,
            headers,
            body,
        } = request;

        debug!(%method, %url, "Sending request");

        let builder = self.client.request(method, url);
        // Body first: `headers` replaces the content type the body setter adds
        let builder = match body {
            PreparedBody::Bytes(bytes) => builder.body(bytes).headers(headers),
            PreparedBody::Multipart { form, .. } => builder.multipart(form).headers(headers),
        };

        let exchange = HttpExchange::read(builder.send().await?).await?;
        debug!(status = exchange.status, size = exchange.body.len(), "Response received");

        Ok(exchange)
    }
}
