//! Transport seam between the action executor and the network.
//!
//! The executor never talks to `reqwest` directly: it hands a fully built
//! [`HttpRequest`] to a [`Transport`] and gets back an [`HttpResponse`] whose
//! body has already been read into memory.

mod client;
mod logging;
#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{
    Method, StatusCode, Url,
    header::{CONTENT_TYPE, HeaderMap},
};

use crate::{HttptionError, Result};

pub use client::ReqwestTransport;
pub use logging::LoggingTransport;

const JSON_MIME: &str = "application/json";

/// A request ready to be dispatched.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// A fully read response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(
        status: StatusCode,
        headers: HeaderMap,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// The `content-type` header, if present and valid UTF-8.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok())
    }

    /// Whether the response declares a JSON body. Media type parameters
    /// such as `charset` are ignored.
    pub fn is_json(&self) -> bool {
        self.content_type()
            .and_then(|value| value.split(';').next())
            .map(|mime| mime.trim().eq_ignore_ascii_case(JSON_MIME))
            .unwrap_or(false)
    }
}

/// Sends requests on behalf of an action.
///
/// Implementations report connection level failures as
/// [`HttptionError::Transport`]; any status code, including errors, is a
/// successful round trip from the transport's point of view.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Dispatches the request and reads the whole response body.
    async fn send(
        &self,
        request: &HttpRequest,
    ) -> Result<HttpResponse>;

    /// Routes subsequent requests through `proxy_url`.
    ///
    /// Transports without proxy support keep the default, which fails.
    fn set_proxy(
        &mut self,
        proxy_url: &Url,
    ) -> Result<()> {
        Err(HttptionError::ProxyUnsupported(format!(
            "cannot route through proxy {} because the transport has no proxy support",
            proxy_url
        )))
    }
}
