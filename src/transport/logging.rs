use std::fmt::Write;

use async_trait::async_trait;
use reqwest::{StatusCode, Url, header::HeaderMap};
use tracing::{debug, error};

use crate::Result;

use super::{HttpRequest, HttpResponse, Transport};

/// Wraps a transport and logs a dump of every request and response.
///
/// Dumps are emitted at `debug`, round trip failures at `error`. Proxy
/// configuration is forwarded to the wrapped transport.
pub struct LoggingTransport<T> {
    inner: T,
}

impl<T: Transport> LoggingTransport<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[async_trait]
impl<T: Transport> Transport for LoggingTransport<T> {
    async fn send(
        &self,
        request: &HttpRequest,
    ) -> Result<HttpResponse> {
        debug!(request = %dump_request(request), "sending request");

        match self.inner.send(request).await {
            Ok(response) => {
                debug!(response = %dump_response(&response), "received response");
                Ok(response)
            }
            Err(err) => {
                error!(error = %err, url = %request.url, "round trip failed");
                Err(err)
            }
        }
    }

    fn set_proxy(
        &mut self,
        proxy_url: &Url,
    ) -> Result<()> {
        self.inner.set_proxy(proxy_url)
    }
}

/// Whether a response with `status` may carry a body (RFC 7230, section 3.3).
fn body_allowed_for_status(status: StatusCode) -> bool {
    !(status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED)
}

fn write_headers(
    out: &mut String,
    headers: &HeaderMap,
) {
    for (name, value) in headers {
        let _ = write!(out, "{}: {}\r\n", name, String::from_utf8_lossy(value.as_bytes()));
    }
}

pub(crate) fn dump_request(request: &HttpRequest) -> String {
    let mut out = String::new();
    let target = match request.url.query() {
        Some(query) => format!("{}?{}", request.url.path(), query),
        None => request.url.path().to_string(),
    };
    let _ = write!(out, "{} {} HTTP/1.1\r\n", request.method, target);
    if let Some(host) = request.url.host_str() {
        let _ = write!(out, "Host: {}\r\n", host);
    }
    write_headers(&mut out, &request.headers);
    out.push_str("\r\n");
    if let Some(body) = &request.body {
        out.push_str(&String::from_utf8_lossy(body));
    }
    out
}

pub(crate) fn dump_response(response: &HttpResponse) -> String {
    let mut out = String::new();
    let _ = write!(out, "HTTP/1.1 {}\r\n", response.status);
    write_headers(&mut out, &response.headers);
    out.push_str("\r\n");
    if body_allowed_for_status(response.status) {
        out.push_str(&String::from_utf8_lossy(&response.body));
    }
    out
}
