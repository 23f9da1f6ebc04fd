//! Scripted in-memory transport for tests.

use std::{collections::VecDeque, sync::Mutex};

use async_trait::async_trait;
use reqwest::{
    StatusCode, Url,
    header::{CONTENT_TYPE, HeaderMap, HeaderValue},
};
use tokio::time::Instant;

use crate::{HttptionError, Result};

use super::{HttpRequest, HttpResponse, Transport};

/// Replays scripted outcomes in order. Once the script runs out the last
/// outcome is replayed forever.
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Result<HttpResponse>>>,
    last: Mutex<Option<Result<HttpResponse>>>,
    sent: Mutex<Vec<(Instant, HttpRequest)>>,
    proxy_support: bool,
    proxy: Option<Url>,
}

impl ScriptedTransport {
    pub(crate) fn new(script: Vec<Result<HttpResponse>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
            proxy_support: false,
            proxy: None,
        }
    }

    pub(crate) fn with_proxy_support(mut self) -> Self {
        self.proxy_support = true;
        self
    }

    pub(crate) fn sent(&self) -> Vec<HttpRequest> {
        self.sent.lock().unwrap().iter().map(|(_, request)| request.clone()).collect()
    }

    pub(crate) fn sent_at(&self) -> Vec<Instant> {
        self.sent.lock().unwrap().iter().map(|(at, _)| *at).collect()
    }

    pub(crate) fn proxy(&self) -> Option<Url> {
        self.proxy.clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        request: &HttpRequest,
    ) -> Result<HttpResponse> {
        self.sent.lock().unwrap().push((Instant::now(), request.clone()));

        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        if let Some(outcome) = next {
            *last = Some(outcome);
        }
        last.clone().unwrap_or_else(|| Err(HttptionError::Transport("script is empty".to_string())))
    }

    fn set_proxy(
        &mut self,
        proxy_url: &Url,
    ) -> Result<()> {
        if !self.proxy_support {
            return Err(HttptionError::ProxyUnsupported("scripted transport".to_string()));
        }
        self.proxy = Some(proxy_url.clone());
        Ok(())
    }
}

pub(crate) fn text_response(
    status: StatusCode,
    body: &str,
) -> HttpResponse {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    HttpResponse::new(status, headers, body.to_string())
}

pub(crate) fn json_response(
    status: StatusCode,
    body: &str,
) -> HttpResponse {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    HttpResponse::new(status, headers, body.to_string())
}

pub(crate) fn empty_response(status: StatusCode) -> HttpResponse {
    HttpResponse::new(status, HeaderMap::new(), Vec::new())
}
