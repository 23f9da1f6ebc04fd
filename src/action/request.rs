use std::collections::HashMap;

use bytes::Bytes;
use reqwest::{
    Method, Url,
    header::{HeaderMap, HeaderName, InvalidHeaderValue},
};

use crate::{HttptionError, Result, transport::HttpRequest};

/// Everything needed to build the action's request.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    pub method: Method,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
}

impl RequestTemplate {
    pub fn new(
        method: Method,
        url: impl Into<String>,
    ) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn build(&self) -> Result<HttpRequest> {
        let url = Url::parse(&self.url).map_err(|err| HttptionError::Config(format!("invalid url '{}': {}", self.url, err)))?;

        let mut headers = HeaderMap::new();
        for (key, value) in &self.headers {
            headers.insert(
                key.parse::<HeaderName>().map_err(|err| HttptionError::Config(err.to_string()))?,
                value.parse().map_err(|err: InvalidHeaderValue| HttptionError::Config(err.to_string()))?,
            );
        }

        Ok(HttpRequest {
            method: self.method.clone(),
            url,
            headers,
            body: self.body.clone(),
        })
    }
}
