use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use crate::{HttptionError, Result, config::TransportConfig};

use super::{HttpRequest, HttpResponse, Transport};

/// [`Transport`] backed by a `reqwest::Client`.
pub struct ReqwestTransport {
    client: reqwest::Client,
    config: TransportConfig,
}

impl ReqwestTransport {
    pub fn new(config: TransportConfig) -> Result<Self> {
        let client = Self::build_client(&config)?;
        Ok(Self {
            client,
            config,
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(TransportConfig::default())
    }

    /// Get underlying reqwest client
    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn build_client(config: &TransportConfig) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder().danger_accept_invalid_certs(config.accept_invalid_certs);

        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(connect_timeout);
        }
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        if let Some(proxy_url) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url.as_str()).map_err(|err| HttptionError::Config(format!("invalid proxy '{}': {}", proxy_url, err)))?;
            builder = builder.proxy(proxy);
        }

        builder.build().map_err(|err| HttptionError::Config(format!("failed to build http client: {}", err)))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: &HttpRequest,
    ) -> Result<HttpResponse> {
        let mut builder = self.client.request(request.method.clone(), request.url.clone()).headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    fn set_proxy(
        &mut self,
        proxy_url: &Url,
    ) -> Result<()> {
        let mut config = self.config.clone();
        config.proxy = Some(proxy_url.to_string());

        self.client = Self::build_client(&config)?;
        self.config = config;
        debug!(proxy = %proxy_url, "transport proxy updated");

        Ok(())
    }
}
