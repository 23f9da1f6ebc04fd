//! Configuration options applied to an action before it runs.
//!
//! Options are plain records. `apply_options` interprets them in order and
//! stops at the first one that fails; nothing here performs I/O.

use std::{collections::HashMap, time::Duration};

use bytes::Bytes;
use reqwest::Url;
use tokio_util::sync::CancellationToken;
use tracing::Dispatch;

use crate::{
    Result,
    action::{ActionSettings, RepeatCheck, StatusHandler},
    transport::{HttpResponse, Transport},
    utils::maps::merged_maps,
};

#[derive(Debug, Clone)]
pub enum ActionOption {
    /// Replace every header.
    Headers(HashMap<String, String>),
    /// Add headers, the new value wins on conflict.
    AppendHeaders(HashMap<String, String>),
    /// Add headers, the existing value wins on conflict.
    PrependHeaders(HashMap<String, String>),
    Body(Bytes),
    /// Send the action's log events to this dispatcher only.
    Logger(Dispatch),
    /// Route the transport through a proxy.
    ProxyUrl(Url),
    /// Update the retry policy. `None` keeps the current value.
    Retry {
        max_retry: Option<u32>,
        need_repeat: Option<bool>,
        retry_delay: Option<Duration>,
    },
    MaxRepeats(u32),
    StatusCodeHandler(u16, StatusHandler),
    RepeatWhen(RepeatCheck),
    Cancellation(CancellationToken),
}

impl ActionOption {
    pub fn with_headers(headers: HashMap<String, String>) -> Self {
        ActionOption::Headers(headers)
    }

    pub fn with_append_headers(headers: HashMap<String, String>) -> Self {
        ActionOption::AppendHeaders(headers)
    }

    pub fn with_prepend_headers(headers: HashMap<String, String>) -> Self {
        ActionOption::PrependHeaders(headers)
    }

    pub fn with_body_bytes(body: impl Into<Bytes>) -> Self {
        ActionOption::Body(body.into())
    }

    pub fn with_body_string(body: impl Into<String>) -> Self {
        ActionOption::Body(Bytes::from(body.into()))
    }

    pub fn with_logger(logger: impl Into<Dispatch>) -> Self {
        ActionOption::Logger(logger.into())
    }

    pub fn with_proxy_url(proxy_url: Url) -> Self {
        ActionOption::ProxyUrl(proxy_url)
    }

    pub fn with_retry(
        max_retry: Option<u32>,
        need_repeat: Option<bool>,
        retry_delay: Option<Duration>,
    ) -> Self {
        ActionOption::Retry {
            max_retry,
            need_repeat,
            retry_delay,
        }
    }

    pub fn with_max_retry(max_retry: u32) -> Self {
        Self::with_retry(Some(max_retry), None, None)
    }

    pub fn with_need_repeat(need_repeat: bool) -> Self {
        Self::with_retry(None, Some(need_repeat), None)
    }

    pub fn with_retry_delay(retry_delay: Duration) -> Self {
        Self::with_retry(None, None, Some(retry_delay))
    }

    pub fn with_max_repeats(max_repeats: u32) -> Self {
        ActionOption::MaxRepeats(max_repeats)
    }

    pub fn with_status_code_handler(
        code: u16,
        handler: StatusHandler,
    ) -> Self {
        ActionOption::StatusCodeHandler(code, handler)
    }

    /// Re-evaluate the needs-repeat flag on every successful response.
    pub fn with_repeat_when<F>(check: F) -> Self
    where
        F: Fn(&HttpResponse) -> bool + Send + Sync + 'static,
    {
        ActionOption::RepeatWhen(RepeatCheck::new(check))
    }

    pub fn with_cancellation(token: CancellationToken) -> Self {
        ActionOption::Cancellation(token)
    }

    fn apply(
        self,
        settings: &mut ActionSettings,
        transport: &mut dyn Transport,
    ) -> Result<()> {
        match self {
            ActionOption::Headers(headers) => settings.template.headers = headers,
            ActionOption::AppendHeaders(headers) => settings.template.headers = merged_maps(&[&settings.template.headers, &headers]),
            ActionOption::PrependHeaders(headers) => settings.template.headers = merged_maps(&[&headers, &settings.template.headers]),
            ActionOption::Body(body) => settings.template.body = Some(body),
            ActionOption::Logger(logger) => settings.logger = Some(logger),
            ActionOption::ProxyUrl(proxy_url) => transport.set_proxy(&proxy_url)?,
            ActionOption::Retry {
                max_retry,
                need_repeat,
                retry_delay,
            } => {
                if let Some(max_retry) = max_retry {
                    settings.retry.max_retry = max_retry;
                }
                if let Some(need_repeat) = need_repeat {
                    settings.retry.need_repeat = need_repeat;
                }
                if let Some(retry_delay) = retry_delay {
                    settings.retry.retry_delay = retry_delay;
                }
            }
            ActionOption::MaxRepeats(max_repeats) => settings.retry.max_repeats = max_repeats,
            ActionOption::StatusCodeHandler(code, handler) => {
                settings.handlers.insert(code, handler);
            }
            ActionOption::RepeatWhen(check) => settings.repeat_check = Some(check),
            ActionOption::Cancellation(token) => settings.cancel = Some(token),
        }

        Ok(())
    }
}

/// Applies `options` in order, aborting at the first error.
pub(crate) fn apply_options(
    settings: &mut ActionSettings,
    transport: &mut dyn Transport,
    options: impl IntoIterator<Item = ActionOption>,
) -> Result<()> {
    for option in options {
        option.apply(settings, transport)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use reqwest::Method;

    use super::*;
    use crate::{HttptionError, transport::mock::ScriptedTransport};

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn settings() -> ActionSettings {
        ActionSettings::new(Method::GET, "http://localhost/")
    }

    #[test]
    fn test_headers_replace_everything() {
        let mut settings = settings();
        let mut transport = ScriptedTransport::new(vec![]);
        let options = vec![
            ActionOption::with_headers(headers(&[("a", "1"), ("b", "1")])),
            ActionOption::with_headers(headers(&[("c", "2")])),
        ];

        apply_options(&mut settings, &mut transport, options).unwrap();
        assert_eq!(settings.template.headers, headers(&[("c", "2")]));
    }

    #[test]
    fn test_append_headers_new_wins() {
        let mut settings = settings();
        let mut transport = ScriptedTransport::new(vec![]);
        let options = vec![
            ActionOption::with_headers(headers(&[("a", "old"), ("b", "old")])),
            ActionOption::with_append_headers(headers(&[("b", "new"), ("c", "new")])),
        ];

        apply_options(&mut settings, &mut transport, options).unwrap();
        assert_eq!(settings.template.headers, headers(&[("a", "old"), ("b", "new"), ("c", "new")]));
    }

    #[test]
    fn test_prepend_headers_old_wins() {
        let mut settings = settings();
        let mut transport = ScriptedTransport::new(vec![]);
        let options = vec![
            ActionOption::with_headers(headers(&[("a", "old"), ("b", "old")])),
            ActionOption::with_prepend_headers(headers(&[("b", "new"), ("c", "new")])),
        ];

        apply_options(&mut settings, &mut transport, options).unwrap();
        assert_eq!(settings.template.headers, headers(&[("a", "old"), ("b", "old"), ("c", "new")]));
    }

    #[test]
    fn test_body_string_and_bytes() {
        let mut settings = settings();
        let mut transport = ScriptedTransport::new(vec![]);

        apply_options(&mut settings, &mut transport, [ActionOption::with_body_string("text")]).unwrap();
        assert_eq!(settings.template.body, Some(Bytes::from_static(b"text")));

        apply_options(&mut settings, &mut transport, [ActionOption::with_body_bytes(vec![0u8, 1, 2])]).unwrap();
        assert_eq!(settings.template.body, Some(Bytes::from_static(&[0, 1, 2])));
    }

    #[test]
    fn test_retry_leaves_unset_fields() {
        let mut settings = settings();
        let mut transport = ScriptedTransport::new(vec![]);
        let options = vec![
            ActionOption::with_retry(Some(5), Some(true), Some(Duration::from_secs(2))),
            ActionOption::with_retry(Some(1), None, None),
        ];

        apply_options(&mut settings, &mut transport, options).unwrap();
        assert_eq!(settings.retry.max_retry, 1);
        assert!(settings.retry.need_repeat);
        assert_eq!(settings.retry.retry_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_single_field_retry_options() {
        let mut settings = settings();
        let mut transport = ScriptedTransport::new(vec![]);
        let options = vec![
            ActionOption::with_max_retry(3),
            ActionOption::with_need_repeat(true),
            ActionOption::with_retry_delay(Duration::from_millis(10)),
            ActionOption::with_max_repeats(2),
        ];

        apply_options(&mut settings, &mut transport, options).unwrap();
        assert_eq!(settings.retry.max_retry, 3);
        assert!(settings.retry.need_repeat);
        assert_eq!(settings.retry.retry_delay, Duration::from_millis(10));
        assert_eq!(settings.retry.max_repeats, 2);
    }

    #[test]
    fn test_status_code_handler_registration() {
        let mut settings = settings();
        let mut transport = ScriptedTransport::new(vec![]);

        apply_options(&mut settings, &mut transport, [ActionOption::with_status_code_handler(200, StatusHandler::reject())]).unwrap();
        assert!(settings.handlers.contains_key(&200));
    }

    #[test]
    fn test_proxy_delegates_to_transport() {
        let mut settings = settings();
        let mut transport = ScriptedTransport::new(vec![]).with_proxy_support();
        let proxy_url: Url = "http://127.0.0.1:3128".parse().unwrap();

        apply_options(&mut settings, &mut transport, [ActionOption::with_proxy_url(proxy_url.clone())]).unwrap();
        assert_eq!(transport.proxy(), Some(proxy_url));
    }

    #[test]
    fn test_first_error_aborts_remaining() {
        let mut settings = settings();
        let mut transport = ScriptedTransport::new(vec![]);
        let options = vec![
            ActionOption::with_max_retry(1),
            ActionOption::with_proxy_url("http://127.0.0.1:3128".parse().unwrap()),
            ActionOption::with_max_retry(9),
            ActionOption::with_body_string("never"),
        ];

        let result = apply_options(&mut settings, &mut transport, options);
        assert!(matches!(result, Err(HttptionError::ProxyUnsupported(_))));
        assert_eq!(settings.retry.max_retry, 1);
        assert!(settings.template.body.is_none());
    }

    #[test]
    fn test_cancellation_and_logger_are_stored() {
        let mut settings = settings();
        let mut transport = ScriptedTransport::new(vec![]);
        let options = vec![
            ActionOption::with_cancellation(CancellationToken::new()),
            ActionOption::with_logger(Dispatch::none()),
            ActionOption::with_repeat_when(|_| false),
        ];

        apply_options(&mut settings, &mut transport, options).unwrap();
        assert!(settings.cancel.is_some());
        assert!(settings.logger.is_some());
        assert!(settings.repeat_check.is_some());
    }
}
