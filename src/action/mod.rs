//! Action executor.
//!
//! An [`Action`] owns one logical HTTP request: it applies options, builds
//! the request once, dispatches it, classifies the response, retries rate
//! limited attempts and, when the needs-repeat flag is set, rebuilds and
//! runs the whole request again.

mod classify;
mod handler;
mod request;
mod state;

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{
    Dispatch, debug, error, info_span,
    instrument::{Instrument, WithSubscriber},
    warn,
};

use crate::{
    Config, HttptionError, Result,
    option::{ActionOption, apply_options},
    transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport},
};

pub use classify::classify_response;
pub use handler::{RepeatCheck, StatusHandler};
pub use request::RequestTemplate;
pub use state::{ActionState, DEFAULT_MAX_REPEATS, RetryPolicy, RetryState, Step, next_step};

/// Common surface of actions, so domain actions can wrap an [`Action`] and
/// inject their own options before delegating.
#[async_trait]
pub trait HttpAction: Send {
    fn name(&self) -> &str;

    /// Configures the action with `options` and runs it to completion.
    async fn execute(
        &mut self,
        options: Vec<ActionOption>,
    ) -> Result<()>;

    /// Response of the most recent attempt, present only when it succeeded.
    fn response(&self) -> Option<&HttpResponse>;

    /// Error of the most recent attempt, kept after the action completes.
    fn last_error(&self) -> Option<&HttptionError>;

    /// Decodes the last response into `target` when it is declared as JSON.
    /// Other content types leave `target` untouched.
    fn decode_result<R>(
        &self,
        target: &mut R,
    ) -> Result<()>
    where
        R: DeserializeOwned,
        Self: Sized,
    {
        decode_response(self.response(), target)
    }
}

/// Configuration an action carries between runs.
#[derive(Debug, Clone)]
pub(crate) struct ActionSettings {
    pub template: RequestTemplate,
    pub retry: RetryPolicy,
    pub handlers: HashMap<u16, StatusHandler>,
    pub repeat_check: Option<RepeatCheck>,
    pub logger: Option<Dispatch>,
    pub cancel: Option<CancellationToken>,
}

impl ActionSettings {
    pub fn new(
        method: Method,
        url: impl Into<String>,
    ) -> Self {
        Self {
            template: RequestTemplate::new(method, url),
            retry: RetryPolicy::default(),
            handlers: HashMap::new(),
            repeat_check: None,
            logger: None,
            cancel: None,
        }
    }
}

pub struct Action<T = ReqwestTransport> {
    name: String,
    transport: T,
    settings: ActionSettings,

    request: Option<HttpRequest>,
    response: Option<HttpResponse>,
    last_error: Option<HttptionError>,

    state: ActionState,
    attempts: u32,
}

impl Action<ReqwestTransport> {
    /// Creates an action with a reqwest transport and the retry policy
    /// described by `config`.
    pub fn from_config(
        name: impl Into<String>,
        method: Method,
        url: impl Into<String>,
        config: &Config,
    ) -> Result<Self> {
        let transport = ReqwestTransport::new(config.transport.clone())?;
        let mut action = Self::new(name, transport, method, url);
        action.settings.retry = RetryPolicy::from(&config.retry);
        Ok(action)
    }
}

impl<T: Transport> Action<T> {
    pub fn new(
        name: impl Into<String>,
        transport: T,
        method: Method,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            transport,
            settings: ActionSettings::new(method, url),
            request: None,
            response: None,
            last_error: None,
            state: ActionState::Unconfigured,
            attempts: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn state(&self) -> ActionState {
        self.state
    }

    /// Requests sent over the action's whole life, retries and repeats included.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.settings.retry
    }

    pub fn needs_repeat(&self) -> bool {
        self.settings.retry.need_repeat
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.settings.template.headers
    }

    /// The built request, `None` until the action is configured.
    pub fn request(&self) -> Option<&HttpRequest> {
        self.request.as_ref()
    }

    /// Response of the most recent attempt, `None` unless that attempt succeeded.
    pub fn response(&self) -> Option<&HttpResponse> {
        self.response.as_ref()
    }

    /// Body of the most recent attempt when it succeeded, empty otherwise.
    pub fn raw_response(&self) -> &[u8] {
        self.response.as_ref().map(|response| &response.body[..]).unwrap_or_default()
    }

    pub fn last_error(&self) -> Option<&HttptionError> {
        self.last_error.as_ref()
    }

    pub fn decode_result<R: DeserializeOwned>(
        &self,
        target: &mut R,
    ) -> Result<()> {
        decode_response(self.response.as_ref(), target)
    }

    /// Applies `options` in order and builds the request if it was never built.
    ///
    /// Once built, the request is kept as is: later options only change the
    /// template used by the next rebuild.
    pub fn configure(
        &mut self,
        options: impl IntoIterator<Item = ActionOption>,
    ) -> Result<()> {
        let options: Vec<ActionOption> = options.into_iter().collect();
        // a logger passed in this call already receives the setup events
        let logger = options
            .iter()
            .rev()
            .find_map(|option| match option {
                ActionOption::Logger(logger) => Some(logger.clone()),
                _ => None,
            })
            .or_else(|| self.settings.logger.clone());

        match logger {
            Some(logger) => tracing::dispatcher::with_default(&logger, || self.setup(options)),
            None => self.setup(options),
        }
    }

    /// Configures the action and runs it, retrying rate limited attempts and
    /// repeating while the needs-repeat flag is set.
    pub async fn execute(
        &mut self,
        options: impl IntoIterator<Item = ActionOption>,
    ) -> Result<()> {
        self.configure(options)?;
        self.dispatch().await
    }

    /// Runs the already configured request with the full retry and repeat
    /// protocol. Fails with `EmptyRequest` when the action was never configured.
    pub async fn dispatch(&mut self) -> Result<()> {
        match self.settings.logger.clone() {
            Some(logger) => self.run().with_subscriber(logger).await,
            None => self.run().await,
        }
    }

    /// Runs a single dispatch cycle again, with retries but without chaining
    /// further repeats. `force_reconfigure` discards the built request so it
    /// is rebuilt from the current template.
    pub async fn repeat(
        &mut self,
        force_reconfigure: bool,
        options: impl IntoIterator<Item = ActionOption>,
    ) -> Result<()> {
        if force_reconfigure {
            self.request = None;
        }
        self.configure(options)?;

        match self.settings.logger.clone() {
            Some(logger) => self.dispatch_cycle().with_subscriber(logger).await,
            None => self.dispatch_cycle().await,
        }
    }

    fn setup(
        &mut self,
        options: impl IntoIterator<Item = ActionOption>,
    ) -> Result<()> {
        debug!(action_name = %self.name, "action setup");

        if let Err(err) = apply_options(&mut self.settings, &mut self.transport, options) {
            error!(action_name = %self.name, error = %err, "action setup failed");
            self.last_error = Some(err.clone());
            return Err(err);
        }

        if self.request.is_none() {
            match self.settings.template.build() {
                Ok(request) => self.request = Some(request),
                Err(err) => {
                    error!(action_name = %self.name, error = %err, "failed to build request");
                    self.last_error = Some(err.clone());
                    return Err(err);
                }
            }
        }

        self.state = ActionState::Configured;
        Ok(())
    }

    async fn run(&mut self) -> Result<()> {
        let mut repeats = 0;

        loop {
            self.dispatch_cycle().await?;

            if !self.settings.retry.need_repeat {
                return Ok(());
            }
            if repeats >= self.settings.retry.max_repeats {
                return Err(self.fail(HttptionError::RepeatLimitExceeded {
                    repeats,
                }));
            }

            repeats += 1;
            debug!(action_name = %self.name, repeat = repeats, "repeating action with a fresh request");
            // the flag holds for one cycle, a repeat check may set it again
            self.settings.retry.need_repeat = false;
            self.request = None;
            self.setup(Vec::new())?;
        }
    }

    /// Sends the built request until it succeeds, fails terminally or runs
    /// out of retries.
    async fn dispatch_cycle(&mut self) -> Result<()> {
        let mut retry = RetryState::default();

        loop {
            retry = retry.next_attempt();
            self.state = ActionState::Dispatching;

            let outcome = self.attempt(retry).await;
            match next_step(&self.settings.retry, retry, outcome) {
                Step::Done => {
                    debug!(action_name = %self.name, attempt = retry.attempt, "response handled");
                    self.state = ActionState::Succeeded;
                    self.last_error = None;
                    return Ok(());
                }
                Step::Retry(delay) => {
                    warn!(
                        action_name = %self.name,
                        attempt = retry.attempt,
                        max_retry = self.settings.retry.max_retry,
                        "rate limited, retrying"
                    );
                    self.state = ActionState::RetryWait;
                    self.last_error = Some(HttptionError::RateLimited);

                    if !delay.is_zero() {
                        debug!(action_name = %self.name, delay = ?delay, "waiting before retry");
                        if let Err(err) = self.wait(delay).await {
                            return Err(self.fail(err));
                        }
                    }
                }
                Step::Fail(err) => return Err(self.fail(err)),
            }
        }
    }

    /// One round trip: send, read, veto through handlers, classify.
    async fn attempt(
        &mut self,
        retry: RetryState,
    ) -> Result<()> {
        self.attempts += 1;
        self.response = None;
        debug!(action_name = %self.name, attempt = retry.attempt, "do action");

        let request = self.request.as_ref().ok_or(HttptionError::EmptyRequest)?;

        debug!(action_name = %self.name, method = %request.method, url = %request.url, "sending request");
        let send = self.transport.send(request).instrument(info_span!("send", action_name = %self.name));
        let response = match &self.settings.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(HttptionError::Cancelled),
                    response = send => response,
                }
            }
            None => send.await,
        }?;
        debug!(action_name = %self.name, status = response.status.as_u16(), bytes = response.body.len(), "response received");

        let status = response.status.as_u16();

        if let Some(handler) = self.settings.handlers.get(&status) {
            if handler.rejects(&self.transport) {
                return Err(HttptionError::HandlerRejected {
                    status,
                });
            }
        }

        classify_response(&request.url, &response)?;

        if let Some(check) = &self.settings.repeat_check {
            self.settings.retry.need_repeat = check.needs_repeat(&response);
        }

        self.response = Some(response);
        Ok(())
    }

    async fn wait(
        &self,
        delay: Duration,
    ) -> Result<()> {
        match &self.settings.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(HttptionError::Cancelled),
                    _ = tokio::time::sleep(delay) => Ok(()),
                }
            }
            None => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }

    fn fail(
        &mut self,
        err: HttptionError,
    ) -> HttptionError {
        error!(action_name = %self.name, error = %err, "action failed");
        self.state = ActionState::Failed;
        self.last_error = Some(err.clone());
        err
    }
}

#[async_trait]
impl<T: Transport> HttpAction for Action<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &mut self,
        options: Vec<ActionOption>,
    ) -> Result<()> {
        Action::execute(self, options).await
    }

    fn response(&self) -> Option<&HttpResponse> {
        self.response.as_ref()
    }

    fn last_error(&self) -> Option<&HttptionError> {
        self.last_error.as_ref()
    }
}

fn decode_response<R: DeserializeOwned>(
    response: Option<&HttpResponse>,
    target: &mut R,
) -> Result<()> {
    let Some(response) = response else {
        return Ok(());
    };
    if response.body.is_empty() || !response.is_json() {
        return Ok(());
    }

    *target = serde_json::from_slice(&response.body)?;
    Ok(())
}
