use std::time::Duration;

use crate::{HttptionError, Result, config::RetryConfig};

/// Upper bound of repeat cycles when nothing else is configured.
pub const DEFAULT_MAX_REPEATS: u32 = 16;

/// Lifecycle of an action.
///
/// `Unconfigured -> Configured -> Dispatching -> {Succeeded, RetryWait, Failed}`,
/// with `RetryWait` leading back to `Dispatching` and a repeat leading from
/// `Succeeded` back to `Configured`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ActionState {
    #[default]
    Unconfigured,
    Configured,
    Dispatching,
    Succeeded,
    RetryWait,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// retries after a rate limited attempt, 0 disables retrying
    pub max_retry: u32,
    /// run the whole action again after it succeeds
    pub need_repeat: bool,
    /// fixed delay between retries, zero retries immediately
    pub retry_delay: Duration,
    /// repeat cycles allowed per execute call
    pub max_repeats: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retry: 0,
            need_repeat: false,
            retry_delay: Duration::ZERO,
            max_repeats: DEFAULT_MAX_REPEATS,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retry: config.max_retry,
            need_repeat: false,
            retry_delay: config.retry_delay(),
            max_repeats: config.max_repeats,
        }
    }
}

/// Counter threaded through one dispatch cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    /// attempts sent in this cycle, incremented before each send
    pub attempt: u32,
}

impl RetryState {
    pub fn next_attempt(self) -> Self {
        Self {
            attempt: self.attempt + 1,
        }
    }
}

/// What the dispatch loop does after an attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Done,
    Retry(Duration),
    Fail(HttptionError),
}

/// Decides the next step from the outcome of attempt `state.attempt`.
///
/// A retryable error is retried while `attempt <= max_retry`, so a policy
/// with `max_retry = n` sends at most `n + 1` requests.
pub fn next_step(
    policy: &RetryPolicy,
    state: RetryState,
    outcome: Result<()>,
) -> Step {
    match outcome {
        Ok(()) => Step::Done,
        Err(err) if err.is_retryable() && state.attempt <= policy.max_retry => Step::Retry(policy.retry_delay),
        Err(err) => Step::Fail(err),
    }
}
