//! Error types for Httption.
//!
//! Every failure an action can report is a variant of `HttptionError`.
//! The error is `Clone` so the executor can hand it to the caller and keep
//! a copy as the action's last error.

use std::io::ErrorKind;

use thiserror::Error;

/// Unified error type for all Httption operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HttptionError {
    /// Connection, DNS, TLS or timeout failure reported by the transport.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered 429 Too Many Requests.
    #[error("Too many requests")]
    RateLimited,

    /// The server rejected the payment attached to the request.
    #[error("Invalid payment")]
    InvalidPayment,

    /// The client has to be authorized through an emailed link before purchasing.
    #[error(
        "This client needs to be authorized for purchases. We've sent you an email. Click the link on the email and then retry the purchase."
    )]
    NeedEmailAuthorize,

    /// The server answered 400 Bad Request. `body` is `None` when the response
    /// carried no body or the body was not valid JSON.
    #[error("{}", bad_request_message(.body))]
    BadRequest {
        body: Option<String>,
    },

    /// Any other non-2xx status.
    #[error("{url} status {status} is not ok: {body}")]
    RequestFailed {
        url: String,
        status: u16,
        body: String,
    },

    /// The request was dispatched before it was built.
    #[error("action request is empty. Call configure() before the action request is performed")]
    EmptyRequest,

    /// A registered status code handler vetoed the response.
    #[error("status code handler rejected status {status}")]
    HandlerRejected {
        status: u16,
    },

    /// Invalid method, URL, header or configuration file.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors (JSON).
    #[error("{0}")]
    Convert(String),

    /// The transport cannot route through a proxy.
    #[error("{0}")]
    ProxyUnsupported(String),

    /// The cancellation token fired while the action was suspended.
    #[error("action cancelled")]
    Cancelled,

    /// The action asked to be repeated more often than allowed.
    #[error("action repeated {repeats} times without settling")]
    RepeatLimitExceeded {
        repeats: u32,
    },

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),
}

fn bad_request_message(body: &Option<String>) -> String {
    match body {
        Some(body) => format!("BadRequest: {}", body),
        None => "BadRequest noBody".to_string(),
    }
}

impl HttptionError {
    /// Only rate limiting is retried by the executor.
    pub fn is_retryable(&self) -> bool {
        matches!(self, HttptionError::RateLimited)
    }
}

impl From<HttptionError> for String {
    fn from(val: HttptionError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for HttptionError {
    fn from(error: std::io::Error) -> Self {
        HttptionError::IoError(error.to_string())
    }
}

impl From<HttptionError> for std::io::Error {
    fn from(val: HttptionError) -> Self {
        #[allow(clippy::io_other_error)]
        std::io::Error::new(ErrorKind::Other, val.to_string())
    }
}

impl From<serde_json::Error> for HttptionError {
    fn from(error: serde_json::Error) -> Self {
        HttptionError::Convert(error.to_string())
    }
}

impl From<toml::de::Error> for HttptionError {
    fn from(error: toml::de::Error) -> Self {
        HttptionError::Config(error.to_string())
    }
}

impl From<reqwest::Error> for HttptionError {
    fn from(error: reqwest::Error) -> Self {
        HttptionError::Transport(error.to_string())
    }
}
