//! # Httption
//!
//! Httption runs a single HTTP request built from composable options and
//! drives it to completion: it classifies the response, retries rate limited
//! attempts with an optional fixed delay and repeats the whole request when
//! a successful response says more work is needed.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::time::Duration;
//!
//! use httption::{Action, ActionOption, Config, Method};
//!
//! let mut action = Action::from_config("ProxyCheck", Method::GET, "http://localhost:4488/api/proxy", &Config::default())?;
//! action
//!     .execute([
//!         ActionOption::with_max_retry(5),
//!         ActionOption::with_retry_delay(Duration::from_secs(2)),
//!     ])
//!     .await?;
//!
//! let mut result = serde_json::Value::Null;
//! action.decode_result(&mut result)?;
//! ```

mod action;
mod config;
mod error;
mod option;
mod transport;
mod utils;

pub use action::{
    Action, ActionState, DEFAULT_MAX_REPEATS, HttpAction, RepeatCheck, RequestTemplate, RetryPolicy, RetryState, StatusHandler, Step, classify_response,
    next_step,
};
pub use config::{Config, RetryConfig, TransportConfig};
pub use error::HttptionError;
pub use option::ActionOption;
pub use reqwest::{Method, StatusCode, Url, header};
pub use tokio_util::sync::CancellationToken;
pub use transport::{HttpRequest, HttpResponse, LoggingTransport, ReqwestTransport, Transport};

/// Result type alias for Httption operations.
pub type Result<T> = std::result::Result<T, HttptionError>;
