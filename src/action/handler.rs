use std::{fmt, sync::Arc};

use crate::transport::{HttpResponse, Transport};

type TransportPredicate = Arc<dyn Fn(&dyn Transport) -> bool + Send + Sync>;

/// Override registered for a single status code.
///
/// When the received status has a handler and the handler rejects, the
/// attempt fails with `HandlerRejected` no matter how the status would
/// normally be classified.
#[derive(Clone)]
pub enum StatusHandler {
    /// Always rejects.
    Reject,
    /// Rejects when the predicate, given the action's transport, returns true.
    Predicate(TransportPredicate),
}

impl StatusHandler {
    pub fn reject() -> Self {
        StatusHandler::Reject
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&dyn Transport) -> bool + Send + Sync + 'static,
    {
        StatusHandler::Predicate(Arc::new(f))
    }

    pub fn rejects(
        &self,
        transport: &dyn Transport,
    ) -> bool {
        match self {
            StatusHandler::Reject => true,
            StatusHandler::Predicate(predicate) => predicate(transport),
        }
    }
}

impl fmt::Debug for StatusHandler {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            StatusHandler::Reject => f.write_str("Reject"),
            StatusHandler::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Decides from a successful response whether the action has to run again.
#[derive(Clone)]
pub struct RepeatCheck(Arc<dyn Fn(&HttpResponse) -> bool + Send + Sync>);

impl RepeatCheck {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&HttpResponse) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn needs_repeat(
        &self,
        response: &HttpResponse,
    ) -> bool {
        (self.0)(response)
    }
}

impl fmt::Debug for RepeatCheck {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str("RepeatCheck(..)")
    }
}
