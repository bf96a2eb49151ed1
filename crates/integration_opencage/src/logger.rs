//! Injected event logger
//!
//! Rate-limit information from response headers is reported to a callback
//! supplied through the client configuration rather than a global facility.
//! Internal diagnostics still go through `tracing`.

use std::fmt;
use std::sync::Arc;

/// Event name for the `X-RateLimit-Limit` header
pub const RATE_LIMIT_LIMIT_EVENT: &str = "opencagedata:api:X-RateLimit-Limit";

/// Event name for the `X-RateLimit-Remaining` header
pub const RATE_LIMIT_REMAINING_EVENT: &str = "opencagedata:api:X-RateLimit-Remaining";

/// Event name for the `X-RateLimit-Reset` header
pub const RATE_LIMIT_RESET_EVENT: &str = "opencagedata:api:X-RateLimit-Reset";

type LogFn = dyn Fn(&str, Option<&str>) + Send + Sync;

/// Callback receiving `(event_name, value)` pairs
///
/// `value` is `None` when the header behind the event was absent. The
/// default logger discards everything.
#[derive(Clone, Default)]
pub struct EventLogger {
    inner: Option<Arc<LogFn>>,
}

impl EventLogger {
    /// Wrap a callback
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, Option<&str>) + Send + Sync + 'static,
    {
        Self {
            inner: Some(Arc::new(f)),
        }
    }

    /// A logger that discards every event
    #[must_use]
    pub const fn noop() -> Self {
        Self { inner: None }
    }

    /// Report an event
    pub fn log(&self, event: &str, value: Option<&str>) {
        if let Some(f) = &self.inner {
            f(event, value);
        }
    }

    /// Returns true if a callback is installed
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }
}

impl fmt::Debug for EventLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLogger")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn test_noop_logger() {
        let logger = EventLogger::default();
        assert!(!logger.is_enabled());
        logger.log(RATE_LIMIT_RESET_EVENT, Some("60"));
    }

    #[test]
    fn test_callback_receives_events() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let logger = EventLogger::new(move |event, value| {
            sink.lock()
                .unwrap()
                .push((event.to_string(), value.map(str::to_string)));
        });

        logger.log(RATE_LIMIT_LIMIT_EVENT, Some("2500"));
        logger.log(RATE_LIMIT_REMAINING_EVENT, None);

        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                (RATE_LIMIT_LIMIT_EVENT.to_string(), Some("2500".to_string())),
                (RATE_LIMIT_REMAINING_EVENT.to_string(), None),
            ]
        );
    }

    #[test]
    fn test_clones_share_callback() {
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        let logger = EventLogger::new(move |_, _| *sink.lock().unwrap() += 1);
        let cloned = logger.clone();

        logger.log("a", None);
        cloned.log("b", None);
        assert_eq!(*count.lock().unwrap(), 2);
    }

    #[test]
    fn test_debug_hides_callback() {
        let logger = EventLogger::new(|_, _| {});
        assert_eq!(format!("{logger:?}"), "EventLogger { enabled: true }");
    }
}
