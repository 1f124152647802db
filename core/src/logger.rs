//! Request/response logging for the HTTP backend.
//!
//! One `RequestLogger` is built at startup and shared by reference with the
//! backends that use it. It numbers requests with an atomic counter so the
//! request line and the matching response line can be correlated. By default
//! lines go to the `log` facade; any `Fn(&str)` can replace that sink.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::ApiError;
use crate::http::HttpMethod;

/// Target used by the default sink.
pub const LOG_TARGET: &str = "restrepo";

/// Destination for formatted log lines.
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

pub struct RequestLogger {
    enabled: AtomicBool,
    counter: AtomicU64,
    sink: LogSink,
}

impl RequestLogger {
    pub fn new(enabled: bool) -> Self {
        Self::with_sink(enabled, Arc::new(|line: &str| log::info!(target: LOG_TARGET, "{line}")))
    }

    pub fn with_sink(enabled: bool, sink: LogSink) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            counter: AtomicU64::new(0),
            sink,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Claim the next request number and log the outgoing request.
    pub fn request(&self, method: HttpMethod, url: &str) -> u64 {
        let number = self.counter.fetch_add(1, Ordering::Relaxed);
        self.emit(format_args!("Request #{number} | URL: {url} | method: {method}"));
        number
    }

    /// Log the outcome of request `number`.
    pub fn response<T>(&self, number: u64, result: &Result<T, ApiError>) {
        match result {
            Ok(_) => self.emit(format_args!("Response #{number} | Success")),
            Err(error) => self.emit(format_args!("Response #{number} | Failure, error: {error}")),
        }
    }

    fn emit(&self, line: fmt::Arguments<'_>) {
        if self.is_enabled() {
            (self.sink)(&line.to_string());
        }
    }
}

impl Default for RequestLogger {
    fn default() -> Self {
        Self::new(true)
    }
}

impl fmt::Debug for RequestLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestLogger")
            .field("enabled", &self.is_enabled())
            .field("counter", &self.counter.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
