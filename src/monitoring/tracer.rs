/*!
 * Structured Tracing
 * Subscriber setup and timed operation spans using the tracing crate
 */

use std::time::Instant;
use tracing::{debug, info, span, Level, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError,
    EnvFilter,
};

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - SYNC_TRACE_JSON: Enable JSON output (default: false)
///
/// # Panics
///
/// Panics if a global subscriber is already installed; use
/// [`try_init_tracing`] where that can happen.
pub fn init_tracing() {
    if let Err(e) = try_init_tracing() {
        panic!("failed to install tracing subscriber: {e}");
    }
}

/// Initialize structured tracing unless a subscriber is already installed
pub fn try_init_tracing() -> Result<(), TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    if json_requested(std::env::var("SYNC_TRACE_JSON").ok().as_deref()) {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()?;
        info!("Structured tracing initialized with JSON output");
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
        info!("Structured tracing initialized");
    }
    Ok(())
}

fn json_requested(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("1") | Some("true"))
}

/// Span timing one operation; logs its duration when dropped
pub struct OperationSpan {
    span: Span,
    start: Instant,
    name: &'static str,
}

impl OperationSpan {
    pub fn new(name: &'static str) -> Self {
        let span = span!(
            Level::DEBUG,
            "operation",
            operation = name,
            items = tracing::field::Empty,
            result = tracing::field::Empty,
            duration_us = tracing::field::Empty,
        );
        Self {
            span,
            start: Instant::now(),
            name,
        }
    }

    /// Number of elements the operation handled
    pub fn record_items(&self, items: u64) {
        self.span.record("items", items);
    }

    /// Outcome of the operation
    pub fn record_result<V: std::fmt::Display>(&self, result: V) {
        self.span.record("result", tracing::field::display(result));
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Drop for OperationSpan {
    fn drop(&mut self) {
        let duration_us = self.start.elapsed().as_micros() as u64;
        self.span.record("duration_us", duration_us);
        let _entered = self.span.enter();
        debug!(operation = self.name, duration_us, "operation completed");
    }
}

/// Create a timed span for `name`
pub fn span_operation(name: &'static str) -> OperationSpan {
    OperationSpan::new(name)
}
