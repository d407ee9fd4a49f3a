//! Unified logging system
//!
//! Structured `tracing` output with configurable format and destination.
//! Logs go to stderr (or a file) so they never interleave with shell output.

use serde::{Deserialize, Serialize};
use std::io;
use std::sync::Arc;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty, compact)
    pub format: LogFormat,
    /// Whether to include file and line information
    pub include_location: bool,
    /// Whether to include thread information
    pub include_thread: bool,
    /// Append to this file instead of stderr
    pub log_file_path: Option<String>,
    /// Emit span close events with timings
    pub enable_performance_monitoring: bool,
    /// Custom filter directives
    pub filter_directives: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
            include_location: false,
            include_thread: false,
            log_file_path: None,
            enable_performance_monitoring: false,
            filter_directives: Vec::new(),
        }
    }
}

impl LoggingConfig {
    /// Debug-level output for the geomark crates
    pub fn verbose(mut self) -> Self {
        self.level = "debug".to_string();
        self.include_location = true;
        self.enable_performance_monitoring = true;
        self
    }
}

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over `config.level`. Fails if a global
/// subscriber is already installed.
pub fn init_logging(
    config: &LoggingConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    for directive in &config.filter_directives {
        filter = filter.add_directive(directive.parse()?);
    }

    let writer = match &config.log_file_path {
        Some(log_path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_path)?;
            BoxMakeWriter::new(Arc::new(file))
        }
        None => BoxMakeWriter::new(io::stderr),
    };

    let span_events = if config.enable_performance_monitoring {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let fmt_layer = fmt::layer()
        .with_writer(writer)
        .with_span_events(span_events)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_thread_ids(config.include_thread)
        .with_thread_names(config.include_thread);

    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => registry.with(fmt_layer.json()).try_init()?,
        LogFormat::Pretty => registry.with(fmt_layer.pretty()).try_init()?,
        LogFormat::Compact => registry.with(fmt_layer.compact()).try_init()?,
    }

    Ok(())
}

/// Timing helpers for operations that touch storage or wait on location
pub mod performance {
    use std::time::Instant;
    use tracing::{info_span, Instrument};

    /// Run `future` inside a `performance` span and log how long it took
    pub async fn measure_async<F, T>(operation: &str, future: F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        let started = Instant::now();
        let output = future
            .instrument(info_span!("performance", operation = operation))
            .await;
        report(operation, started);
        output
    }

    /// Synchronous counterpart of [`measure_async`]
    pub fn measure_sync<F, T>(operation: &str, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let started = Instant::now();
        let output = info_span!("performance", operation = operation).in_scope(f);
        report(operation, started);
        output
    }

    fn report(operation: &str, started: Instant) {
        tracing::debug!(
            target: "performance",
            operation = operation,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Timed operation finished"
        );
    }
}

/// Log the start of a user-visible operation
#[macro_export]
macro_rules! log_operation_start {
    ($operation:expr) => {
        tracing::debug!(operation = $operation, "Operation started");
    };
    ($operation:expr, $($field:tt)*) => {
        tracing::debug!(operation = $operation, $($field)*, "Operation started");
    };
}

/// Log the successful end of a user-visible operation
#[macro_export]
macro_rules! log_operation_success {
    ($operation:expr) => {
        tracing::info!(operation = $operation, "Operation succeeded");
    };
    ($operation:expr, $($field:tt)*) => {
        tracing::info!(operation = $operation, $($field)*, "Operation succeeded");
    };
}
