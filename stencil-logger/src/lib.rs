//! # Stencil Logger
//!
//! Logging and tracing support for Stencil template runs

use std::error::Error as _;
use stencil_context::ActionError;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info";

/// Initialize the tracing subscriber.
///
/// The filter comes from `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
/// Calling this more than once keeps the first subscriber.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if result.is_err() {
        debug!("tracing subscriber already installed");
    }
}

/// Logger for one template run
pub struct Logger {
    pub execution_id: String,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Create a new logger
    pub fn new() -> Self {
        Self {
            execution_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create a logger with a specific execution ID
    pub fn with_execution_id(execution_id: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
        }
    }

    pub fn info(&self, message: &str) {
        info!(execution_id = %self.execution_id, "{}", message);
    }

    pub fn warn(&self, message: &str) {
        warn!(execution_id = %self.execution_id, "{}", message);
    }

    /// Log a failed run: the error, its cause chain and every trace frame,
    /// innermost first.
    pub fn log_failure(&self, failure: &ActionError) {
        error!(
            execution_id = %self.execution_id,
            reason = %failure.reason(),
            frames = failure.tracing().len(),
            "Template failed: {}",
            failure.message()
        );

        let mut source = failure.source();
        while let Some(cause) = source {
            debug!(execution_id = %self.execution_id, "caused by: {}", cause);
            source = cause.source();
        }

        for (depth, frame) in failure.tracing().iter().enumerate() {
            match &frame.source {
                Some(location) => error!(
                    execution_id = %self.execution_id,
                    depth = depth,
                    step = %frame.name,
                    location = %location,
                    "Failed step"
                ),
                None => error!(
                    execution_id = %self.execution_id,
                    depth = depth,
                    step = %frame.name,
                    "Failed step"
                ),
            }
        }
    }
}
