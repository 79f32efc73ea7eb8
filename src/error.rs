//! Error types shared across the pipeline
//!
//! Three failure classes, matching where in a step's lifecycle they occur:
//! - Configuration: startup-time, before any row flows
//! - Planning: per processing unit, during mutation planning
//! - Sink: opaque passthrough of lookup/apply failures

use thiserror::Error;

/// Result alias used throughout the crate
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors produced by the planning and application engine
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid or incomplete configuration, detected at step construction
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A planner rejected its input; propagates to the execution engine,
    /// which decides whether to retry the whole unit
    #[error("planning error: {0}")]
    Planning(String),

    /// A sink lookup or apply call failed; no retry or rollback is added here
    #[error("sink error: {message}")]
    Sink {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PipelineError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a planning error
    pub fn planning(message: impl Into<String>) -> Self {
        Self::Planning(message.into())
    }

    /// Create a sink error without an underlying cause
    pub fn sink(message: impl Into<String>) -> Self {
        Self::Sink {
            message: message.into(),
            source: None,
        }
    }

    /// Create a sink error wrapping an underlying cause
    pub fn sink_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Sink {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether this is a startup-time configuration failure
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::config("key field list is empty");
        assert_eq!(
            err.to_string(),
            "configuration error: key field list is empty"
        );
        assert!(err.is_configuration());

        let err = PipelineError::sink("connection refused");
        assert_eq!(err.to_string(), "sink error: connection refused");
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_sink_error_source() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = PipelineError::sink_with_source("apply failed", io);
        let source = std::error::Error::source(&err).expect("source attached");
        assert_eq!(source.to_string(), "pipe closed");
    }
}
