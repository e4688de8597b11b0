//! Harness error types.

use arbor_core::NodeError;
use thiserror::Error;

/// Errors raised while running a scenario.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("step '{step}' failed: {message}")]
    StepFailed { step: String, message: String },

    #[error("step '{step}': {message}")]
    AssertionFailed { step: String, message: String },

    #[error(transparent)]
    Node(#[from] NodeError),
}

impl HarnessError {
    pub fn step_failed(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StepFailed {
            step: step.into(),
            message: message.into(),
        }
    }

    pub fn assertion_failed(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            step: step.into(),
            message: message.into(),
        }
    }
}

/// Result type for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;
