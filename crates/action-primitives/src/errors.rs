//! Error types for browser primitives

use thiserror::Error;

use crate::types::FaultClass;

/// Errors raised by [`crate::BrowserSession`] primitives.
///
/// Every variant maps onto exactly one [`FaultClass`] so callers never have
/// to inspect messages to decide how a failure should be reported.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// Page navigation (goto, back, reload) failed
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// A primitive exceeded its deadline
    #[error("Timed out after {timeout_ms}ms: {operation}")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Selector did not resolve to an element
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Arguments were rejected before touching the browser
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// CDP communication or protocol error
    #[error("CDP error: {0}")]
    Cdp(String),

    /// The session has already been closed
    #[error("Browser session closed")]
    SessionClosed,

    /// Browser process could not be started
    #[error("Browser launch failed: {0}")]
    Launch(String),
}

impl ActionError {
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Classify the error into the fixed fault set reported to the planner.
    pub fn fault_class(&self) -> FaultClass {
        match self {
            ActionError::NavigationFailed(_) => FaultClass::NavigationError,
            ActionError::Timeout { .. } => FaultClass::Timeout,
            ActionError::ElementNotFound(_) => FaultClass::ElementNotFound,
            ActionError::InvalidArgument(_)
            | ActionError::Cdp(_)
            | ActionError::SessionClosed
            | ActionError::Launch(_) => FaultClass::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_error_has_a_fault_class() {
        assert_eq!(
            ActionError::NavigationFailed("x".into()).fault_class(),
            FaultClass::NavigationError
        );
        assert_eq!(
            ActionError::timeout("click", 100).fault_class(),
            FaultClass::Timeout
        );
        assert_eq!(
            ActionError::ElementNotFound("#a".into()).fault_class(),
            FaultClass::ElementNotFound
        );
        assert_eq!(ActionError::SessionClosed.fault_class(), FaultClass::Other);
    }

    #[test]
    fn rejected_arguments_fall_into_other() {
        assert_eq!(
            ActionError::InvalidArgument("bad".into()).fault_class(),
            FaultClass::Other
        );
        assert_eq!(ActionError::Cdp("gone".into()).fault_class(), FaultClass::Other);
    }
}
