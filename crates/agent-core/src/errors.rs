use thiserror::Error;

/// Whether the iteration loop may continue after an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// Absorbed into the run; the planner adapts on the next iteration.
    Retryable,
    /// Aborts the run and is surfaced to the caller.
    Terminal,
}

/// Errors emitted by the agent-core crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// The browser session could not be acquired.
    #[error("browser session startup failed: {0}")]
    Startup(String),

    /// Plan generation failed in transport or returned an unusable payload.
    #[error("plan generation failed: {0}")]
    Planning(String),

    /// The requested tool has no registered adapter.
    #[error("no matching tool: {0}")]
    ToolResolution(String),

    /// An adapter invocation failed or timed out.
    #[error("tool execution failed: {0}")]
    ToolExecution(String),

    /// A step result payload did not match the structured contract.
    #[error("malformed step result: {message}")]
    Serialization { message: String, raw: String },

    /// Raised when an agent request is malformed or missing required fields.
    #[error("invalid agent request: {0}")]
    InvalidRequest(String),
}

impl AgentError {
    pub fn startup(message: impl Into<String>) -> Self {
        Self::Startup(message.into())
    }

    pub fn planning(message: impl Into<String>) -> Self {
        Self::Planning(message.into())
    }

    pub fn tool_resolution(tool: impl Into<String>) -> Self {
        Self::ToolResolution(tool.into())
    }

    pub fn tool_execution(message: impl Into<String>) -> Self {
        Self::ToolExecution(message.into())
    }

    pub fn serialization(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
            raw: raw.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn retry_class(&self) -> RetryClass {
        match self {
            AgentError::Startup(_) | AgentError::InvalidRequest(_) => RetryClass::Terminal,
            AgentError::Planning(_)
            | AgentError::ToolResolution(_)
            | AgentError::ToolExecution(_)
            | AgentError::Serialization { .. } => RetryClass::Retryable,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.retry_class() == RetryClass::Retryable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_startup_and_bad_requests_are_terminal() {
        assert_eq!(AgentError::startup("no chrome").retry_class(), RetryClass::Terminal);
        assert_eq!(
            AgentError::invalid_request("empty goal").retry_class(),
            RetryClass::Terminal
        );
        assert!(AgentError::planning("timeout").is_retryable());
        assert!(AgentError::tool_resolution("x").is_retryable());
        assert!(AgentError::tool_execution("x").is_retryable());
        assert!(AgentError::serialization("bad", "{").is_retryable());
    }
}
