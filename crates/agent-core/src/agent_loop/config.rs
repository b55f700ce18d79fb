//! Configuration for the iteration controller.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tool_registry::ActionClass;

/// Hard timeouts per action class, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionTimeouts {
    /// Read-only queries such as get_current_url.
    /// Default: 5000
    pub query_ms: u64,

    /// Element interactions.
    /// Default: 15000
    pub interaction_ms: u64,

    /// Screenshots.
    /// Default: 20000
    pub capture_ms: u64,

    /// navigate, go_back, reload.
    /// Default: 45000
    pub navigation_ms: u64,

    /// Credential resolution plus page load.
    /// Default: 60000
    pub authentication_ms: u64,
}

impl Default for ActionTimeouts {
    fn default() -> Self {
        Self {
            query_ms: 5_000,
            interaction_ms: 15_000,
            capture_ms: 20_000,
            navigation_ms: 45_000,
            authentication_ms: 60_000,
        }
    }
}

impl ActionTimeouts {
    pub fn for_class(&self, class: ActionClass) -> Duration {
        let ms = match class {
            ActionClass::Query => self.query_ms,
            ActionClass::Interaction => self.interaction_ms,
            ActionClass::Capture => self.capture_ms,
            ActionClass::Navigation => self.navigation_ms,
            ActionClass::Authentication => self.authentication_ms,
        };
        Duration::from_millis(ms.max(1))
    }
}

/// Configuration for the plan/execute loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentLoopConfig {
    /// Iteration ceiling used when the caller does not pass one.
    /// Default: 5
    pub max_iterations: u32,

    /// Phrases that mark a successful step as the end of the task when the
    /// planner does not set the final flag. Matched case-insensitively.
    /// Default: empty; supplied by the configuration file.
    pub completion_phrases: Vec<String>,

    /// Words in a result summary that indicate content extraction, used by
    /// the efficiency audit.
    pub extraction_markers: Vec<String>,

    pub timeouts: ActionTimeouts,

    /// Timeout for one plan-generation call in milliseconds.
    /// Default: 120000
    pub planner_timeout_ms: u64,

    /// Upper bound on the page summary handed to the planner.
    /// Default: 4000
    pub summary_max_chars: usize,

    /// Buffered progress events per subscriber.
    /// Default: 256
    pub event_capacity: usize,
}

impl Default for AgentLoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            completion_phrases: Vec::new(),
            extraction_markers: vec!["html".to_string(), "parsed".to_string()],
            timeouts: ActionTimeouts::default(),
            planner_timeout_ms: 120_000,
            summary_max_chars: 4_000,
            event_capacity: 256,
        }
    }
}

impl AgentLoopConfig {
    pub fn planner_timeout(&self) -> Duration {
        Duration::from_millis(self.planner_timeout_ms.max(1))
    }

    pub fn with_completion_phrases<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.completion_phrases = phrases.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeouts(mut self, timeouts: ActionTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }
}
