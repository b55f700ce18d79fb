//! Data contracts shared by the planner, executor and controller.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AgentError;

/// Status of an executed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Success,
    Failure,
    PartialFailure,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Success => "SUCCESS",
            StepStatus::Failure => "FAILURE",
            StepStatus::PartialFailure => "PARTIAL_FAILURE",
        }
    }
}

/// One planned unit of work for a single iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDescriptor {
    /// Monotonically increasing within a run
    pub step_id: u64,
    pub task_name: String,
    /// Tool name as the planner wrote it; resolved by the executor
    pub target_tool_hint: Option<String>,
    /// Arguments object handed to the tool adapter
    #[serde(default)]
    pub tool_args: Value,
    pub rationale: String,
    #[serde(default)]
    pub subtasks: Vec<String>,
    #[serde(default)]
    pub expected_outputs: Vec<String>,
    /// Planner's claim that this is the last step
    #[serde(default)]
    pub is_final: bool,
}

/// Structured outcome of executing one [`StepDescriptor`].
///
/// `error_details` is expected only for non-success results; this is a
/// convention of the constructors, not enforced by the type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub status: StepStatus,
    pub step_description: String,
    pub result_summary: String,
    #[serde(default)]
    pub error_details: Option<String>,
    #[serde(default)]
    pub suggestions_for_planner: Option<String>,
    #[serde(default)]
    pub outputs_created: Vec<String>,
    #[serde(default)]
    pub next_step_context: Option<String>,
}

impl StepResult {
    pub fn success(step_description: impl Into<String>, result_summary: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Success,
            step_description: step_description.into(),
            result_summary: result_summary.into(),
            error_details: None,
            suggestions_for_planner: None,
            outputs_created: Vec::new(),
            next_step_context: None,
        }
    }

    pub fn failure(
        step_description: impl Into<String>,
        result_summary: impl Into<String>,
        error_details: impl Into<String>,
    ) -> Self {
        Self {
            status: StepStatus::Failure,
            step_description: step_description.into(),
            result_summary: result_summary.into(),
            error_details: Some(error_details.into()),
            suggestions_for_planner: None,
            outputs_created: Vec::new(),
            next_step_context: None,
        }
    }

    /// FAILURE result synthesized from an executor error.
    ///
    /// Serialization errors keep the raw payload so the planner can see
    /// what the executor actually produced.
    pub fn from_error(step: &StepDescriptor, err: &AgentError) -> Self {
        let details = match err {
            AgentError::Serialization { message, raw } => {
                format!("{}; raw payload: {}", message, raw)
            }
            other => other.to_string(),
        };
        Self::failure(
            step.task_name.clone(),
            format!("step {} could not be executed", step.step_id),
            details,
        )
    }

    /// Parse a JSON step result produced outside the tool executor.
    pub fn from_payload(raw: &str) -> Result<Self, AgentError> {
        serde_json::from_str::<StepResult>(raw.trim())
            .map_err(|err| AgentError::serialization(err.to_string(), raw))
    }

    pub fn with_suggestions(mut self, suggestions: impl Into<String>) -> Self {
        self.suggestions_for_planner = Some(suggestions.into());
        self
    }

    pub fn with_next_step_context(mut self, context: impl Into<String>) -> Self {
        self.next_step_context = Some(context.into());
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<String>) -> Self {
        self.outputs_created = outputs;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Success
    }
}

/// Ordered, append-only record of step results for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionHistory {
    results: Vec<StepResult>,
}

impl ExecutionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, result: StepResult) {
        self.results.push(result);
    }

    pub fn last(&self) -> Option<&StepResult> {
        self.results.last()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepResult> {
        self.results.iter()
    }

    pub fn as_slice(&self) -> &[StepResult] {
        &self.results
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }
}

/// Final status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Completed,
    MaxIterationsReached,
    Cancelled,
    StartupFailed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Completed => "COMPLETED",
            RunStatus::MaxIterationsReached => "MAX_ITERATIONS_REACHED",
            RunStatus::Cancelled => "CANCELLED",
            RunStatus::StartupFailed => "STARTUP_FAILED",
        }
    }
}

/// What `run` returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub status: RunStatus,
    /// Iterations consumed, including null iterations
    pub iterations: u32,
    pub history: ExecutionHistory,
}

impl RunOutcome {
    /// Outcome reported by hosts that need a value when startup failed.
    pub fn startup_failed(run_id: Uuid) -> Self {
        Self {
            run_id,
            status: RunStatus::StartupFailed,
            iterations: 0,
            history: ExecutionHistory::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }
}
