//! Progress events published while a run is in flight.

use serde::Serialize;
use uuid::Uuid;

use crate::completion::CompletionReason;
use crate::model::{RunStatus, StepDescriptor, StepResult};
use crate::planner::{PlanOverview, PlanningMode};

/// One observable moment of a run. Publishing is fire-and-forget.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    RunStarted {
        run_id: Uuid,
        goal: String,
        max_iterations: u32,
        session_id: String,
    },
    PlanCreated {
        run_id: Uuid,
        iteration: u32,
        mode: PlanningMode,
        overview: PlanOverview,
        step: StepDescriptor,
    },
    StepDispatched {
        run_id: Uuid,
        iteration: u32,
        step_id: u64,
        task_name: String,
        tool: Option<String>,
    },
    StepCompleted {
        run_id: Uuid,
        iteration: u32,
        step_id: u64,
        result: StepResult,
    },
    NullIteration {
        run_id: Uuid,
        iteration: u32,
        reason: String,
    },
    EfficiencyWarning {
        run_id: Uuid,
        iteration: u32,
        step_id: u64,
        message: String,
    },
    RunFinished {
        run_id: Uuid,
        status: RunStatus,
        iterations: u32,
        reason: Option<CompletionReason>,
    },
}

impl ProgressEvent {
    pub fn run_id(&self) -> Uuid {
        match self {
            ProgressEvent::RunStarted { run_id, .. }
            | ProgressEvent::PlanCreated { run_id, .. }
            | ProgressEvent::StepDispatched { run_id, .. }
            | ProgressEvent::StepCompleted { run_id, .. }
            | ProgressEvent::NullIteration { run_id, .. }
            | ProgressEvent::EfficiencyWarning { run_id, .. }
            | ProgressEvent::RunFinished { run_id, .. } => *run_id,
        }
    }
}
