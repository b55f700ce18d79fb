//! Deterministic plan generator used for tests and offline development.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::errors::AgentError;

use super::{PlanGenerator, PlanningContext};

/// One scripted planner reply.
#[derive(Debug, Clone)]
pub enum PlanReply {
    Payload(Value),
    Fail(AgentError),
}

impl PlanReply {
    /// Well-formed INITIAL reply invoking `tool` with `args`.
    pub fn initial(tool: &str, args: Value) -> Self {
        Self::Payload(json!({
            "overall_task_name": "Scripted task",
            "master_thought": "Follow the script",
            "estimated_steps": 2,
            "steps": [{"name": format!("run {}", tool), "status": "IN_PROGRESS"}],
            "current_task": {
                "task_name": format!("Run {}", tool),
                "tool": tool,
                "tool_args": args,
                "rationale": "scripted"
            }
        }))
    }

    /// Well-formed ITERATIVE reply invoking `tool` with `args`.
    pub fn iterative(tool: &str, args: Value, is_final: bool) -> Self {
        Self::Payload(json!({
            "progress_analysis": "Previous step observed",
            "adaptation_reasoning": "Continue with the script",
            "remaining_work": if is_final { "none" } else { "more steps" },
            "task_is_final": is_final,
            "current_task": {
                "task_name": format!("Run {}", tool),
                "tool": tool,
                "tool_args": args,
                "rationale": "scripted"
            }
        }))
    }

    /// ITERATIVE reply declaring the task finished with no further action.
    pub fn finish() -> Self {
        Self::Payload(json!({
            "progress_analysis": "Goal reached",
            "adaptation_reasoning": "No adaptation needed",
            "remaining_work": "none",
            "task_is_final": true
        }))
    }

    pub fn fail(message: &str) -> Self {
        Self::Fail(AgentError::planning(message))
    }
}

/// Replays queued replies in order and records every context it was given.
#[derive(Debug, Default)]
pub struct ScriptedPlanGenerator {
    replies: Mutex<VecDeque<PlanReply>>,
    contexts: Mutex<Vec<PlanningContext>>,
}

impl ScriptedPlanGenerator {
    pub fn new(replies: impl IntoIterator<Item = PlanReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            contexts: Mutex::new(Vec::new()),
        }
    }

    pub fn contexts(&self) -> Vec<PlanningContext> {
        self.contexts.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.contexts.lock().len()
    }
}

#[async_trait]
impl PlanGenerator for ScriptedPlanGenerator {
    async fn generate_plan(&self, context: &PlanningContext) -> Result<Value, AgentError> {
        self.contexts.lock().push(context.clone());
        match self.replies.lock().pop_front() {
            Some(PlanReply::Payload(value)) => Ok(value),
            Some(PlanReply::Fail(err)) => Err(err),
            None => Err(AgentError::planning("no scripted reply left")),
        }
    }
}
