//! Planner: turns goal and execution history into the next step.
//!
//! The planner never touches the browser. Plan generation itself is an
//! opaque [`PlanGenerator`]; the planner picks the mode, assembles the
//! context, numbers the step and parses the reply strictly.

mod payload;
mod scripted;

use std::sync::Arc;

use action_primitives::PageState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::errors::AgentError;
use crate::model::{ExecutionHistory, StepResult};
use crate::summarizer::PageSummarizer;

pub use payload::{
    extract_json_object, parse_plan, Plan, PlanOverview, PlannedStep, PlannedStepStatus,
};
pub use scripted::{PlanReply, ScriptedPlanGenerator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanningMode {
    /// Nothing has executed yet
    Initial,
    /// At least one step result exists
    Iterative,
}

impl PlanningMode {
    pub fn for_history(history: &ExecutionHistory) -> Self {
        if history.is_empty() {
            PlanningMode::Initial
        } else {
            PlanningMode::Iterative
        }
    }
}

/// Everything the plan generator may read for one call.
#[derive(Debug, Clone, Serialize)]
pub struct PlanningContext {
    pub goal: String,
    pub mode: PlanningMode,
    pub iteration: u32,
    pub step_id: u64,
    /// Result of the most recent executed step
    pub previous_result: Option<StepResult>,
    pub history: Vec<StepResult>,
    pub progress_summary: String,
    pub page_summary: Option<String>,
    pub tool_catalog: String,
}

/// Opaque "produce a structured plan" capability.
///
/// Returns the raw reply object (or a string containing one); transport
/// failures are [`AgentError::Planning`].
#[async_trait]
pub trait PlanGenerator: Send + Sync {
    async fn generate_plan(&self, context: &PlanningContext) -> Result<Value, AgentError>;
}

pub struct Planner {
    generator: Arc<dyn PlanGenerator>,
    summarizer: Arc<dyn PageSummarizer>,
    tool_catalog: String,
}

impl Planner {
    pub fn new(
        generator: Arc<dyn PlanGenerator>,
        summarizer: Arc<dyn PageSummarizer>,
        tool_catalog: impl Into<String>,
    ) -> Self {
        Self {
            generator,
            summarizer,
            tool_catalog: tool_catalog.into(),
        }
    }

    /// Assemble the planning context from state available after the last append.
    pub fn context(
        &self,
        goal: &str,
        history: &ExecutionHistory,
        iteration: u32,
        step_id: u64,
        page: Option<&PageState>,
    ) -> PlanningContext {
        PlanningContext {
            goal: goal.to_string(),
            mode: PlanningMode::for_history(history),
            iteration,
            step_id,
            previous_result: history.last().cloned(),
            history: history.as_slice().to_vec(),
            progress_summary: format!(
                "Iteration {}, completed {} tasks ({} succeeded)",
                iteration,
                history.len(),
                history.success_count()
            ),
            page_summary: page.map(|page| self.summarizer.summarize(page)),
            tool_catalog: self.tool_catalog.clone(),
        }
    }

    pub async fn plan(&self, context: &PlanningContext) -> Result<Plan, AgentError> {
        let reply = self.generator.generate_plan(context).await?;
        debug!(iteration = context.iteration, payload = %reply, "planner reply");
        parse_plan(context.mode, reply, context.step_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarizer::TruncatingSummarizer;

    fn planner(generator: ScriptedPlanGenerator) -> Planner {
        Planner::new(
            Arc::new(generator),
            Arc::new(TruncatingSummarizer::new(200)),
            "catalog",
        )
    }

    #[test]
    fn mode_follows_history() {
        let mut history = ExecutionHistory::new();
        assert_eq!(PlanningMode::for_history(&history), PlanningMode::Initial);
        history.append(StepResult::success("a", "b"));
        assert_eq!(PlanningMode::for_history(&history), PlanningMode::Iterative);
    }

    #[tokio::test]
    async fn plan_assigns_context_step_id() {
        let generator = ScriptedPlanGenerator::new([PlanReply::initial(
            "navigate",
            serde_json::json!({"url": "https://example.com"}),
        )]);
        let planner = planner(generator);
        let ctx = planner.context("visit", &ExecutionHistory::new(), 1, 42, None);
        let plan = planner.plan(&ctx).await.unwrap();
        assert_eq!(plan.step.step_id, 42);
        assert!(matches!(plan.overview, PlanOverview::Initial { .. }));
    }

    #[tokio::test]
    async fn context_carries_previous_result_and_summary() {
        let planner = planner(ScriptedPlanGenerator::new(Vec::<PlanReply>::new()));
        let mut history = ExecutionHistory::new();
        history.append(StepResult::success("Open", "navigated to https://example.com"));
        let page = PageState {
            url: "https://example.com/".into(),
            title: None,
            text: "Example Domain".into(),
        };
        let ctx = planner.context("visit", &history, 2, 2, Some(&page));
        assert_eq!(ctx.mode, PlanningMode::Iterative);
        assert_eq!(
            ctx.previous_result.unwrap().result_summary,
            "navigated to https://example.com"
        );
        assert!(ctx.progress_summary.starts_with("Iteration 2, completed 1 tasks"));
        assert!(ctx.page_summary.unwrap().contains("Example Domain"));
    }
}
