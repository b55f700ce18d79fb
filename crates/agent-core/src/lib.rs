//! WebPilot agent core.
//!
//! Data contracts, error taxonomy, planner, executor, completion predicate
//! and the iteration controller that ties them to one browser session.

pub mod agent_loop;
pub mod completion;
pub mod efficiency;
pub mod errors;
pub mod events;
pub mod executor;
pub mod model;
pub mod planner;
pub mod summarizer;

pub use agent_loop::{ActionTimeouts, AgentLoopConfig, IterationController};
pub use completion::{CompletionPolicy, CompletionReason};
pub use efficiency::{EfficiencyAudit, EfficiencyWarning};
pub use errors::{AgentError, RetryClass};
pub use events::ProgressEvent;
pub use executor::{StepExecutor, ToolExecutor, ToolInvocation, NO_MATCHING_TOOL};
pub use model::{
    ExecutionHistory, RunOutcome, RunStatus, StepDescriptor, StepResult, StepStatus,
};
pub use planner::{
    Plan, PlanGenerator, PlanOverview, PlanReply, PlannedStep, PlannedStepStatus, Planner,
    PlanningContext, PlanningMode, ScriptedPlanGenerator,
};
pub use summarizer::{PageSummarizer, TruncatingSummarizer};
