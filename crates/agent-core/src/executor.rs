//! Executor: resolves a step's tool and runs it against the session.
//!
//! [`ToolExecutor`] is the containment boundary for browser-side faults:
//! timeouts, adapter failures and adapter panics all come back as a
//! [`StepResult`], never as an error or an unwind.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use action_primitives::{BrowserSession, FaultClass};
use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use tool_registry::{ActionOutcome, ToolAdapter, ToolRegistry};
use tracing::{info, warn};

use crate::agent_loop::ActionTimeouts;
use crate::errors::AgentError;
use crate::model::{StepDescriptor, StepResult, StepStatus};

/// `error_details` of a step whose tool could not be resolved.
pub const NO_MATCHING_TOOL: &str = "no matching tool";

#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn execute(
        &self,
        session: &dyn BrowserSession,
        step: &StepDescriptor,
    ) -> Result<StepResult, AgentError>;
}

/// One adapter call, kept for logging only.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub tool_name: String,
    pub arguments: Value,
    pub outcome: ActionOutcome,
    pub latency: Duration,
}

pub struct ToolExecutor {
    registry: ToolRegistry,
    timeouts: ActionTimeouts,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry, timeouts: ActionTimeouts) -> Self {
        Self { registry, timeouts }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    async fn invoke(
        &self,
        session: &dyn BrowserSession,
        adapter: Arc<dyn ToolAdapter>,
        args: &Value,
    ) -> ToolInvocation {
        let limit = self.timeouts.for_class(adapter.action_class());
        let started = Instant::now();
        let call = AssertUnwindSafe(adapter.invoke(session, args)).catch_unwind();
        let outcome = match tokio::time::timeout(limit, call).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(panic)) => ActionOutcome::rejected(format!(
                "{} aborted unexpectedly: {}",
                adapter.name(),
                panic_message(panic.as_ref())
            )),
            Err(_) => ActionOutcome {
                succeeded: false,
                message: format!(
                    "{} timed out after {}ms",
                    adapter.name(),
                    limit.as_millis()
                ),
                fault_class: FaultClass::Timeout,
                side_effect_applied: false,
                outputs: Vec::new(),
            },
        };
        ToolInvocation {
            tool_name: adapter.name().to_string(),
            arguments: args.clone(),
            outcome,
            latency: started.elapsed(),
        }
    }

    async fn page_context(&self, session: &dyn BrowserSession) -> Option<String> {
        let limit = self.timeouts.for_class(tool_registry::ActionClass::Query);
        match tokio::time::timeout(limit, session.current_url()).await {
            Ok(Ok(url)) => Some(format!("Current page: {}", url)),
            _ => None,
        }
    }
}

#[async_trait]
impl StepExecutor for ToolExecutor {
    async fn execute(
        &self,
        session: &dyn BrowserSession,
        step: &StepDescriptor,
    ) -> Result<StepResult, AgentError> {
        let Some(hint) = step.target_tool_hint.as_deref() else {
            if step.is_final {
                return Ok(StepResult::success(
                    step.task_name.clone(),
                    "reported task completion without a browser action",
                ));
            }
            return Ok(unresolved(step, "<none>"));
        };

        let Some(adapter) = self.registry.resolve(hint) else {
            warn!(
                step_id = step.step_id,
                error = %AgentError::tool_resolution(hint),
                "step requested an unregistered tool"
            );
            return Ok(unresolved(step, hint));
        };

        let invocation = self.invoke(session, adapter, &step.tool_args).await;
        let latency_ms = invocation.latency.as_millis() as u64;
        let status = status_of(&invocation.outcome);
        if status == StepStatus::Success {
            info!(
                step_id = step.step_id,
                tool = %invocation.tool_name,
                latency_ms,
                status = status.as_str(),
                "{}",
                invocation.outcome.message
            );
        } else {
            warn!(
                step_id = step.step_id,
                tool = %invocation.tool_name,
                latency_ms,
                status = status.as_str(),
                fault = %invocation.outcome.fault_class,
                error = %AgentError::tool_execution(invocation.outcome.message.clone()),
                "tool invocation did not succeed"
            );
        }

        let outcome = invocation.outcome;
        let mut result = StepResult {
            status,
            step_description: describe(step, &invocation.tool_name),
            result_summary: outcome.message.clone(),
            error_details: None,
            suggestions_for_planner: suggestion_for(outcome.fault_class).map(str::to_string),
            outputs_created: outcome.outputs,
            next_step_context: self.page_context(session).await,
        };
        if status != StepStatus::Success {
            result.error_details = Some(format!("{}: {}", outcome.fault_class, outcome.message));
        }
        Ok(result)
    }
}

fn unresolved(step: &StepDescriptor, hint: &str) -> StepResult {
    StepResult::failure(
        step.task_name.clone(),
        format!("no adapter registered for tool '{}'", hint),
        NO_MATCHING_TOOL,
    )
    .with_suggestions("Pick a tool from the catalog of available browser tools.")
}

fn status_of(outcome: &ActionOutcome) -> StepStatus {
    if outcome.succeeded {
        StepStatus::Success
    } else if outcome.side_effect_applied {
        StepStatus::PartialFailure
    } else {
        StepStatus::Failure
    }
}

fn describe(step: &StepDescriptor, tool: &str) -> String {
    format!("{} (step {}, {})", step.task_name, step.step_id, tool)
}

fn suggestion_for(fault: FaultClass) -> Option<&'static str> {
    match fault {
        FaultClass::None => None,
        FaultClass::Timeout => {
            Some("The action timed out; wait for the page to settle or target a more specific element.")
        }
        FaultClass::ElementNotFound => {
            Some("The selector matched nothing; re-read the page and choose a different selector.")
        }
        FaultClass::NavigationError => {
            Some("Navigation failed; check the url or go back and try another route.")
        }
        FaultClass::Other => Some("Check the tool arguments against the tool catalog."),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::mock::{Primitive, ScriptedSession};
    use action_primitives::ActionError;
    use serde_json::json;
    use tool_registry::{ActionClass, BuiltinOptions};

    fn executor(timeouts: ActionTimeouts) -> ToolExecutor {
        let registry = ToolRegistry::with_builtin_tools(&BuiltinOptions::default()).unwrap();
        ToolExecutor::new(registry, timeouts)
    }

    fn step(tool: Option<&str>, args: Value) -> StepDescriptor {
        StepDescriptor {
            step_id: 1,
            task_name: "Do it".into(),
            target_tool_hint: tool.map(str::to_string),
            tool_args: args,
            rationale: String::new(),
            subtasks: Vec::new(),
            expected_outputs: Vec::new(),
            is_final: false,
        }
    }

    #[tokio::test]
    async fn unknown_tool_fails_without_side_effects() {
        let session = ScriptedSession::new();
        let result = executor(ActionTimeouts::default())
            .execute(&session, &step(Some("delete_everything"), json!({})))
            .await
            .unwrap();
        assert_eq!(result.status, StepStatus::Failure);
        assert_eq!(result.error_details.as_deref(), Some(NO_MATCHING_TOOL));
        assert!(session.browser_actions().is_empty());
    }

    #[tokio::test]
    async fn success_summary_names_action_and_target() {
        let session = ScriptedSession::new();
        let result = executor(ActionTimeouts::default())
            .execute(
                &session,
                &step(Some("navigate"), json!({"url": "https://example.com"})),
            )
            .await
            .unwrap();
        assert_eq!(result.status, StepStatus::Success);
        assert_eq!(result.result_summary, "navigated to https://example.com");
        assert!(result.error_details.is_none());
        assert_eq!(
            result.next_step_context.as_deref(),
            Some("Current page: https://example.com/")
        );
    }

    #[tokio::test]
    async fn timed_out_adapter_becomes_failure() {
        let session =
            ScriptedSession::new().delay(Primitive::Hover, Duration::from_millis(500));
        let timeouts = ActionTimeouts {
            interaction_ms: 20,
            ..ActionTimeouts::default()
        };
        let result = executor(timeouts)
            .execute(&session, &step(Some("hover"), json!({"selector": "#menu"})))
            .await
            .unwrap();
        assert_eq!(result.status, StepStatus::Failure);
        assert!(result.error_details.unwrap().starts_with("timeout"));
    }

    #[tokio::test]
    async fn applied_side_effect_with_failed_wait_is_partial() {
        let session = ScriptedSession::new().fail_on(
            Primitive::WaitForNavigation,
            ActionError::timeout("wait for navigation", 100),
        );
        let result = executor(ActionTimeouts::default())
            .execute(
                &session,
                &step(
                    Some("click"),
                    json!({"selector": "#next", "wait_for_navigation": true}),
                ),
            )
            .await
            .unwrap();
        assert_eq!(result.status, StepStatus::PartialFailure);
        assert!(result.error_details.is_some());
    }

    #[tokio::test]
    async fn final_step_without_tool_reports_completion() {
        let session = ScriptedSession::new();
        let mut final_step = step(None, Value::Null);
        final_step.is_final = true;
        let result = executor(ActionTimeouts::default())
            .execute(&session, &final_step)
            .await
            .unwrap();
        assert_eq!(result.status, StepStatus::Success);
        assert!(session.browser_actions().is_empty());
    }

    struct Panicking;

    #[async_trait]
    impl ToolAdapter for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }
        fn description(&self) -> &str {
            "always panics"
        }
        fn parameters(&self) -> Value {
            json!({"type": "object"})
        }
        fn idempotent(&self) -> bool {
            true
        }
        fn action_class(&self) -> ActionClass {
            ActionClass::Query
        }
        async fn invoke(&self, _session: &dyn BrowserSession, _args: &Value) -> ActionOutcome {
            panic!("adapter bug")
        }
    }

    #[tokio::test]
    async fn adapter_panic_is_contained() {
        let registry = ToolRegistry::builder()
            .register(Arc::new(Panicking))
            .unwrap()
            .build();
        let executor = ToolExecutor::new(registry, ActionTimeouts::default());
        let session = ScriptedSession::new();
        let result = executor
            .execute(&session, &step(Some("panicking"), json!({})))
            .await
            .unwrap();
        assert_eq!(result.status, StepStatus::Failure);
        assert!(result.result_summary.contains("adapter bug"));
    }
}
