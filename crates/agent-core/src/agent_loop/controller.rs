//! Iteration Controller - drives planner and executor to convergence.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use action_primitives::{BrowserSession, PageState, SessionLauncher};
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tool_registry::ActionClass;
use tracing::{debug, info, warn};
use uuid::Uuid;
use webpilot_event_bus::EventBus;

use super::config::AgentLoopConfig;
use crate::completion::{CompletionPolicy, CompletionReason};
use crate::efficiency::EfficiencyAudit;
use crate::errors::AgentError;
use crate::events::ProgressEvent;
use crate::executor::StepExecutor;
use crate::model::{ExecutionHistory, RunOutcome, RunStatus, StepResult};
use crate::planner::{Plan, Planner, PlanningMode};

/// Owns one browser session per run and alternates planner and executor.
pub struct IterationController {
    config: Arc<AgentLoopConfig>,
    launcher: Arc<dyn SessionLauncher>,
    planner: Planner,
    executor: Arc<dyn StepExecutor>,
    completion: CompletionPolicy,
    audit: EfficiencyAudit,
    events: Option<Arc<dyn EventBus<ProgressEvent>>>,
    cancel: CancellationToken,
}

/// Per-run state, dropped when the run returns.
struct RunState {
    run_id: Uuid,
    history: ExecutionHistory,
    next_step_id: u64,
}

impl IterationController {
    pub fn new(
        config: Arc<AgentLoopConfig>,
        launcher: Arc<dyn SessionLauncher>,
        planner: Planner,
        executor: Arc<dyn StepExecutor>,
    ) -> Self {
        let completion = CompletionPolicy::new(&config.completion_phrases);
        let audit = EfficiencyAudit::new(&config.extraction_markers);
        Self {
            config,
            launcher,
            planner,
            executor,
            completion,
            audit,
            events: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_events(mut self, bus: Arc<dyn EventBus<ProgressEvent>>) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &AgentLoopConfig {
        &self.config
    }

    /// Token that stops the run at the next iteration boundary.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run `goal` for at most `max_iterations` iterations.
    ///
    /// Startup failures, invalid requests and terminal planner errors are
    /// returned as errors; every other failure is recorded in the history.
    /// The session is closed before any of them is returned.
    pub async fn run(&self, goal: &str, max_iterations: u32) -> Result<RunOutcome, AgentError> {
        let goal = goal.trim();
        if goal.is_empty() {
            return Err(AgentError::invalid_request("goal must not be empty"));
        }
        if max_iterations == 0 {
            return Err(AgentError::invalid_request(
                "max_iterations must be a positive integer",
            ));
        }

        let session = self
            .launcher
            .launch()
            .await
            .map_err(|err| AgentError::startup(err.to_string()))?;

        let run_id = Uuid::new_v4();
        info!(%run_id, session = session.session_id(), max_iterations, "run started");
        self.publish(ProgressEvent::RunStarted {
            run_id,
            goal: goal.to_string(),
            max_iterations,
            session_id: session.session_id().to_string(),
        });

        let driven = AssertUnwindSafe(self.drive(run_id, goal, max_iterations, session.as_ref()))
            .catch_unwind()
            .await;

        self.release(run_id, session.as_ref()).await;

        let (outcome, reason) = match driven {
            Ok(Ok(finished)) => finished,
            Ok(Err(err)) => {
                warn!(%run_id, error = %err, "run aborted by a terminal error");
                return Err(err);
            }
            Err(panic) => std::panic::resume_unwind(panic),
        };
        info!(
            %run_id,
            status = outcome.status.as_str(),
            iterations = outcome.iterations,
            steps = outcome.history.len(),
            "run finished"
        );
        self.publish(ProgressEvent::RunFinished {
            run_id,
            status: outcome.status,
            iterations: outcome.iterations,
            reason,
        });
        Ok(outcome)
    }

    async fn drive(
        &self,
        run_id: Uuid,
        goal: &str,
        max_iterations: u32,
        session: &dyn BrowserSession,
    ) -> Result<(RunOutcome, Option<CompletionReason>), AgentError> {
        let mut state = RunState {
            run_id,
            history: ExecutionHistory::new(),
            next_step_id: 1,
        };

        for iteration in 1..=max_iterations {
            if self.cancel.is_cancelled() {
                info!(%run_id, iteration, "run cancelled between iterations");
                return Ok((state.finish(RunStatus::Cancelled, iteration - 1), None));
            }

            let mode = PlanningMode::for_history(&state.history);
            let page = match mode {
                PlanningMode::Initial => None,
                PlanningMode::Iterative => self.observe(session).await,
            };
            let context = self.planner.context(
                goal,
                &state.history,
                iteration,
                state.next_step_id,
                page.as_ref(),
            );

            let plan = match self.plan(&context).await {
                Ok(plan) => plan,
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => {
                    warn!(%run_id, iteration, error = %err, "null iteration: no usable plan");
                    self.publish(ProgressEvent::NullIteration {
                        run_id,
                        iteration,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            state.next_step_id += 1;
            self.publish(ProgressEvent::PlanCreated {
                run_id,
                iteration,
                mode,
                overview: plan.overview.clone(),
                step: plan.step.clone(),
            });

            let result = self.execute(&state, iteration, session, &plan).await;
            if let Some(warning) = self.audit.audit(&plan.step, &result) {
                warn!(%run_id, iteration, step_id = warning.step_id, "{}", warning.message);
                self.publish(ProgressEvent::EfficiencyWarning {
                    run_id,
                    iteration,
                    step_id: warning.step_id,
                    message: warning.message,
                });
            }

            state.history.append(result.clone());
            self.publish(ProgressEvent::StepCompleted {
                run_id,
                iteration,
                step_id: plan.step.step_id,
                result,
            });

            if let Some(reason) = self
                .completion
                .evaluate(&plan.step, mode, state.history.last())
            {
                info!(%run_id, iteration, ?reason, "completion predicate satisfied");
                return Ok((state.finish(RunStatus::Completed, iteration), Some(reason)));
            }
        }

        Ok((
            state.finish(RunStatus::MaxIterationsReached, max_iterations),
            None,
        ))
    }

    async fn plan(&self, context: &crate::planner::PlanningContext) -> Result<Plan, AgentError> {
        let limit = self.config.planner_timeout();
        match tokio::time::timeout(limit, self.planner.plan(context)).await {
            Ok(result) => result,
            Err(_) => Err(AgentError::planning(format!(
                "plan generation timed out after {}ms",
                limit.as_millis()
            ))),
        }
    }

    async fn execute(
        &self,
        state: &RunState,
        iteration: u32,
        session: &dyn BrowserSession,
        plan: &Plan,
    ) -> StepResult {
        let step = &plan.step;
        info!(
            run_id = %state.run_id,
            iteration,
            step_id = step.step_id,
            tool = step.target_tool_hint.as_deref().unwrap_or("-"),
            "dispatching step: {}",
            step.task_name
        );
        self.publish(ProgressEvent::StepDispatched {
            run_id: state.run_id,
            iteration,
            step_id: step.step_id,
            task_name: step.task_name.clone(),
            tool: step.target_tool_hint.clone(),
        });
        match self.executor.execute(session, step).await {
            Ok(result) => result,
            Err(err) => {
                warn!(run_id = %state.run_id, iteration, error = %err, "executor raised; recording failure");
                StepResult::from_error(step, &err)
            }
        }
    }

    async fn release(&self, run_id: Uuid, session: &dyn BrowserSession) {
        let limit = self.config.timeouts.for_class(ActionClass::Navigation);
        match tokio::time::timeout(limit, session.close()).await {
            Ok(Ok(())) => debug!(%run_id, "browser session released"),
            Ok(Err(err)) => warn!(%run_id, error = %err, "failed to close browser session"),
            Err(_) => warn!(
                %run_id,
                timeout_ms = limit.as_millis() as u64,
                "browser session close timed out"
            ),
        }
    }

    async fn observe(&self, session: &dyn BrowserSession) -> Option<PageState> {
        let limit = self.config.timeouts.for_class(ActionClass::Query);
        match tokio::time::timeout(limit, session.snapshot()).await {
            Ok(Ok(page)) => Some(page),
            Ok(Err(err)) => {
                debug!(error = %err, "page snapshot unavailable");
                None
            }
            Err(_) => {
                debug!("page snapshot timed out");
                None
            }
        }
    }

    fn publish(&self, event: ProgressEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }
}

impl RunState {
    fn finish(self, status: RunStatus, iterations: u32) -> RunOutcome {
        RunOutcome {
            run_id: self.run_id,
            status,
            iterations,
            history: self.history,
        }
    }
}
