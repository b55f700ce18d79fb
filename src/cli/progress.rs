//! Terminal rendering of progress events.

use agent_core::{PlanOverview, ProgressEvent, StepStatus};

/// One human-readable line per event.
pub fn render(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::RunStarted {
            goal,
            max_iterations,
            session_id,
            ..
        } => format!(
            "▶ goal: {} (up to {} iterations, session {})",
            goal, max_iterations, session_id
        ),
        ProgressEvent::PlanCreated {
            iteration,
            overview,
            step,
            ..
        } => {
            let headline = match overview {
                PlanOverview::Initial { .. } => format!("plan: {}", overview.headline()),
                PlanOverview::Iterative { .. } => overview.headline(),
            };
            let marker = if step.is_final { " [final]" } else { "" };
            format!(
                "[{}] {} → step {}: {}{}",
                iteration, headline, step.step_id, step.task_name, marker
            )
        }
        ProgressEvent::StepDispatched {
            iteration,
            step_id,
            tool,
            ..
        } => format!(
            "[{}]   dispatch step {} via {}",
            iteration,
            step_id,
            tool.as_deref().unwrap_or("(no tool)")
        ),
        ProgressEvent::StepCompleted {
            iteration, result, ..
        } => {
            let symbol = match result.status {
                StepStatus::Success => "✓",
                StepStatus::PartialFailure => "~",
                StepStatus::Failure => "✗",
            };
            let mut line = format!("[{}]   {} {}", iteration, symbol, result.result_summary);
            if let Some(details) = &result.error_details {
                line.push_str(&format!(" ({})", details));
            }
            for output in &result.outputs_created {
                line.push_str(&format!("\n[{}]     output: {}", iteration, output));
            }
            line
        }
        ProgressEvent::NullIteration {
            iteration, reason, ..
        } => format!("[{}]   ! no usable plan: {}", iteration, reason),
        ProgressEvent::EfficiencyWarning {
            iteration, message, ..
        } => format!("[{}]   ! {}", iteration, message),
        ProgressEvent::RunFinished {
            status, iterations, ..
        } => format!("■ {} after {} iterations", status.as_str(), iterations),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{RunStatus, StepResult};
    use uuid::Uuid;

    #[test]
    fn failed_steps_show_details() {
        let line = render(&ProgressEvent::StepCompleted {
            run_id: Uuid::nil(),
            iteration: 2,
            step_id: 2,
            result: StepResult::failure("Open", "no adapter registered", "no matching tool"),
        });
        assert_eq!(line, "[2]   ✗ no adapter registered (no matching tool)");
    }

    #[test]
    fn finish_line_names_status() {
        let line = render(&ProgressEvent::RunFinished {
            run_id: Uuid::nil(),
            status: RunStatus::Completed,
            iterations: 2,
            reason: None,
        });
        assert_eq!(line, "■ COMPLETED after 2 iterations");
    }
}
