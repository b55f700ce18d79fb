use agent_core::{PlanningContext, PlanningMode, StepResult};

const INITIAL_FORMAT: &str = r#"Respond with one JSON object:
{
  "overall_task_name": string,
  "master_thought": string,        // how you will reach the goal
  "estimated_steps": integer,
  "steps": [{"name": string, "status": "PENDING" | "IN_PROGRESS"}],
  "current_task": {
    "task_name": string,
    "tool": string,                 // one tool name from the catalog
    "tool_args": object,
    "rationale": string,
    "subtasks": [string],
    "expected_outputs": [string]
  }
}"#;

const ITERATIVE_FORMAT: &str = r#"Respond with one JSON object:
{
  "progress_analysis": string,     // what the last result tells you
  "adaptation_reasoning": string,  // how the plan changes because of it
  "remaining_work": string,
  "steps": [{"name": string, "status": "PENDING" | "IN_PROGRESS" | "SUCCESS" | "FAILURE" | "PARTIAL_FAILURE"}],
  "task_is_final": boolean,         // true only when the goal is already achieved
  "current_task": { ... same shape as before ... }   // omit when task_is_final is true and nothing is left to do
}"#;

const HISTORY_WINDOW: usize = 6;

pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn system_prompt(&self) -> &'static str {
        "You are WebPilot's planning strategist. You control a single browser tab through the listed tools, one step at a time. After every step you receive its structured result and decide the next step. Plan only what the tools can do, name the exact selector or url each step targets, and answer with JSON only."
    }

    pub fn build_user_prompt(&self, context: &PlanningContext) -> String {
        let mut sections = Vec::new();
        sections.push(format!("Goal: {}", context.goal.trim()));
        sections.push(format!("Progress: {}", context.progress_summary));
        sections.push(context.tool_catalog.clone());

        if !context.history.is_empty() {
            let skipped = context.history.len().saturating_sub(HISTORY_WINDOW);
            let mut lines = vec!["Execution history (oldest first):".to_string()];
            if skipped > 0 {
                lines.push(format!("… {} earlier steps omitted", skipped));
            }
            for (index, result) in context.history.iter().enumerate().skip(skipped) {
                lines.push(format!("{}. {}", index + 1, history_line(result)));
            }
            sections.push(lines.join("\n"));
        }

        if let Some(previous) = &context.previous_result {
            sections.push(format!(
                "Latest step result:\n{}",
                serde_json::to_string_pretty(previous).unwrap_or_default()
            ));
        }

        if let Some(page) = &context.page_summary {
            sections.push(format!("Current page:\n{}", page));
        }

        sections.push(match context.mode {
            PlanningMode::Initial => INITIAL_FORMAT.to_string(),
            PlanningMode::Iterative => ITERATIVE_FORMAT.to_string(),
        });
        sections.join("\n\n")
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn history_line(result: &StepResult) -> String {
    let mut line = format!(
        "[{}] {} -> {}",
        result.status.as_str(),
        result.step_description,
        result.result_summary
    );
    if let Some(details) = &result.error_details {
        line.push_str(&format!(" (error: {})", details));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(mode: PlanningMode, history: Vec<StepResult>) -> PlanningContext {
        PlanningContext {
            goal: "find the docs".into(),
            mode,
            iteration: history.len() as u32 + 1,
            step_id: 1,
            previous_result: history.last().cloned(),
            history,
            progress_summary: "Iteration 1, completed 0 tasks".into(),
            page_summary: None,
            tool_catalog: "Available browser tools:".into(),
        }
    }

    #[test]
    fn initial_prompt_asks_for_overview() {
        let prompt = PromptBuilder::new().build_user_prompt(&context(PlanningMode::Initial, vec![]));
        assert!(prompt.contains("Goal: find the docs"));
        assert!(prompt.contains("master_thought"));
        assert!(!prompt.contains("Execution history"));
    }

    #[test]
    fn iterative_prompt_includes_failures() {
        let history = vec![StepResult::failure(
            "Open docs",
            "click failed: Element not found: #docs",
            "element-not-found: click failed",
        )];
        let prompt =
            PromptBuilder::new().build_user_prompt(&context(PlanningMode::Iterative, history));
        assert!(prompt.contains("[FAILURE] Open docs"));
        assert!(prompt.contains("task_is_final"));
    }
}
