//! Planner reply payloads and strict parsing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AgentError;
use crate::model::StepDescriptor;

use super::PlanningMode;

/// Status of an entry in the planner's step list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlannedStepStatus {
    Pending,
    InProgress,
    Success,
    Failure,
    PartialFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedStep {
    pub name: String,
    #[serde(default = "pending")]
    pub status: PlannedStepStatus,
}

fn pending() -> PlannedStepStatus {
    PlannedStepStatus::Pending
}

/// Narrative the planner emits alongside each step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PlanOverview {
    Initial {
        overall_task_name: String,
        master_thought: String,
        estimated_steps: u32,
        steps: Vec<PlannedStep>,
    },
    Iterative {
        progress_analysis: String,
        adaptation_reasoning: String,
        remaining_work: String,
        steps: Vec<PlannedStep>,
    },
}

impl PlanOverview {
    /// One-line summary for progress output.
    pub fn headline(&self) -> String {
        match self {
            PlanOverview::Initial {
                overall_task_name,
                estimated_steps,
                ..
            } => format!("{} (~{} steps)", overall_task_name, estimated_steps),
            PlanOverview::Iterative {
                remaining_work, ..
            } => format!("remaining: {}", remaining_work),
        }
    }
}

/// A parsed planner reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub overview: PlanOverview,
    pub step: StepDescriptor,
}

#[derive(Debug, Deserialize)]
struct TaskPayload {
    task_name: String,
    #[serde(default, alias = "tool")]
    target_tool_hint: Option<String>,
    #[serde(default)]
    tool_args: Value,
    #[serde(default)]
    rationale: String,
    #[serde(default)]
    subtasks: Vec<String>,
    #[serde(default)]
    expected_outputs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct InitialPayload {
    overall_task_name: String,
    master_thought: String,
    estimated_steps: u32,
    #[serde(default)]
    steps: Vec<PlannedStep>,
    current_task: TaskPayload,
}

#[derive(Debug, Deserialize)]
struct IterativePayload {
    progress_analysis: String,
    adaptation_reasoning: String,
    remaining_work: String,
    #[serde(default)]
    steps: Vec<PlannedStep>,
    task_is_final: bool,
    #[serde(default)]
    current_task: Option<TaskPayload>,
}

/// Parse a planner reply for `mode`, assigning `step_id`.
///
/// Missing required fields are errors; nothing is defaulted in their place.
pub fn parse_plan(mode: PlanningMode, payload: Value, step_id: u64) -> Result<Plan, AgentError> {
    let payload = match payload {
        Value::String(text) => extract_json_object(&text)
            .ok_or_else(|| AgentError::planning("planner reply contains no JSON object"))?,
        other => other,
    };
    match mode {
        PlanningMode::Initial => {
            let reply: InitialPayload = serde_json::from_value(payload)
                .map_err(|err| AgentError::planning(format!("initial plan rejected: {}", err)))?;
            // Nothing has run yet, so an initial reply can never finish the task.
            let step = descriptor(reply.current_task, step_id, false)?;
            Ok(Plan {
                overview: PlanOverview::Initial {
                    overall_task_name: reply.overall_task_name,
                    master_thought: reply.master_thought,
                    estimated_steps: reply.estimated_steps,
                    steps: reply.steps,
                },
                step,
            })
        }
        PlanningMode::Iterative => {
            let reply: IterativePayload = serde_json::from_value(payload)
                .map_err(|err| AgentError::planning(format!("iterative plan rejected: {}", err)))?;
            let step = match reply.current_task {
                Some(task) => descriptor(task, step_id, reply.task_is_final)?,
                None if reply.task_is_final => StepDescriptor {
                    step_id,
                    task_name: "Report completion".to_string(),
                    target_tool_hint: None,
                    tool_args: Value::Null,
                    rationale: reply.progress_analysis.clone(),
                    subtasks: Vec::new(),
                    expected_outputs: Vec::new(),
                    is_final: true,
                },
                None => {
                    return Err(AgentError::planning(
                        "iterative plan rejected: missing field `current_task`",
                    ))
                }
            };
            Ok(Plan {
                overview: PlanOverview::Iterative {
                    progress_analysis: reply.progress_analysis,
                    adaptation_reasoning: reply.adaptation_reasoning,
                    remaining_work: reply.remaining_work,
                    steps: reply.steps,
                },
                step,
            })
        }
    }
}

fn descriptor(task: TaskPayload, step_id: u64, is_final: bool) -> Result<StepDescriptor, AgentError> {
    let task_name = task.task_name.trim().to_string();
    if task_name.is_empty() {
        return Err(AgentError::planning("current_task.task_name is empty"));
    }
    let target_tool_hint = task
        .target_tool_hint
        .map(|hint| hint.trim().to_string())
        .filter(|hint| !hint.is_empty());
    Ok(StepDescriptor {
        step_id,
        task_name,
        target_tool_hint,
        tool_args: task.tool_args,
        rationale: task.rationale,
        subtasks: task.subtasks,
        expected_outputs: task.expected_outputs,
        is_final,
    })
}

/// Pull the first JSON object out of model output that may wrap it in
/// prose or a code fence.
pub fn extract_json_object(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            return value.is_object().then_some(value);
        }
    }

    let fence = "```";
    if let Some(start) = raw.find(fence) {
        let after_fence = &raw[start + fence.len()..];
        let after_lang = after_fence.trim_start_matches(|c: char| c.is_alphanumeric() || c == '_');
        if let Some(end) = after_lang.find(fence) {
            if let Ok(value) = serde_json::from_str::<Value>(after_lang[..end].trim()) {
                if value.is_object() {
                    return Some(value);
                }
            }
        }
    }

    raw.match_indices('{')
        .filter_map(|(start, _)| balanced_object(&raw[start..]))
        .find_map(|candidate| {
            serde_json::from_str::<Value>(candidate)
                .ok()
                .filter(Value::is_object)
        })
}

/// The brace-balanced prefix of `text`, which must start with `{`.
fn balanced_object(text: &str) -> Option<&str> {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[..=idx]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_from_fenced_block() {
        let input = "Here is the plan:\n```json\n{\"task_is_final\": true}\n```";
        assert_eq!(
            extract_json_object(input),
            Some(json!({"task_is_final": true}))
        );
    }

    #[test]
    fn extracts_from_inline_object_with_braces_in_strings() {
        let input = r#"Sure. { "task_name": "type {x}", "n": 1 } trailing"#;
        assert_eq!(
            extract_json_object(input),
            Some(json!({"task_name": "type {x}", "n": 1}))
        );
    }

    #[test]
    fn skips_brace_prose_before_the_real_object() {
        let input = r#"Using {selector} syntax as before, the plan is {"task_is_final": false} ok"#;
        assert_eq!(
            extract_json_object(input),
            Some(json!({"task_is_final": false}))
        );
    }

    #[test]
    fn returns_none_when_missing() {
        assert!(extract_json_object("no braces").is_none());
    }

    #[test]
    fn initial_plan_requires_master_thought() {
        let payload = json!({
            "overall_task_name": "Visit example",
            "estimated_steps": 2,
            "current_task": {"task_name": "Open", "tool": "navigate"}
        });
        let err = parse_plan(PlanningMode::Initial, payload, 1).unwrap_err();
        assert!(matches!(err, AgentError::Planning(ref m) if m.contains("master_thought")));
    }

    #[test]
    fn initial_plan_never_carries_final_flag() {
        let payload = json!({
            "overall_task_name": "Visit example",
            "master_thought": "Already done",
            "estimated_steps": 1,
            "task_is_final": true,
            "current_task": {"task_name": "Report completion"}
        });
        let plan = parse_plan(PlanningMode::Initial, payload, 1).unwrap();
        assert!(!plan.step.is_final);
        assert!(plan.step.target_tool_hint.is_none());
    }

    #[test]
    fn iterative_final_without_task_becomes_report_step() {
        let payload = json!({
            "progress_analysis": "Page loaded",
            "adaptation_reasoning": "Nothing to adapt",
            "remaining_work": "none",
            "task_is_final": true
        });
        let plan = parse_plan(PlanningMode::Iterative, payload, 7).unwrap();
        assert!(plan.step.is_final);
        assert_eq!(plan.step.step_id, 7);
        assert!(plan.step.target_tool_hint.is_none());
    }

    #[test]
    fn iterative_non_final_without_task_is_rejected() {
        let payload = json!({
            "progress_analysis": "Page loaded",
            "adaptation_reasoning": "",
            "remaining_work": "fill the form",
            "task_is_final": false
        });
        assert!(parse_plan(PlanningMode::Iterative, payload, 2).is_err());
    }

    #[test]
    fn string_payload_is_unwrapped() {
        let text = "```json\n{\"overall_task_name\":\"t\",\"master_thought\":\"m\",\"estimated_steps\":1,\"current_task\":{\"task_name\":\"Open\",\"tool\":\"navigate\",\"tool_args\":{\"url\":\"https://example.com\"}}}\n```";
        let plan = parse_plan(PlanningMode::Initial, Value::String(text.into()), 1).unwrap();
        assert_eq!(plan.step.target_tool_hint.as_deref(), Some("navigate"));
        assert_eq!(plan.step.tool_args["url"], "https://example.com");
    }
}
