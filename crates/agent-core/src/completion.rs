//! Completion predicate.
//!
//! The planner's explicit final flag wins. Phrase matching over the latest
//! successful result is a fallback for planners that never set the flag and
//! can be disabled by configuring no phrases.

use serde::Serialize;

use crate::model::{StepDescriptor, StepResult};
use crate::planner::PlanningMode;

/// Why a run was judged complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "phrase", rename_all = "snake_case")]
pub enum CompletionReason {
    ExplicitFinal,
    PhraseMatch(String),
}

#[derive(Debug, Clone, Default)]
pub struct CompletionPolicy {
    phrases: Vec<String>,
}

impl CompletionPolicy {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrases = phrases
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { phrases }
    }

    /// Decide whether the run is complete after `latest` was appended.
    ///
    /// `mode` is the mode `step` was planned in; a final flag set while
    /// planning from an empty history is ignored.
    pub fn evaluate(
        &self,
        step: &StepDescriptor,
        mode: PlanningMode,
        latest: Option<&StepResult>,
    ) -> Option<CompletionReason> {
        if step.is_final && mode == PlanningMode::Iterative {
            return Some(CompletionReason::ExplicitFinal);
        }
        let latest = latest.filter(|result| result.is_success())?;
        [
            latest.suggestions_for_planner.as_deref(),
            latest.next_step_context.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find_map(|text| self.matching_phrase(text))
        .map(CompletionReason::PhraseMatch)
    }

    fn matching_phrase(&self, text: &str) -> Option<String> {
        let haystack = text.to_lowercase();
        self.phrases
            .iter()
            .find(|phrase| haystack.contains(phrase.as_str()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn step(is_final: bool) -> StepDescriptor {
        StepDescriptor {
            step_id: 1,
            task_name: "Open site".into(),
            target_tool_hint: Some("navigate".into()),
            tool_args: Value::Null,
            rationale: String::new(),
            subtasks: Vec::new(),
            expected_outputs: Vec::new(),
            is_final,
        }
    }

    fn policy() -> CompletionPolicy {
        CompletionPolicy::new(["Task Complete", "all steps finished"])
    }

    #[test]
    fn final_flag_is_ignored_in_initial_mode() {
        let latest = StepResult::success("Open site", "navigated to https://example.com");
        assert_eq!(
            policy().evaluate(&step(true), PlanningMode::Initial, Some(&latest)),
            None
        );
        assert_eq!(
            policy().evaluate(&step(true), PlanningMode::Iterative, Some(&latest)),
            Some(CompletionReason::ExplicitFinal)
        );
    }

    #[test]
    fn phrases_match_case_insensitively_on_success_only() {
        let done = StepResult::success("Submit", "clicked '#submit'")
            .with_suggestions("TASK COMPLETE, nothing left to do");
        assert_eq!(
            policy().evaluate(&step(false), PlanningMode::Iterative, Some(&done)),
            Some(CompletionReason::PhraseMatch("task complete".into()))
        );

        let mut failed = done.clone();
        failed.status = crate::model::StepStatus::Failure;
        assert_eq!(
            policy().evaluate(&step(false), PlanningMode::Iterative, Some(&failed)),
            None
        );
    }

    #[test]
    fn next_step_context_is_also_checked() {
        let done = StepResult::success("Verify", "current url is https://example.com/done")
            .with_next_step_context("All steps finished.");
        assert!(policy()
            .evaluate(&step(false), PlanningMode::Initial, Some(&done))
            .is_some());
    }

    #[test]
    fn no_phrases_disables_fallback() {
        let done = StepResult::success("Submit", "ok").with_suggestions("task complete");
        assert_eq!(
            CompletionPolicy::default().evaluate(&step(false), PlanningMode::Iterative, Some(&done)),
            None
        );
    }
}
