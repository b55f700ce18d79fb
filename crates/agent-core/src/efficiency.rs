//! Advisory audit of tool usage. Never changes control flow.

use crate::model::{StepDescriptor, StepResult};

/// Tools that only capture or move between pages.
const LOW_COST_TOOLS: &[&str] = &["take_screenshot", "navigate", "go_back", "reload", "get_current_url"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EfficiencyWarning {
    pub step_id: u64,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct EfficiencyAudit {
    markers: Vec<String>,
}

impl EfficiencyAudit {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let markers = markers
            .into_iter()
            .map(|m| m.as_ref().trim().to_lowercase())
            .filter(|m| !m.is_empty())
            .collect();
        Self { markers }
    }

    /// Flag a capture- or navigation-only step whose summary claims content extraction.
    pub fn audit(&self, step: &StepDescriptor, result: &StepResult) -> Option<EfficiencyWarning> {
        let tool = step.target_tool_hint.as_deref()?.trim().to_lowercase();
        if !LOW_COST_TOOLS.contains(&tool.as_str()) {
            return None;
        }
        let summary = result.result_summary.to_lowercase();
        let marker = self.markers.iter().find(|m| summary.contains(m.as_str()))?;
        Some(EfficiencyWarning {
            step_id: step.step_id,
            message: format!(
                "{} step reports '{}' content; use a dedicated extraction step instead",
                tool, marker
            ),
        })
    }
}
