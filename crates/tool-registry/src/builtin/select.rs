use action_primitives::{BrowserSession, SelectBy};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::adapter::{parse_args, schema_of, ActionClass, ActionOutcome, ToolAdapter};

/// Exactly one of `value`, `label` or `index` must be provided.
#[derive(Debug, Deserialize, JsonSchema)]
struct SelectArgs {
    /// CSS selector of the <select> element
    selector: String,
    /// Option value attribute to select
    #[serde(default)]
    value: Option<String>,
    /// Visible option text to select
    #[serde(default)]
    label: Option<String>,
    /// Zero-based option index to select
    #[serde(default)]
    index: Option<u32>,
}

impl SelectArgs {
    fn criterion(self) -> Result<(String, SelectBy), String> {
        let by = match (self.value, self.label, self.index) {
            (Some(value), None, None) => SelectBy::Value(value),
            (None, Some(label), None) => SelectBy::Label(label),
            (None, None, Some(index)) => SelectBy::Index(index),
            (value, label, index) => {
                let provided = [value.is_some(), label.is_some(), index.is_some()]
                    .iter()
                    .filter(|present| **present)
                    .count();
                return Err(format!(
                    "select_option requires exactly one of value, label or index (got {})",
                    provided
                ));
            }
        };
        Ok((self.selector, by))
    }
}

/// Choose an option in a dropdown.
pub struct SelectOption;

#[async_trait]
impl ToolAdapter for SelectOption {
    fn name(&self) -> &str {
        "select_option"
    }

    fn description(&self) -> &str {
        "Select a dropdown option by value, visible label or index"
    }

    fn parameters(&self) -> Value {
        schema_of::<SelectArgs>()
    }

    fn idempotent(&self) -> bool {
        true
    }

    fn action_class(&self) -> ActionClass {
        ActionClass::Interaction
    }

    async fn invoke(&self, session: &dyn BrowserSession, args: &Value) -> ActionOutcome {
        let args: SelectArgs = match parse_args(self.name(), args) {
            Ok(args) => args,
            Err(outcome) => return outcome,
        };
        let (selector, by) = match args.criterion() {
            Ok(criterion) => criterion,
            Err(reason) => return ActionOutcome::rejected(reason),
        };
        if selector.trim().is_empty() {
            return ActionOutcome::rejected("select_option requires a non-empty selector");
        }
        match session.select_option(&selector, &by).await {
            Ok(selected) => ActionOutcome::success(format!(
                "selected option '{}' ({}) in '{}'",
                selected, by, selector
            )),
            Err(err) => ActionOutcome::failure("select_option", &err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::mock::ScriptedSession;
    use action_primitives::FaultClass;
    use serde_json::json;

    #[tokio::test]
    async fn two_criteria_are_rejected_without_browser_call() {
        let session = ScriptedSession::new();
        let outcome = SelectOption
            .invoke(
                &session,
                &json!({"selector": "#country", "value": "de", "index": 2}),
            )
            .await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.fault_class, FaultClass::Other);
        assert!(outcome.message.contains("exactly one"));
        assert!(session.browser_actions().is_empty());
    }

    #[tokio::test]
    async fn no_criterion_is_rejected() {
        let session = ScriptedSession::new();
        let outcome = SelectOption
            .invoke(&session, &json!({"selector": "#country"}))
            .await;
        assert!(!outcome.succeeded);
        assert!(session.browser_actions().is_empty());
    }

    #[tokio::test]
    async fn select_by_label() {
        let session = ScriptedSession::new();
        let outcome = SelectOption
            .invoke(&session, &json!({"selector": "#country", "label": "Germany"}))
            .await;
        assert!(outcome.succeeded, "{}", outcome.message);
        assert!(outcome.message.contains("Germany"));
        assert_eq!(session.browser_actions().len(), 1);
    }
}
