use action_primitives::{ActionError, BrowserSession, FaultClass};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Cost class of a tool, used to pick its invocation timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionClass {
    /// Read-only queries such as reading the current url
    Query,
    /// Element interactions: click, fill, hover, select, scroll
    Interaction,
    /// Screenshots and other captures
    Capture,
    /// Page loads: navigate, back, reload
    Navigation,
    /// Credential resolution followed by a page load
    Authentication,
}

impl fmt::Display for ActionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActionClass::Query => "query",
            ActionClass::Interaction => "interaction",
            ActionClass::Capture => "capture",
            ActionClass::Navigation => "navigation",
            ActionClass::Authentication => "authentication",
        };
        f.write_str(label)
    }
}

/// Result of one adapter invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub succeeded: bool,

    /// Names the concrete action and its target on success, the failure otherwise
    pub message: String,

    pub fault_class: FaultClass,

    /// The browser state changed even though the outcome is a failure
    /// (for example a click landed but the follow-up navigation timed out)
    #[serde(default)]
    pub side_effect_applied: bool,

    /// Files or artifacts produced by the action
    #[serde(default)]
    pub outputs: Vec<String>,
}

impl ActionOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            message: message.into(),
            fault_class: FaultClass::None,
            side_effect_applied: true,
            outputs: Vec::new(),
        }
    }

    /// Failure reported by the browser while attempting `action`.
    pub fn failure(action: &str, err: &ActionError) -> Self {
        Self {
            succeeded: false,
            message: format!("{} failed: {}", action, err),
            fault_class: err.fault_class(),
            side_effect_applied: false,
            outputs: Vec::new(),
        }
    }

    /// Arguments rejected before any browser call.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            message: message.into(),
            fault_class: FaultClass::Other,
            side_effect_applied: false,
            outputs: Vec::new(),
        }
    }

    /// The first half of a compound action applied, the follow-up failed.
    pub fn partial(message: impl Into<String>, err: &ActionError) -> Self {
        Self {
            succeeded: false,
            message: format!("{}, but {}", message.into(), err),
            fault_class: err.fault_class(),
            side_effect_applied: true,
            outputs: Vec::new(),
        }
    }

    pub fn with_outputs(mut self, outputs: Vec<String>) -> Self {
        self.outputs = outputs;
        self
    }

    /// Convert a primitive result into an outcome.
    pub fn from_result(
        action: &str,
        result: Result<(), ActionError>,
        success_message: impl FnOnce() -> String,
    ) -> Self {
        match result {
            Ok(()) => Self::success(success_message()),
            Err(err) => Self::failure(action, &err),
        }
    }
}

/// Public description of an adapter, rendered into the planner prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// JSON Schema of the arguments object
    pub parameters: Value,
    /// Repeating the call leaves the page in the same state
    pub idempotent: bool,
    pub action_class: ActionClass,
}

impl ToolDescriptor {
    pub(crate) fn prompt_block(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!("• {}: {}", self.name, self.description));
        let properties = self
            .parameters
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        if properties.is_empty() {
            lines.push("  Arguments: none".to_string());
        } else {
            lines.push(format!("  Arguments: {}", properties.join(", ")));
        }
        let required = self
            .parameters
            .get("required")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        if !required.is_empty() {
            lines.push(format!("  Required: {}", required));
        }
        lines.push(format!(
            "  Idempotent: {}",
            if self.idempotent { "yes" } else { "no" }
        ));
        lines.join("\n")
    }
}

/// A capability over the browser session.
///
/// Implementations must classify every failure into [`FaultClass`] and
/// return it as an [`ActionOutcome`]; `invoke` has no error channel.
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema of the accepted arguments object
    fn parameters(&self) -> Value;

    fn idempotent(&self) -> bool;

    fn action_class(&self) -> ActionClass;

    async fn invoke(&self, session: &dyn BrowserSession, args: &Value) -> ActionOutcome;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
            idempotent: self.idempotent(),
            action_class: self.action_class(),
        }
    }
}

/// Deserialize adapter arguments, turning schema mismatches into a rejected outcome.
pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, args: &Value) -> Result<T, ActionOutcome> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args.clone()
    };
    serde_json::from_value(args)
        .map_err(|err| ActionOutcome::rejected(format!("invalid arguments for {}: {}", tool, err)))
}

/// JSON Schema for an argument type.
pub(crate) fn schema_of<T: schemars::JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_carries_fault_class() {
        let outcome = ActionOutcome::failure("click", &ActionError::ElementNotFound("#x".into()));
        assert!(!outcome.succeeded);
        assert_eq!(outcome.fault_class, FaultClass::ElementNotFound);
        assert!(outcome.message.starts_with("click failed"));
    }

    #[test]
    fn partial_marks_side_effect() {
        let outcome = ActionOutcome::partial(
            "clicked '#submit'",
            &ActionError::timeout("wait for navigation", 100),
        );
        assert!(outcome.side_effect_applied);
        assert_eq!(outcome.fault_class, FaultClass::Timeout);
    }

    #[test]
    fn null_arguments_parse_as_empty_object() {
        #[derive(serde::Deserialize)]
        struct NoArgs {}
        assert!(parse_args::<NoArgs>("reload", &Value::Null).is_ok());
    }
}
