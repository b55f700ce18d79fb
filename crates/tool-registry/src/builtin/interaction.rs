use action_primitives::{BrowserSession, ScrollDirection};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::adapter::{parse_args, schema_of, ActionClass, ActionOutcome, ToolAdapter};

#[derive(Debug, Deserialize, JsonSchema)]
struct SelectorArgs {
    /// CSS selector of the target element
    selector: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ClickArgs {
    /// CSS selector of the element to click
    selector: String,
    /// Wait for the navigation the click triggers
    #[serde(default)]
    wait_for_navigation: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct FillArgs {
    /// CSS selector of the input
    selector: String,
    /// Text that replaces the current value
    #[serde(alias = "text")]
    value: String,
}

#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
enum Direction {
    Up,
    Down,
}

impl From<Direction> for ScrollDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => ScrollDirection::Up,
            Direction::Down => ScrollDirection::Down,
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ScrollArgs {
    /// Scroll by one viewport height in this direction
    direction: Direction,
}

fn selector_of(tool: &str, args: &Value) -> Result<String, ActionOutcome> {
    let args: SelectorArgs = parse_args(tool, args)?;
    non_empty_selector(tool, args.selector)
}

fn non_empty_selector(tool: &str, selector: String) -> Result<String, ActionOutcome> {
    let selector = selector.trim().to_string();
    if selector.is_empty() {
        return Err(ActionOutcome::rejected(format!(
            "{} requires a non-empty selector",
            tool
        )));
    }
    Ok(selector)
}

/// Click an element, optionally waiting for the resulting navigation.
pub struct Click;

#[async_trait]
impl ToolAdapter for Click {
    fn name(&self) -> &str {
        "click"
    }

    fn description(&self) -> &str {
        "Click the element matching a CSS selector"
    }

    fn parameters(&self) -> Value {
        schema_of::<ClickArgs>()
    }

    fn idempotent(&self) -> bool {
        false
    }

    fn action_class(&self) -> ActionClass {
        ActionClass::Interaction
    }

    async fn invoke(&self, session: &dyn BrowserSession, args: &Value) -> ActionOutcome {
        let args: ClickArgs = match parse_args(self.name(), args) {
            Ok(args) => args,
            Err(outcome) => return outcome,
        };
        let selector = match non_empty_selector(self.name(), args.selector) {
            Ok(selector) => selector,
            Err(outcome) => return outcome,
        };
        if let Err(err) = session.click(&selector).await {
            return ActionOutcome::failure("click", &err);
        }
        let clicked = format!("clicked '{}'", selector);
        if !args.wait_for_navigation {
            return ActionOutcome::success(clicked);
        }
        match session.wait_for_navigation().await {
            Ok(()) => match session.current_url().await {
                Ok(url) => ActionOutcome::success(format!("{} and landed on {}", clicked, url)),
                Err(_) => ActionOutcome::success(clicked),
            },
            Err(err) => ActionOutcome::partial(clicked, &err),
        }
    }
}

/// Type text into an input, replacing its value.
pub struct Fill;

#[async_trait]
impl ToolAdapter for Fill {
    fn name(&self) -> &str {
        "fill"
    }

    fn description(&self) -> &str {
        "Replace the value of an input field with the given text"
    }

    fn parameters(&self) -> Value {
        schema_of::<FillArgs>()
    }

    fn idempotent(&self) -> bool {
        true
    }

    fn action_class(&self) -> ActionClass {
        ActionClass::Interaction
    }

    async fn invoke(&self, session: &dyn BrowserSession, args: &Value) -> ActionOutcome {
        let args: FillArgs = match parse_args(self.name(), args) {
            Ok(args) => args,
            Err(outcome) => return outcome,
        };
        let selector = match non_empty_selector(self.name(), args.selector) {
            Ok(selector) => selector,
            Err(outcome) => return outcome,
        };
        let chars = args.value.chars().count();
        ActionOutcome::from_result("fill", session.fill(&selector, &args.value).await, || {
            format!("filled '{}' with {} characters", selector, chars)
        })
    }
}

/// Empty an input field.
pub struct ClearText;

#[async_trait]
impl ToolAdapter for ClearText {
    fn name(&self) -> &str {
        "clear_text"
    }

    fn description(&self) -> &str {
        "Clear the value of an input field"
    }

    fn parameters(&self) -> Value {
        schema_of::<SelectorArgs>()
    }

    fn idempotent(&self) -> bool {
        true
    }

    fn action_class(&self) -> ActionClass {
        ActionClass::Interaction
    }

    async fn invoke(&self, session: &dyn BrowserSession, args: &Value) -> ActionOutcome {
        let selector = match selector_of(self.name(), args) {
            Ok(selector) => selector,
            Err(outcome) => return outcome,
        };
        ActionOutcome::from_result("clear_text", session.clear(&selector).await, || {
            format!("cleared '{}'", selector)
        })
    }
}

/// Hover the pointer over an element.
pub struct Hover;

#[async_trait]
impl ToolAdapter for Hover {
    fn name(&self) -> &str {
        "hover"
    }

    fn description(&self) -> &str {
        "Move the mouse pointer over an element to reveal menus or tooltips"
    }

    fn parameters(&self) -> Value {
        schema_of::<SelectorArgs>()
    }

    fn idempotent(&self) -> bool {
        true
    }

    fn action_class(&self) -> ActionClass {
        ActionClass::Interaction
    }

    async fn invoke(&self, session: &dyn BrowserSession, args: &Value) -> ActionOutcome {
        let selector = match selector_of(self.name(), args) {
            Ok(selector) => selector,
            Err(outcome) => return outcome,
        };
        ActionOutcome::from_result("hover", session.hover(&selector).await, || {
            format!("hovered over '{}'", selector)
        })
    }
}

/// Double-click an element.
pub struct DoubleClick;

#[async_trait]
impl ToolAdapter for DoubleClick {
    fn name(&self) -> &str {
        "double_click"
    }

    fn description(&self) -> &str {
        "Double-click the element matching a CSS selector"
    }

    fn parameters(&self) -> Value {
        schema_of::<SelectorArgs>()
    }

    fn idempotent(&self) -> bool {
        false
    }

    fn action_class(&self) -> ActionClass {
        ActionClass::Interaction
    }

    async fn invoke(&self, session: &dyn BrowserSession, args: &Value) -> ActionOutcome {
        let selector = match selector_of(self.name(), args) {
            Ok(selector) => selector,
            Err(outcome) => return outcome,
        };
        ActionOutcome::from_result("double_click", session.double_click(&selector).await, || {
            format!("double-clicked '{}'", selector)
        })
    }
}

/// Scroll the viewport by one page.
pub struct Scroll;

#[async_trait]
impl ToolAdapter for Scroll {
    fn name(&self) -> &str {
        "scroll"
    }

    fn description(&self) -> &str {
        "Scroll the page one viewport up or down"
    }

    fn parameters(&self) -> Value {
        schema_of::<ScrollArgs>()
    }

    fn idempotent(&self) -> bool {
        false
    }

    fn action_class(&self) -> ActionClass {
        ActionClass::Interaction
    }

    async fn invoke(&self, session: &dyn BrowserSession, args: &Value) -> ActionOutcome {
        let args: ScrollArgs = match parse_args(self.name(), args) {
            Ok(args) => args,
            Err(outcome) => return outcome,
        };
        let direction = ScrollDirection::from(args.direction);
        ActionOutcome::from_result("scroll", session.scroll(direction).await, || {
            format!("scrolled {}", direction)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::mock::{Primitive, ScriptedSession};
    use action_primitives::{ActionError, FaultClass};
    use serde_json::json;

    #[tokio::test]
    async fn click_missing_element_is_classified() {
        let session = ScriptedSession::new().missing_selector("#gone");
        let outcome = Click.invoke(&session, &json!({"selector": "#gone"})).await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.fault_class, FaultClass::ElementNotFound);
        assert!(!outcome.side_effect_applied);
    }

    #[tokio::test]
    async fn click_with_failed_navigation_wait_is_partial() {
        let session = ScriptedSession::new().fail_on(
            Primitive::WaitForNavigation,
            ActionError::timeout("wait for navigation", 500),
        );
        let outcome = Click
            .invoke(
                &session,
                &json!({"selector": "#submit", "wait_for_navigation": true}),
            )
            .await;
        assert!(!outcome.succeeded);
        assert!(outcome.side_effect_applied);
        assert_eq!(outcome.fault_class, FaultClass::Timeout);
        assert!(outcome.message.contains("clicked '#submit'"));
    }

    #[tokio::test]
    async fn fill_reports_selector_and_length() {
        let session = ScriptedSession::new();
        let outcome = Fill
            .invoke(&session, &json!({"selector": "#q", "value": "rust"}))
            .await;
        assert!(outcome.succeeded);
        assert_eq!(outcome.message, "filled '#q' with 4 characters");
    }

    #[tokio::test]
    async fn scroll_rejects_unknown_direction() {
        let session = ScriptedSession::new();
        let outcome = Scroll.invoke(&session, &json!({"direction": "left"})).await;
        assert!(!outcome.succeeded);
        assert!(session.browser_actions().is_empty());

        let outcome = Scroll.invoke(&session, &json!({"direction": "down"})).await;
        assert!(outcome.succeeded);
        assert_eq!(outcome.message, "scrolled down");
    }

    #[tokio::test]
    async fn blank_selector_is_rejected() {
        let session = ScriptedSession::new();
        let outcome = Hover.invoke(&session, &json!({"selector": "  "})).await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.fault_class, FaultClass::Other);
        assert!(session.browser_actions().is_empty());
    }
}
