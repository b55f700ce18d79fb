use action_primitives::BrowserSession;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::adapter::{parse_args, schema_of, ActionClass, ActionOutcome, ToolAdapter};

#[derive(Debug, Deserialize, JsonSchema)]
struct NavigateArgs {
    /// Absolute http(s) or file url to open
    url: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct NoArgs {}

/// Open a url in the current page.
pub struct Navigate;

#[async_trait]
impl ToolAdapter for Navigate {
    fn name(&self) -> &str {
        "navigate"
    }

    fn description(&self) -> &str {
        "Open a url in the browser and wait for the page to load"
    }

    fn parameters(&self) -> Value {
        schema_of::<NavigateArgs>()
    }

    fn idempotent(&self) -> bool {
        true
    }

    fn action_class(&self) -> ActionClass {
        ActionClass::Navigation
    }

    async fn invoke(&self, session: &dyn BrowserSession, args: &Value) -> ActionOutcome {
        let args: NavigateArgs = match parse_args(self.name(), args) {
            Ok(args) => args,
            Err(outcome) => return outcome,
        };
        let url = args.url.trim();
        if url.is_empty() {
            return ActionOutcome::rejected("navigate requires a non-empty url");
        }
        ActionOutcome::from_result("navigate", session.navigate(url).await, || {
            format!("navigated to {}", url)
        })
    }
}

/// Go back one entry in session history.
pub struct GoBack;

#[async_trait]
impl ToolAdapter for GoBack {
    fn name(&self) -> &str {
        "go_back"
    }

    fn description(&self) -> &str {
        "Return to the previous page in browser history"
    }

    fn parameters(&self) -> Value {
        schema_of::<NoArgs>()
    }

    fn idempotent(&self) -> bool {
        false
    }

    fn action_class(&self) -> ActionClass {
        ActionClass::Navigation
    }

    async fn invoke(&self, session: &dyn BrowserSession, _args: &Value) -> ActionOutcome {
        if let Err(err) = session.go_back().await {
            return ActionOutcome::failure("go_back", &err);
        }
        match session.current_url().await {
            Ok(url) => ActionOutcome::success(format!("went back to {}", url)),
            Err(_) => ActionOutcome::success("went back one page"),
        }
    }
}

/// Reload the current page.
pub struct Reload;

#[async_trait]
impl ToolAdapter for Reload {
    fn name(&self) -> &str {
        "reload"
    }

    fn description(&self) -> &str {
        "Reload the current page"
    }

    fn parameters(&self) -> Value {
        schema_of::<NoArgs>()
    }

    fn idempotent(&self) -> bool {
        true
    }

    fn action_class(&self) -> ActionClass {
        ActionClass::Navigation
    }

    async fn invoke(&self, session: &dyn BrowserSession, _args: &Value) -> ActionOutcome {
        if let Err(err) = session.reload().await {
            return ActionOutcome::failure("reload", &err);
        }
        match session.current_url().await {
            Ok(url) => ActionOutcome::success(format!("reloaded {}", url)),
            Err(_) => ActionOutcome::success("reloaded the current page"),
        }
    }
}

/// Read the url of the current page.
pub struct GetCurrentUrl;

#[async_trait]
impl ToolAdapter for GetCurrentUrl {
    fn name(&self) -> &str {
        "get_current_url"
    }

    fn description(&self) -> &str {
        "Report the url of the page currently open"
    }

    fn parameters(&self) -> Value {
        schema_of::<NoArgs>()
    }

    fn idempotent(&self) -> bool {
        true
    }

    fn action_class(&self) -> ActionClass {
        ActionClass::Query
    }

    async fn invoke(&self, session: &dyn BrowserSession, _args: &Value) -> ActionOutcome {
        match session.current_url().await {
            Ok(url) => {
                let mut outcome = ActionOutcome::success(format!("current url is {}", url));
                outcome.side_effect_applied = false;
                outcome
            }
            Err(err) => ActionOutcome::failure("get_current_url", &err),
        }
    }
}
