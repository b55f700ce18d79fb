use action_primitives::{ActionError, BrowserSession, FaultClass};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::adapter::{parse_args, schema_of, ActionClass, ActionOutcome, ToolAdapter};

/// External collaborator that makes a site's credentials available to the session.
///
/// Returns `Ok(true)` once the session is authenticated for `target_url`,
/// `Ok(false)` when no usable credentials exist.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn ensure_authenticated(&self, target_url: &str) -> Result<bool, ActionError>;
}

#[derive(Debug, Deserialize, JsonSchema)]
struct AuthArgs {
    /// Url of the page that requires a signed-in session
    url: String,
}

/// Resolve credentials for a site, then open the protected page.
pub struct EnsureAuthenticated {
    resolver: Arc<dyn CredentialResolver>,
}

impl EnsureAuthenticated {
    pub fn new(resolver: Arc<dyn CredentialResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl ToolAdapter for EnsureAuthenticated {
    fn name(&self) -> &str {
        "ensure_authenticated"
    }

    fn description(&self) -> &str {
        "Sign the browser in to a site using stored credentials, then open the given url"
    }

    fn parameters(&self) -> Value {
        schema_of::<AuthArgs>()
    }

    fn idempotent(&self) -> bool {
        true
    }

    fn action_class(&self) -> ActionClass {
        ActionClass::Authentication
    }

    async fn invoke(&self, session: &dyn BrowserSession, args: &Value) -> ActionOutcome {
        let args: AuthArgs = match parse_args(self.name(), args) {
            Ok(args) => args,
            Err(outcome) => return outcome,
        };
        let url = args.url.trim();
        if let Err(err) = action_primitives::validate_url(url) {
            return ActionOutcome::failure("ensure_authenticated", &err);
        }
        match self.resolver.ensure_authenticated(url).await {
            Ok(true) => {}
            Ok(false) => {
                return ActionOutcome {
                    succeeded: false,
                    message: format!("no accepted credentials for {}", url),
                    fault_class: FaultClass::Other,
                    side_effect_applied: false,
                    outputs: Vec::new(),
                }
            }
            Err(err) => return ActionOutcome::failure("ensure_authenticated", &err),
        }
        match session.navigate(url).await {
            Ok(()) => ActionOutcome::success(format!("authenticated and opened {}", url)),
            Err(err) => ActionOutcome::partial(format!("authenticated for {}", url), &err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::mock::{Primitive, ScriptedSession};
    use serde_json::json;

    struct FixedResolver(bool);

    #[async_trait]
    impl CredentialResolver for FixedResolver {
        async fn ensure_authenticated(&self, _target_url: &str) -> Result<bool, ActionError> {
            Ok(self.0)
        }
    }

    #[tokio::test]
    async fn accepted_credentials_open_the_page() {
        let tool = EnsureAuthenticated::new(Arc::new(FixedResolver(true)));
        let session = ScriptedSession::new();
        let outcome = tool
            .invoke(&session, &json!({"url": "https://mail.example.com/inbox"}))
            .await;
        assert!(outcome.succeeded, "{}", outcome.message);
        assert_eq!(session.url(), "https://mail.example.com/inbox");
    }

    #[tokio::test]
    async fn rejected_credentials_touch_nothing() {
        let tool = EnsureAuthenticated::new(Arc::new(FixedResolver(false)));
        let session = ScriptedSession::new();
        let outcome = tool
            .invoke(&session, &json!({"url": "https://mail.example.com/"}))
            .await;
        assert!(!outcome.succeeded);
        assert!(session
            .calls()
            .iter()
            .all(|call| call.primitive != Primitive::Navigate));
    }
}
