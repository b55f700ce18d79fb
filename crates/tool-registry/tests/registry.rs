use std::sync::Arc;

use action_primitives::mock::ScriptedSession;
use action_primitives::{ActionError, BrowserSession};
use async_trait::async_trait;
use serde_json::{json, Value};
use tool_registry::builtin::BUILTIN_TOOL_NAMES;
use tool_registry::{
    ActionClass, ActionOutcome, BuiltinOptions, CredentialResolver, RegistryError, ToolAdapter,
    ToolRegistry,
};

struct Echo(&'static str);

#[async_trait]
impl ToolAdapter for Echo {
    fn name(&self) -> &str {
        self.0
    }

    fn description(&self) -> &str {
        "echo"
    }

    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    fn idempotent(&self) -> bool {
        true
    }

    fn action_class(&self) -> ActionClass {
        ActionClass::Query
    }

    async fn invoke(&self, _session: &dyn BrowserSession, _args: &Value) -> ActionOutcome {
        ActionOutcome::success("echoed")
    }
}

struct AlwaysSignedIn;

#[async_trait]
impl CredentialResolver for AlwaysSignedIn {
    async fn ensure_authenticated(&self, _target_url: &str) -> Result<bool, ActionError> {
        Ok(true)
    }
}

#[test]
fn builtin_registry_lists_every_tool() {
    let registry = ToolRegistry::with_builtin_tools(&BuiltinOptions::default()).unwrap();
    assert_eq!(registry.len(), BUILTIN_TOOL_NAMES.len());
    for name in BUILTIN_TOOL_NAMES {
        assert!(registry.contains(name), "missing {}", name);
    }
    assert!(!registry.contains("ensure_authenticated"));
}

#[test]
fn resolver_enables_authentication_tool() {
    let options = BuiltinOptions {
        credential_resolver: Some(Arc::new(AlwaysSignedIn)),
        ..BuiltinOptions::default()
    };
    let registry = ToolRegistry::with_builtin_tools(&options).unwrap();
    let adapter = registry.resolve("ensure_authenticated").unwrap();
    assert_eq!(adapter.action_class(), ActionClass::Authentication);
}

#[test]
fn duplicate_registration_is_rejected() {
    let err = ToolRegistry::builder()
        .register(Arc::new(Echo("echo")))
        .unwrap()
        .register(Arc::new(Echo("echo")))
        .err()
        .unwrap();
    assert_eq!(err, RegistryError::DuplicateTool("echo".into()));
}

#[test]
fn invalid_names_are_rejected() {
    let err = ToolRegistry::builder()
        .register(Arc::new(Echo("Echo Tool")))
        .err()
        .unwrap();
    assert!(matches!(err, RegistryError::InvalidName(_)));
}

#[test]
fn unknown_enabled_tool_fails_construction() {
    let err = ToolRegistry::with_enabled_tools(&["navigate", "teleport"], &BuiltinOptions::default())
        .unwrap_err();
    assert_eq!(err, RegistryError::UnknownTool("teleport".into()));
}

#[test]
fn resolve_accepts_loose_hints() {
    let registry = ToolRegistry::with_builtin_tools(&BuiltinOptions::default()).unwrap();
    assert_eq!(registry.resolve("Navigate").unwrap().name(), "navigate");
    assert_eq!(registry.resolve("go-back").unwrap().name(), "go_back");
    assert_eq!(
        registry.resolve("take_screenshot_tool").unwrap().name(),
        "take_screenshot"
    );
    assert!(registry.resolve("teleport").is_none());
    assert!(registry.resolve("  ").is_none());
}

#[test]
fn catalog_describes_arguments() {
    let registry =
        ToolRegistry::with_enabled_tools(&["navigate", "select_option"], &BuiltinOptions::default())
            .unwrap();
    let catalog = registry.prompt_for_llm();
    assert!(catalog.contains("• navigate:"));
    assert!(catalog.contains("Required: url"));
    assert!(catalog.contains("• select_option:"));
    assert!(catalog.contains("index"));

    let descriptors = registry.descriptors();
    let navigate = descriptors.iter().find(|d| d.name == "navigate").unwrap();
    assert!(navigate.idempotent);
    assert_eq!(navigate.parameters["type"], "object");
}

#[tokio::test]
async fn resolved_adapter_drives_session() {
    let registry = ToolRegistry::with_builtin_tools(&BuiltinOptions::default()).unwrap();
    let session = ScriptedSession::new();
    let adapter = registry.resolve("navigate").unwrap();
    let outcome = adapter
        .invoke(&session, &json!({"url": "https://example.com/docs"}))
        .await;
    assert!(outcome.succeeded);
    assert_eq!(session.url(), "https://example.com/docs");
}

#[tokio::test]
async fn fill_takes_selector_and_value() {
    let registry = ToolRegistry::with_builtin_tools(&BuiltinOptions::default()).unwrap();
    let session = ScriptedSession::new();
    let fill = registry.resolve("fill").unwrap();

    let outcome = fill
        .invoke(&session, &json!({"selector": "#q", "value": "laptop"}))
        .await;
    assert!(outcome.succeeded, "{}", outcome.message);
    assert_eq!(outcome.message, "filled '#q' with 6 characters");

    let descriptor = fill.descriptor();
    assert!(descriptor.parameters["properties"].get("value").is_some());
    assert!(descriptor.parameters["properties"].get("text").is_none());
}
