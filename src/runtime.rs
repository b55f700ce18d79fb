//! Wiring from [`AppConfig`] to a ready [`IterationController`].

use std::sync::Arc;

use action_primitives::SessionLauncher;
use agent_core::{
    IterationController, PlanGenerator, Planner, ProgressEvent, ToolExecutor,
    TruncatingSummarizer,
};
use tool_registry::{BuiltinOptions, CredentialResolver, RegistryError, ToolRegistry};
use tracing::debug;
use webpilot_event_bus::{EventBus, InMemoryBus};

use crate::config::AppConfig;

/// Build the tool registry named by `tools.enabled` (all built-ins when empty).
pub fn build_registry(
    config: &AppConfig,
    credential_resolver: Option<Arc<dyn CredentialResolver>>,
) -> Result<ToolRegistry, RegistryError> {
    let options = BuiltinOptions {
        artifacts_dir: config.tools.artifacts_dir.clone(),
        credential_resolver,
    };
    let registry = if config.tools.enabled.is_empty() {
        ToolRegistry::with_builtin_tools(&options)?
    } else {
        ToolRegistry::with_enabled_tools(&config.tools.enabled, &options)?
    };
    debug!(tools = ?registry.names(), "tool registry ready");
    Ok(registry)
}

/// Progress bus sized from the agent configuration.
pub fn progress_bus(config: &AppConfig) -> Arc<InMemoryBus<ProgressEvent>> {
    InMemoryBus::new(config.agent.event_capacity)
}

pub fn build_controller(
    config: &AppConfig,
    registry: ToolRegistry,
    generator: Arc<dyn PlanGenerator>,
    launcher: Arc<dyn SessionLauncher>,
    events: Option<Arc<dyn EventBus<ProgressEvent>>>,
) -> IterationController {
    let agent = Arc::new(config.agent.clone());
    let planner = Planner::new(
        generator,
        Arc::new(TruncatingSummarizer::new(agent.summary_max_chars)),
        registry.prompt_for_llm(),
    );
    let executor = Arc::new(ToolExecutor::new(registry, agent.timeouts.clone()));
    let controller = IterationController::new(agent, launcher, planner, executor);
    match events {
        Some(bus) => controller.with_events(bus),
        None => controller,
    }
}
