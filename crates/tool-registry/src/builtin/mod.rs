//! Built-in adapters over [`action_primitives::BrowserSession`].

mod auth;
mod capture;
mod interaction;
mod navigation;
mod select;

use std::path::PathBuf;
use std::sync::Arc;

use crate::adapter::ToolAdapter;

pub use auth::{CredentialResolver, EnsureAuthenticated};
pub use capture::TakeScreenshot;
pub use interaction::{Click, ClearText, DoubleClick, Fill, Hover, Scroll};
pub use navigation::{GetCurrentUrl, GoBack, Navigate, Reload};
pub use select::SelectOption;

/// Names of every built-in adapter that needs no external collaborator.
pub const BUILTIN_TOOL_NAMES: &[&str] = &[
    "navigate",
    "click",
    "fill",
    "clear_text",
    "hover",
    "double_click",
    "scroll",
    "select_option",
    "go_back",
    "reload",
    "get_current_url",
    "take_screenshot",
];

/// Collaborators needed to construct built-in adapters.
#[derive(Clone, Default)]
pub struct BuiltinOptions {
    /// Directory screenshots are written into
    pub artifacts_dir: PathBuf,
    /// Enables `ensure_authenticated` when present
    pub credential_resolver: Option<Arc<dyn CredentialResolver>>,
}

impl std::fmt::Debug for BuiltinOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinOptions")
            .field("artifacts_dir", &self.artifacts_dir)
            .field("credential_resolver", &self.credential_resolver.is_some())
            .finish()
    }
}

/// Construct the built-in adapter called `name`.
pub fn builtin_adapter(name: &str, options: &BuiltinOptions) -> Option<Arc<dyn ToolAdapter>> {
    let adapter: Arc<dyn ToolAdapter> = match name {
        "navigate" => Arc::new(Navigate),
        "click" => Arc::new(Click),
        "fill" => Arc::new(Fill),
        "clear_text" => Arc::new(ClearText),
        "hover" => Arc::new(Hover),
        "double_click" => Arc::new(DoubleClick),
        "scroll" => Arc::new(Scroll),
        "select_option" => Arc::new(SelectOption),
        "go_back" => Arc::new(GoBack),
        "reload" => Arc::new(Reload),
        "get_current_url" => Arc::new(GetCurrentUrl),
        "take_screenshot" => Arc::new(TakeScreenshot::new(options.artifacts_dir.clone())),
        "ensure_authenticated" => {
            let resolver = options.credential_resolver.clone()?;
            Arc::new(EnsureAuthenticated::new(resolver))
        }
        _ => return None,
    };
    Some(adapter)
}

/// Every built-in adapter, plus `ensure_authenticated` when a resolver is configured.
pub fn builtin_adapters(options: &BuiltinOptions) -> Vec<Arc<dyn ToolAdapter>> {
    let mut adapters: Vec<_> = BUILTIN_TOOL_NAMES
        .iter()
        .filter_map(|name| builtin_adapter(name, options))
        .collect();
    if let Some(adapter) = builtin_adapter("ensure_authenticated", options) {
        adapters.push(adapter);
    }
    adapters
}
