use action_primitives::BrowserSession;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::adapter::{parse_args, schema_of, ActionClass, ActionOutcome, ToolAdapter};

#[derive(Debug, Deserialize, JsonSchema)]
struct ScreenshotArgs {
    /// File name for the capture; ".png" is appended when missing
    name: String,
    /// Capture the whole scrollable page instead of the viewport
    #[serde(default)]
    full_page: bool,
}

/// Capture the page into the artifacts directory.
pub struct TakeScreenshot {
    artifacts_dir: PathBuf,
}

impl TakeScreenshot {
    pub fn new(artifacts_dir: PathBuf) -> Self {
        Self { artifacts_dir }
    }

    fn target_path(&self, name: &str) -> Option<PathBuf> {
        let file_name: String = name
            .trim()
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        let file_name = file_name.trim_start_matches('.');
        if file_name.is_empty() {
            return None;
        }
        let file_name = if file_name.to_ascii_lowercase().ends_with(".png") {
            file_name.to_string()
        } else {
            format!("{}.png", file_name)
        };
        Some(self.artifacts_dir.join(file_name))
    }
}

#[async_trait]
impl ToolAdapter for TakeScreenshot {
    fn name(&self) -> &str {
        "take_screenshot"
    }

    fn description(&self) -> &str {
        "Save a PNG screenshot of the current page into the artifacts directory"
    }

    fn parameters(&self) -> Value {
        schema_of::<ScreenshotArgs>()
    }

    fn idempotent(&self) -> bool {
        true
    }

    fn action_class(&self) -> ActionClass {
        ActionClass::Capture
    }

    async fn invoke(&self, session: &dyn BrowserSession, args: &Value) -> ActionOutcome {
        let args: ScreenshotArgs = match parse_args(self.name(), args) {
            Ok(args) => args,
            Err(outcome) => return outcome,
        };
        let Some(path) = self.target_path(&args.name) else {
            return ActionOutcome::rejected("take_screenshot requires a usable file name");
        };
        match session.screenshot(&path, args.full_page).await {
            Ok(()) => {
                let display = display_path(&path);
                let scope = if args.full_page { "full page" } else { "viewport" };
                let mut outcome =
                    ActionOutcome::success(format!("saved {} screenshot to {}", scope, display))
                        .with_outputs(vec![display]);
                outcome.side_effect_applied = false;
                outcome
            }
            Err(err) => ActionOutcome::failure("take_screenshot", &err),
        }
    }
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::mock::{Primitive, ScriptedSession};
    use serde_json::json;

    #[test]
    fn file_names_are_sanitized() {
        let tool = TakeScreenshot::new(PathBuf::from("/tmp/artifacts"));
        assert_eq!(
            tool.target_path("search results"),
            Some(PathBuf::from("/tmp/artifacts/search_results.png"))
        );
        assert_eq!(
            tool.target_path("../../etc/passwd"),
            Some(PathBuf::from("/tmp/artifacts/_.._etc_passwd.png"))
        );
        assert_eq!(tool.target_path("   "), None);
    }

    #[tokio::test]
    async fn screenshot_lists_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let tool = TakeScreenshot::new(dir.path().to_path_buf());
        let session = ScriptedSession::new();
        let outcome = tool
            .invoke(&session, &json!({"name": "home.png", "full_page": true}))
            .await;
        assert!(outcome.succeeded);
        assert_eq!(outcome.outputs.len(), 1);
        assert!(outcome.outputs[0].ends_with("home.png"));
        assert_eq!(session.calls()[0].primitive, Primitive::Screenshot);
    }
}
