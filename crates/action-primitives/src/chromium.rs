//! Chromium implementation of the browser session handle.
//!
//! Launches a dedicated Chromium process per session through `chromiumoxide`
//! and drives a single page over the DevTools Protocol.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType, MouseButton,
};
use chromiumoxide::element::Element;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::ActionError;
use crate::session::{BrowserSession, SessionLauncher};
use crate::types::{PageState, ScrollDirection, SelectBy};

const HANDLER_ERROR_LIMIT: u32 = 3;

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Launch and per-command settings for Chromium sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromiumConfig {
    /// Run without a visible window
    pub headless: bool,

    /// Chromium binary; autodetected when unset
    pub executable: Option<PathBuf>,

    /// Profile directory; a temporary profile is used when unset
    pub user_data_dir: Option<PathBuf>,

    pub window_width: u32,
    pub window_height: u32,

    /// Deadline for starting the browser and opening the first page
    pub launch_timeout_ms: u64,

    /// Deadline for a single DevTools command
    pub command_timeout_ms: u64,

    /// Deadline for page loads (goto, back, reload, post-click navigation)
    pub navigation_timeout_ms: u64,

    /// Extra command line switches passed to Chromium
    pub extra_args: Vec<String>,
}

impl Default for ChromiumConfig {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            user_data_dir: None,
            window_width: 1280,
            window_height: 800,
            launch_timeout_ms: 30_000,
            command_timeout_ms: 15_000,
            navigation_timeout_ms: 30_000,
            extra_args: Vec::new(),
        }
    }
}

/// Starts one Chromium process per acquired session.
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher {
    config: ChromiumConfig,
}

impl ChromiumLauncher {
    pub fn new(config: ChromiumConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChromiumConfig {
        &self.config
    }
}

#[async_trait]
impl SessionLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, ActionError> {
        let session = ChromiumSession::launch(self.config.clone()).await?;
        Ok(Box::new(session))
    }
}

/// A Chromium process with exactly one page.
pub struct ChromiumSession {
    id: String,
    config: ChromiumConfig,
    browser: Mutex<Option<Browser>>,
    page: Page,
    handler_task: parking_lot::Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl ChromiumSession {
    /// Start Chromium and open a blank page.
    pub async fn launch(config: ChromiumConfig) -> Result<Self, ActionError> {
        let id = format!("chromium-{}", NEXT_SESSION.fetch_add(1, Ordering::Relaxed));
        info!(session = %id, headless = config.headless, "Launching Chromium session");

        let mut builder = BrowserConfig::builder()
            .window_size(config.window_width, config.window_height)
            .request_timeout(Duration::from_millis(config.command_timeout_ms))
            .arg("--no-first-run")
            .arg("--no-default-browser-check");
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &config.executable {
            builder = builder.chrome_executable(path);
        }
        if let Some(dir) = &config.user_data_dir {
            builder = builder.user_data_dir(dir);
        }
        for arg in &config.extra_args {
            builder = builder.arg(arg.clone());
        }
        let browser_config = builder.build().map_err(ActionError::Launch)?;

        let launch_timeout = Duration::from_millis(config.launch_timeout_ms);
        let (mut browser, mut handler) =
            match tokio::time::timeout(launch_timeout, Browser::launch(browser_config)).await {
                Ok(Ok(pair)) => pair,
                Ok(Err(err)) => return Err(ActionError::Launch(err.to_string())),
                Err(_) => {
                    return Err(ActionError::timeout(
                        "browser launch",
                        config.launch_timeout_ms,
                    ))
                }
            };

        let label = id.clone();
        let handler_task = tokio::spawn(async move {
            let mut consecutive_errors = 0u32;
            while let Some(result) = handler.next().await {
                match result {
                    Ok(()) => consecutive_errors = 0,
                    Err(err) => {
                        consecutive_errors += 1;
                        debug!(session = %label, error = %err, "CDP handler error");
                        if consecutive_errors >= HANDLER_ERROR_LIMIT {
                            warn!(session = %label, "CDP handler error limit reached; stopping");
                            break;
                        }
                    }
                }
            }
        });

        let page = match tokio::time::timeout(launch_timeout, browser.new_page("about:blank")).await
        {
            Ok(Ok(page)) => page,
            Ok(Err(err)) => {
                let _ = browser.close().await;
                handler_task.abort();
                return Err(ActionError::Launch(format!("failed to open page: {}", err)));
            }
            Err(_) => {
                let _ = browser.close().await;
                handler_task.abort();
                return Err(ActionError::timeout("open page", config.launch_timeout_ms));
            }
        };

        Ok(Self {
            id,
            config,
            browser: Mutex::new(Some(browser)),
            page,
            handler_task: parking_lot::Mutex::new(Some(handler_task)),
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> Result<(), ActionError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(ActionError::SessionClosed)
        } else {
            Ok(())
        }
    }

    async fn bounded<T, F>(&self, operation: &str, timeout_ms: u64, fut: F) -> Result<T, ActionError>
    where
        F: Future<Output = Result<T, ActionError>>,
    {
        self.ensure_open()?;
        match tokio::time::timeout(Duration::from_millis(timeout_ms), fut).await {
            Ok(result) => result,
            Err(_) => Err(ActionError::timeout(operation, timeout_ms)),
        }
    }

    async fn element(&self, selector: &str) -> Result<Element, ActionError> {
        self.page
            .find_element(selector)
            .await
            .map_err(|err| ActionError::ElementNotFound(format!("{}: {}", selector, err)))
    }

    /// Evaluate a script that reports `{ error }` on failure and a JSON value otherwise.
    async fn evaluate_checked(&self, selector: &str, script: String) -> Result<Value, ActionError> {
        let value: Value = self
            .page
            .evaluate(script)
            .await
            .map_err(cdp_error)?
            .into_value()
            .map_err(cdp_error)?;
        match value.get("error").and_then(Value::as_str) {
            Some("not_found") => Err(ActionError::ElementNotFound(selector.to_string())),
            Some(other) => Err(ActionError::InvalidArgument(format!("{}: {}", selector, other))),
            None => Ok(value),
        }
    }

    async fn dispatch_mouse(
        &self,
        kind: DispatchMouseEventType,
        x: f64,
        y: f64,
        click_count: i64,
    ) -> Result<(), ActionError> {
        let params = DispatchMouseEventParams::builder()
            .r#type(kind)
            .x(x)
            .y(y)
            .button(MouseButton::Left)
            .click_count(click_count)
            .build()
            .map_err(ActionError::Cdp)?;
        self.page.execute(params).await.map_err(cdp_error)?;
        Ok(())
    }
}

fn cdp_error(err: impl std::fmt::Display) -> ActionError {
    ActionError::Cdp(err.to_string())
}

fn navigation_error(err: impl std::fmt::Display) -> ActionError {
    ActionError::NavigationFailed(err.to_string())
}

fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

fn select_script(selector: &str, by: &SelectBy) -> String {
    let matcher = match by {
        SelectBy::Value(value) => format!("options.find(o => o.value === {})", js_string(value)),
        SelectBy::Label(label) => {
            let label = js_string(label);
            format!(
                "options.find(o => o.label === {label} || o.text.trim() === {label})",
                label = label
            )
        }
        SelectBy::Index(index) => format!("options[{}]", index),
    };
    format!(
        r#"(() => {{
  const el = document.querySelector({selector});
  if (!el) {{ return {{ error: 'not_found' }}; }}
  if (el.tagName !== 'SELECT') {{ return {{ error: 'element is not a <select>' }}; }}
  const options = Array.from(el.options);
  const match = {matcher};
  if (!match) {{ return {{ error: 'no matching option' }}; }}
  el.value = match.value;
  match.selected = true;
  el.dispatchEvent(new Event('input', {{ bubbles: true }}));
  el.dispatchEvent(new Event('change', {{ bubbles: true }}));
  return {{ value: match.value }};
}})()"#,
        selector = js_string(selector),
        matcher = matcher
    )
}

fn clear_script(selector: &str) -> String {
    format!(
        r#"(() => {{
  const el = document.querySelector({selector});
  if (!el) {{ return {{ error: 'not_found' }}; }}
  if (!('value' in el)) {{ return {{ error: 'element has no value' }}; }}
  el.focus();
  el.value = '';
  el.dispatchEvent(new Event('input', {{ bubbles: true }}));
  el.dispatchEvent(new Event('change', {{ bubbles: true }}));
  return {{ ok: true }};
}})()"#,
        selector = js_string(selector)
    )
}

const SNAPSHOT_SCRIPT: &str = "(() => ({ url: window.location.href, title: document.title || null, text: document.body ? document.body.innerText : '' }))()";

#[async_trait]
impl BrowserSession for ChromiumSession {
    fn session_id(&self) -> &str {
        &self.id
    }

    async fn navigate(&self, url: &str) -> Result<(), ActionError> {
        let target = crate::types::validate_url(url)?;
        self.bounded("navigate", self.config.navigation_timeout_ms, async {
            self.page
                .goto(target.as_str())
                .await
                .map_err(navigation_error)?;
            Ok(())
        })
        .await
    }

    async fn click(&self, selector: &str) -> Result<(), ActionError> {
        self.bounded("click", self.config.command_timeout_ms, async {
            let element = self.element(selector).await?;
            element.click().await.map_err(cdp_error)?;
            Ok(())
        })
        .await
    }

    async fn wait_for_navigation(&self) -> Result<(), ActionError> {
        self.bounded(
            "wait for navigation",
            self.config.navigation_timeout_ms,
            async {
                self.page
                    .wait_for_navigation()
                    .await
                    .map_err(navigation_error)?;
                Ok(())
            },
        )
        .await
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), ActionError> {
        self.bounded("fill", self.config.command_timeout_ms, async {
            self.evaluate_checked(selector, clear_script(selector))
                .await?;
            let element = self.element(selector).await?;
            element.focus().await.map_err(cdp_error)?;
            element.type_str(value).await.map_err(cdp_error)?;
            Ok(())
        })
        .await
    }

    async fn clear(&self, selector: &str) -> Result<(), ActionError> {
        self.bounded("clear", self.config.command_timeout_ms, async {
            self.evaluate_checked(selector, clear_script(selector))
                .await?;
            Ok(())
        })
        .await
    }

    async fn hover(&self, selector: &str) -> Result<(), ActionError> {
        self.bounded("hover", self.config.command_timeout_ms, async {
            let element = self.element(selector).await?;
            element.hover().await.map_err(cdp_error)?;
            Ok(())
        })
        .await
    }

    async fn double_click(&self, selector: &str) -> Result<(), ActionError> {
        self.bounded("double click", self.config.command_timeout_ms, async {
            let element = self.element(selector).await?;
            element.scroll_into_view().await.map_err(cdp_error)?;
            let point = element.clickable_point().await.map_err(cdp_error)?;
            for click_count in 1..=2 {
                self.dispatch_mouse(
                    DispatchMouseEventType::MousePressed,
                    point.x,
                    point.y,
                    click_count,
                )
                .await?;
                self.dispatch_mouse(
                    DispatchMouseEventType::MouseReleased,
                    point.x,
                    point.y,
                    click_count,
                )
                .await?;
            }
            Ok(())
        })
        .await
    }

    async fn scroll(&self, direction: ScrollDirection) -> Result<(), ActionError> {
        self.bounded("scroll", self.config.command_timeout_ms, async {
            let script = format!("window.scrollBy(0, {} * window.innerHeight)", direction.sign());
            self.page.evaluate(script).await.map_err(cdp_error)?;
            Ok(())
        })
        .await
    }

    async fn select_option(&self, selector: &str, by: &SelectBy) -> Result<String, ActionError> {
        self.bounded("select option", self.config.command_timeout_ms, async {
            let value = self
                .evaluate_checked(selector, select_script(selector, by))
                .await?;
            Ok(value
                .get("value")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string())
        })
        .await
    }

    async fn go_back(&self) -> Result<(), ActionError> {
        self.bounded("go back", self.config.navigation_timeout_ms, async {
            self.page
                .evaluate("history.back()")
                .await
                .map_err(navigation_error)?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(navigation_error)?;
            Ok(())
        })
        .await
    }

    async fn reload(&self) -> Result<(), ActionError> {
        self.bounded("reload", self.config.navigation_timeout_ms, async {
            self.page.reload().await.map_err(navigation_error)?;
            Ok(())
        })
        .await
    }

    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<(), ActionError> {
        self.bounded("screenshot", self.config.command_timeout_ms, async {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|err| ActionError::InvalidArgument(err.to_string()))?;
            }
            let params = ScreenshotParams::builder().full_page(full_page).build();
            self.page
                .save_screenshot(params, path)
                .await
                .map_err(cdp_error)?;
            Ok(())
        })
        .await
    }

    async fn current_url(&self) -> Result<String, ActionError> {
        self.bounded("read url", self.config.command_timeout_ms, async {
            let url = self.page.url().await.map_err(cdp_error)?;
            Ok(url.unwrap_or_else(|| "about:blank".to_string()))
        })
        .await
    }

    async fn snapshot(&self) -> Result<PageState, ActionError> {
        self.bounded("snapshot", self.config.command_timeout_ms, async {
            self.page
                .evaluate(SNAPSHOT_SCRIPT)
                .await
                .map_err(cdp_error)?
                .into_value::<PageState>()
                .map_err(cdp_error)
        })
        .await
    }

    async fn close(&self) -> Result<(), ActionError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!(session = %self.id, "Closing Chromium session");
        let browser = self.browser.lock().await.take();
        let mut result = Ok(());
        if let Some(mut browser) = browser {
            if let Err(err) = browser.close().await {
                warn!(session = %self.id, error = %err, "Browser close failed");
                result = Err(cdp_error(err));
            }
            let _ = browser.wait().await;
        }
        if let Some(task) = self.handler_task.lock().take() {
            task.abort();
        }
        result
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if let Some(task) = self.handler_task.lock().take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_script_escapes_arguments() {
        let script = select_script("select[name=\"size\"]", &SelectBy::Label("M's".into()));
        assert!(script.contains(r#""select[name=\"size\"]""#));
        assert!(script.contains("\"M's\""));
        assert!(script.contains("o.text.trim()"));
    }

    #[test]
    fn select_script_uses_index_lookup() {
        let script = select_script("#country", &SelectBy::Index(2));
        assert!(script.contains("options[2]"));
    }

    #[test]
    fn default_config_is_headless() {
        let config = ChromiumConfig::default();
        assert!(config.headless);
        assert!(config.navigation_timeout_ms >= config.command_timeout_ms);
    }
}
