//! In-memory browser session used by tests and offline development.
//!
//! [`ScriptedSession`] keeps a fake url/history, records every primitive it
//! receives and can be told to fail or stall on specific primitives.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ActionError;
use crate::session::{BrowserSession, SessionLauncher};
use crate::types::{validate_url, PageState, ScrollDirection, SelectBy};

/// Primitive identifiers used for scripting and call recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Navigate,
    Click,
    WaitForNavigation,
    Fill,
    Clear,
    Hover,
    DoubleClick,
    Scroll,
    SelectOption,
    GoBack,
    Reload,
    Screenshot,
    CurrentUrl,
    Snapshot,
    Close,
}

/// One primitive call observed by a [`ScriptedSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub primitive: Primitive,
    pub target: Option<String>,
}

#[derive(Debug)]
struct ScriptState {
    url: String,
    title: Option<String>,
    text: String,
    back_stack: Vec<String>,
    calls: Vec<RecordedCall>,
    failures: HashMap<Primitive, ActionError>,
    delays: HashMap<Primitive, Duration>,
    missing_selectors: HashSet<String>,
    closed: bool,
}

impl Default for ScriptState {
    fn default() -> Self {
        Self {
            url: "about:blank".to_string(),
            title: None,
            text: String::new(),
            back_stack: Vec::new(),
            calls: Vec::new(),
            failures: HashMap::new(),
            delays: HashMap::new(),
            missing_selectors: HashSet::new(),
            closed: false,
        }
    }
}

/// Scriptable session; clones share state so tests can inspect a session
/// after handing it to the code under test.
#[derive(Debug, Clone)]
pub struct ScriptedSession {
    id: String,
    state: Arc<Mutex<ScriptState>>,
    close_count: Arc<AtomicUsize>,
}

impl Default for ScriptedSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self {
            id: "scripted-session".to_string(),
            state: Arc::new(Mutex::new(ScriptState::default())),
            close_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make every call of `primitive` fail with `error`.
    pub fn fail_on(self, primitive: Primitive, error: ActionError) -> Self {
        self.state.lock().failures.insert(primitive, error);
        self
    }

    /// Make every call of `primitive` sleep before answering.
    pub fn delay(self, primitive: Primitive, delay: Duration) -> Self {
        self.state.lock().delays.insert(primitive, delay);
        self
    }

    /// Treat `selector` as matching nothing on the page.
    pub fn missing_selector(self, selector: &str) -> Self {
        self.state
            .lock()
            .missing_selectors
            .insert(selector.to_string());
        self
    }

    /// Set the text and title returned by [`BrowserSession::snapshot`].
    pub fn with_page(self, title: &str, text: &str) -> Self {
        {
            let mut state = self.state.lock();
            state.title = Some(title.to_string());
            state.text = text.to_string();
        }
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }

    /// Calls that reached the page, excluding url reads, snapshots and close.
    pub fn browser_actions(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| {
                !matches!(
                    call.primitive,
                    Primitive::CurrentUrl | Primitive::Snapshot | Primitive::Close
                )
            })
            .collect()
    }

    pub fn url(&self) -> String {
        self.state.lock().url.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }

    async fn enter(&self, primitive: Primitive, target: Option<&str>) -> Result<(), ActionError> {
        let delay = {
            let mut state = self.state.lock();
            if state.closed && primitive != Primitive::Close {
                return Err(ActionError::SessionClosed);
            }
            state.calls.push(RecordedCall {
                primitive,
                target: target.map(str::to_string),
            });
            state.delays.get(&primitive).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let state = self.state.lock();
        if let Some(err) = state.failures.get(&primitive) {
            return Err(err.clone());
        }
        if let Some(selector) = target {
            if state.missing_selectors.contains(selector) {
                return Err(ActionError::ElementNotFound(selector.to_string()));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    fn session_id(&self) -> &str {
        &self.id
    }

    async fn navigate(&self, url: &str) -> Result<(), ActionError> {
        let target = validate_url(url)?;
        self.enter(Primitive::Navigate, Some(url)).await?;
        let mut state = self.state.lock();
        let previous = std::mem::replace(&mut state.url, target.to_string());
        state.back_stack.push(previous);
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), ActionError> {
        self.enter(Primitive::Click, Some(selector)).await
    }

    async fn wait_for_navigation(&self) -> Result<(), ActionError> {
        self.enter(Primitive::WaitForNavigation, None).await
    }

    async fn fill(&self, selector: &str, _value: &str) -> Result<(), ActionError> {
        self.enter(Primitive::Fill, Some(selector)).await
    }

    async fn clear(&self, selector: &str) -> Result<(), ActionError> {
        self.enter(Primitive::Clear, Some(selector)).await
    }

    async fn hover(&self, selector: &str) -> Result<(), ActionError> {
        self.enter(Primitive::Hover, Some(selector)).await
    }

    async fn double_click(&self, selector: &str) -> Result<(), ActionError> {
        self.enter(Primitive::DoubleClick, Some(selector)).await
    }

    async fn scroll(&self, _direction: ScrollDirection) -> Result<(), ActionError> {
        self.enter(Primitive::Scroll, None).await
    }

    async fn select_option(&self, selector: &str, by: &SelectBy) -> Result<String, ActionError> {
        self.enter(Primitive::SelectOption, Some(selector)).await?;
        Ok(match by {
            SelectBy::Value(value) | SelectBy::Label(value) => value.clone(),
            SelectBy::Index(index) => index.to_string(),
        })
    }

    async fn go_back(&self) -> Result<(), ActionError> {
        self.enter(Primitive::GoBack, None).await?;
        let mut state = self.state.lock();
        if let Some(previous) = state.back_stack.pop() {
            state.url = previous;
        }
        Ok(())
    }

    async fn reload(&self) -> Result<(), ActionError> {
        self.enter(Primitive::Reload, None).await
    }

    async fn screenshot(&self, path: &Path, _full_page: bool) -> Result<(), ActionError> {
        let target = path.display().to_string();
        self.enter(Primitive::Screenshot, Some(&target)).await
    }

    async fn current_url(&self) -> Result<String, ActionError> {
        self.enter(Primitive::CurrentUrl, None).await?;
        Ok(self.url())
    }

    async fn snapshot(&self) -> Result<PageState, ActionError> {
        self.enter(Primitive::Snapshot, None).await?;
        let state = self.state.lock();
        Ok(PageState {
            url: state.url.clone(),
            title: state.title.clone(),
            text: state.text.clone(),
        })
    }

    async fn close(&self) -> Result<(), ActionError> {
        self.enter(Primitive::Close, None).await?;
        self.close_count.fetch_add(1, Ordering::SeqCst);
        self.state.lock().closed = true;
        Ok(())
    }
}

/// Launcher handing out one shared [`ScriptedSession`], or failing on demand.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLauncher {
    session: ScriptedSession,
    failure: Option<ActionError>,
    launches: Arc<AtomicUsize>,
}

impl ScriptedLauncher {
    pub fn new(session: ScriptedSession) -> Self {
        Self {
            session,
            failure: None,
            launches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A launcher whose every launch attempt fails with `error`.
    pub fn failing(error: ActionError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn session(&self) -> &ScriptedSession {
        &self.session
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionLauncher for ScriptedLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, ActionError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(Box::new(self.session.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn navigate_and_go_back_track_history() {
        let session = ScriptedSession::new();
        session.navigate("https://example.com").await.unwrap();
        session.navigate("https://example.com/docs").await.unwrap();
        session.go_back().await.unwrap();
        assert_eq!(session.url(), "https://example.com/");
        assert_eq!(session.browser_actions().len(), 3);
    }

    #[tokio::test]
    async fn missing_selector_is_element_not_found() {
        let session = ScriptedSession::new().missing_selector("#nope");
        let err = session.click("#nope").await.unwrap_err();
        assert_eq!(err, ActionError::ElementNotFound("#nope".into()));
    }

    #[tokio::test]
    async fn closed_session_rejects_actions() {
        let session = ScriptedSession::new();
        session.close().await.unwrap();
        assert!(session.is_closed());
        assert_eq!(
            session.reload().await.unwrap_err(),
            ActionError::SessionClosed
        );
    }

    #[tokio::test]
    async fn failing_launcher_reports_error() {
        let launcher = ScriptedLauncher::failing(ActionError::Launch("no chrome".into()));
        assert!(launcher.launch().await.is_err());
        assert_eq!(launcher.launches(), 1);
    }
}
