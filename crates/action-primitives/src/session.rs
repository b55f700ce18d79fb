use async_trait::async_trait;
use std::path::Path;

use crate::errors::ActionError;
use crate::types::{PageState, ScrollDirection, SelectBy};

/// One exclusively owned browser context and page.
///
/// Each primitive resolves to a typed outcome: `Ok` once the browser has
/// applied the action, or an [`ActionError`] whose [`crate::FaultClass`] tells
/// the caller what went wrong. Implementations bound every call with a
/// timeout so a hung page can never block the caller indefinitely.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Identifier used to correlate log lines for this session
    fn session_id(&self) -> &str;

    /// Load `url` and wait for the load event
    async fn navigate(&self, url: &str) -> Result<(), ActionError>;

    /// Click the first element matching `selector`
    async fn click(&self, selector: &str) -> Result<(), ActionError>;

    /// Wait until a navigation triggered by a previous action settles
    async fn wait_for_navigation(&self) -> Result<(), ActionError>;

    /// Replace the value of an input with `value`
    async fn fill(&self, selector: &str, value: &str) -> Result<(), ActionError>;

    /// Empty the value of an input
    async fn clear(&self, selector: &str) -> Result<(), ActionError>;

    /// Move the pointer over an element
    async fn hover(&self, selector: &str) -> Result<(), ActionError>;

    /// Double-click an element
    async fn double_click(&self, selector: &str) -> Result<(), ActionError>;

    /// Scroll the viewport by one screen
    async fn scroll(&self, direction: ScrollDirection) -> Result<(), ActionError>;

    /// Select an option of a `<select>` element, returning the chosen value
    async fn select_option(&self, selector: &str, by: &SelectBy) -> Result<String, ActionError>;

    /// Go back one entry in the session history
    async fn go_back(&self) -> Result<(), ActionError>;

    /// Reload the current page
    async fn reload(&self) -> Result<(), ActionError>;

    /// Capture a PNG screenshot into `path`
    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<(), ActionError>;

    /// Read the URL of the current page
    async fn current_url(&self) -> Result<String, ActionError>;

    /// Capture url, title and visible text for summarization
    async fn snapshot(&self) -> Result<PageState, ActionError>;

    /// Release the browser. Calling it twice is a no-op.
    async fn close(&self) -> Result<(), ActionError>;
}

/// Acquires a fresh [`BrowserSession`] for a single run.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, ActionError>;
}
