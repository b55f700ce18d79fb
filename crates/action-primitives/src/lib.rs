//! Browser session handle and primitive browser actions.
//!
//! This crate owns the lowest layer of WebPilot:
//! - [`BrowserSession`]: one browser context/page with bounded, typed primitives
//!   (navigate, click, fill, hover, double-click, scroll, select-option, go-back,
//!   reload, screenshot, read-current-url)
//! - [`SessionLauncher`]: acquires a fresh session for a run
//! - [`ChromiumLauncher`]: the Chromium DevTools Protocol implementation
//! - [`mock::ScriptedSession`]: an in-memory session for tests and offline runs

pub mod chromium;
pub mod errors;
pub mod mock;
mod session;
pub mod types;

pub use chromium::{ChromiumConfig, ChromiumLauncher, ChromiumSession};
pub use errors::*;
pub use session::{BrowserSession, SessionLauncher};
pub use types::*;
