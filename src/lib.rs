//! WebPilot: goal-driven browser automation.
//!
//! The binary wires the agent core to a Chromium session, an
//! OpenAI-compatible plan generator and a terminal progress renderer.

pub mod cli;
pub mod config;
pub mod llm;
pub mod runtime;

pub use config::AppConfig;
