//! Core data types for browser primitives

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed classification of primitive failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaultClass {
    NavigationError,
    Timeout,
    ElementNotFound,
    Other,
    /// No fault occurred
    None,
}

impl FaultClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultClass::NavigationError => "navigation-error",
            FaultClass::Timeout => "timeout",
            FaultClass::ElementNotFound => "element-not-found",
            FaultClass::Other => "other",
            FaultClass::None => "none",
        }
    }
}

impl fmt::Display for FaultClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction for viewport scrolling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    /// Sign applied to the viewport height when scrolling.
    pub fn sign(&self) -> i32 {
        match self {
            ScrollDirection::Up => -1,
            ScrollDirection::Down => 1,
        }
    }
}

impl fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrollDirection::Up => f.write_str("up"),
            ScrollDirection::Down => f.write_str("down"),
        }
    }
}

/// How an `<option>` is matched inside a `<select>` element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectBy {
    Value(String),
    Label(String),
    Index(u32),
}

impl fmt::Display for SelectBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectBy::Value(value) => write!(f, "value '{}'", value),
            SelectBy::Label(label) => write!(f, "label '{}'", label),
            SelectBy::Index(index) => write!(f, "index {}", index),
        }
    }
}

/// Raw page state captured for the page-content summarizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    /// Current page URL
    pub url: String,

    /// Document title, when the page has one
    pub title: Option<String>,

    /// Visible text of the document body
    pub text: String,
}

/// Validate a navigation target before it reaches the browser.
pub fn validate_url(raw: &str) -> Result<url::Url, crate::ActionError> {
    if raw.trim().is_empty() {
        return Err(crate::ActionError::InvalidArgument(
            "URL cannot be empty".to_string(),
        ));
    }
    let parsed = url::Url::parse(raw.trim())
        .map_err(|err| crate::ActionError::InvalidArgument(format!("{}: {}", raw, err)))?;
    match parsed.scheme() {
        "http" | "https" | "file" => Ok(parsed),
        other => Err(crate::ActionError::InvalidArgument(format!(
            "unsupported URL scheme: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_validation() {
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url("http://localhost:8080").is_ok());
        assert!(validate_url("file:///path/to/file.html").is_ok());

        assert!(validate_url("").is_err());
        assert!(validate_url("example.com").is_err());
        assert!(validate_url("ftp://example.com").is_err());
    }

    #[test]
    fn fault_class_serializes_kebab_case() {
        let json = serde_json::to_string(&FaultClass::ElementNotFound).unwrap();
        assert_eq!(json, "\"element-not-found\"");
        assert_eq!(FaultClass::NavigationError.to_string(), "navigation-error");
    }
}
