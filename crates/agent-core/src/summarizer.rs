//! Page-content summarizer contract.

use action_primitives::PageState;

/// Turns raw page state into bounded text for the planner.
pub trait PageSummarizer: Send + Sync {
    fn summarize(&self, page: &PageState) -> String;
}

/// Collapses whitespace and cuts the page text at a character budget.
#[derive(Debug, Clone)]
pub struct TruncatingSummarizer {
    max_chars: usize,
}

impl TruncatingSummarizer {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

impl PageSummarizer for TruncatingSummarizer {
    fn summarize(&self, page: &PageState) -> String {
        let mut header = format!("URL: {}", page.url);
        if let Some(title) = page.title.as_deref().filter(|t| !t.trim().is_empty()) {
            header.push_str(&format!("\nTitle: {}", title.trim()));
        }
        let body = page.text.split_whitespace().collect::<Vec<_>>().join(" ");
        let summary = if body.is_empty() {
            header
        } else {
            format!("{}\n\n{}", header, body)
        };
        clamp(summary, self.max_chars)
    }
}

/// Cut `text` to at most `max_chars` characters, marking the cut with `…`.
fn clamp(text: String, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text;
    }
    let mut kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    if max_chars > 0 {
        kept.push('…');
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(text: &str) -> PageState {
        PageState {
            url: "https://example.com/".into(),
            title: Some("Example Domain".into()),
            text: text.into(),
        }
    }

    #[test]
    fn summary_never_exceeds_budget() {
        let summarizer = TruncatingSummarizer::new(80);
        let summary = summarizer.summarize(&page(&"word ".repeat(200)));
        assert!(summary.chars().count() <= 80);
        assert!(summary.ends_with('…'));
        assert!(summary.starts_with("URL: https://example.com/\nTitle: Example Domain"));
    }

    #[test]
    fn long_header_is_cut_to_budget() {
        let summarizer = TruncatingSummarizer::new(20);
        let mut long = page("body text");
        long.url = format!("https://example.com/{}", "segment/".repeat(20));
        let summary = summarizer.summarize(&long);
        assert_eq!(summary.chars().count(), 20);
        assert!(summary.starts_with("URL: https://"));
        assert!(summary.ends_with('…'));

        assert_eq!(TruncatingSummarizer::new(0).summarize(&long), "");
    }

    #[test]
    fn whitespace_is_collapsed() {
        let summarizer = TruncatingSummarizer::new(500);
        let summary = summarizer.summarize(&page("  This   domain\n\nis for   examples. "));
        assert!(summary.ends_with("This domain is for examples."));
    }
}
