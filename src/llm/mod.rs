//! Plan generation backends.

mod openai;
mod prompt;

pub use openai::{OpenAiConfig, OpenAiPlanGenerator};
pub use prompt::PromptBuilder;
