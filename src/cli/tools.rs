use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::OutputFormat;
use crate::config::AppConfig;
use crate::runtime;

#[derive(Args, Clone, Debug)]
pub struct ToolsArgs {
    /// Print the catalog exactly as the planner receives it
    #[arg(long)]
    pub prompt: bool,
}

pub async fn cmd_tools(args: ToolsArgs, config: Arc<AppConfig>, output: OutputFormat) -> Result<()> {
    let registry =
        runtime::build_registry(&config, None).context("Failed to build the tool registry")?;

    if args.prompt {
        println!("{}", registry.prompt_for_llm());
        return Ok(());
    }

    let descriptors = registry.descriptors();
    if output != OutputFormat::Human {
        return output.print_document(&descriptors);
    }
    if descriptors.is_empty() {
        println!("[no tools registered]");
        return Ok(());
    }
    println!("{:<22} {:<15} {:<10} {}", "Name", "Class", "Idempotent", "Description");
    println!("{}", "-".repeat(90));
    for descriptor in descriptors {
        println!(
            "{:<22} {:<15} {:<10} {}",
            descriptor.name,
            descriptor.action_class.to_string(),
            if descriptor.idempotent { "yes" } else { "no" },
            descriptor.description
        );
    }
    Ok(())
}
