use std::sync::Arc;

use action_primitives::ChromiumLauncher;
use agent_core::{AgentError, ProgressEvent, RunOutcome, RunStatus};
use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::{info, warn};
use uuid::Uuid;
use webpilot_event_bus::{to_mpsc, EventBus};

use crate::cli::output::OutputFormat;
use crate::cli::progress;
use crate::config::AppConfig;
use crate::llm::{OpenAiConfig, OpenAiPlanGenerator};
use crate::runtime;

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Natural-language goal to accomplish
    #[arg(short, long)]
    pub goal: String,

    /// Iteration ceiling (defaults to agent.max_iterations)
    #[arg(short = 'n', long)]
    pub max_iterations: Option<u32>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,
}

pub async fn cmd_run(args: RunArgs, config: Arc<AppConfig>, output: OutputFormat) -> Result<()> {
    let goal = args.goal.trim().to_string();
    if goal.is_empty() {
        bail!("--goal must not be empty");
    }
    let max_iterations = args.max_iterations.unwrap_or(config.agent.max_iterations);
    if max_iterations == 0 {
        bail!("--max-iterations must be at least 1");
    }

    let mut browser = config.browser.clone();
    if args.headed {
        browser.headless = false;
    }

    let generator = OpenAiPlanGenerator::new(OpenAiConfig::from(&config.llm))
        .context("Failed to initialise the plan generator")?;
    let registry =
        runtime::build_registry(&config, None).context("Failed to build the tool registry")?;
    let bus = runtime::progress_bus(&config);
    let controller = runtime::build_controller(
        &config,
        registry,
        Arc::new(generator),
        Arc::new(ChromiumLauncher::new(browser)),
        Some(bus.clone() as Arc<dyn EventBus<ProgressEvent>>),
    );

    let renderer = (output == OutputFormat::Human).then(|| {
        let mut events = to_mpsc::<ProgressEvent>(&*bus, config.agent.event_capacity);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                println!("{}", progress::render(&event));
                if matches!(event, ProgressEvent::RunFinished { .. }) {
                    break;
                }
            }
        })
    });

    let cancel = controller.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; stopping after the current step");
            cancel.cancel();
        }
    });

    let result = controller.run(&goal, max_iterations).await;
    interrupt.abort();
    if let Some(renderer) = renderer {
        if result.is_err() {
            renderer.abort();
        } else if let Err(err) = renderer.await {
            warn!(error = %err, "progress renderer stopped unexpectedly");
        }
    }

    match result {
        Ok(outcome) => {
            info!(status = outcome.status.as_str(), "run complete");
            report(&outcome, output)?;
            if outcome.status == RunStatus::Completed {
                Ok(())
            } else {
                bail!(
                    "run ended with {} after {} iterations",
                    outcome.status.as_str(),
                    outcome.iterations
                )
            }
        }
        Err(err @ AgentError::Startup(_)) => {
            if output != OutputFormat::Human {
                output.print_document(&RunOutcome::startup_failed(Uuid::new_v4()))?;
            }
            Err(err).context("Browser session could not be started")
        }
        Err(err) => Err(err.into()),
    }
}

fn report(outcome: &RunOutcome, output: OutputFormat) -> Result<()> {
    if output != OutputFormat::Human {
        return output.print_document(outcome);
    }
    println!();
    println!("Run {}", outcome.run_id);
    println!("  status:     {}", outcome.status.as_str());
    println!("  iterations: {}", outcome.iterations);
    println!(
        "  steps:      {} ({} succeeded)",
        outcome.history.len(),
        outcome.history.success_count()
    );
    let outputs: Vec<&String> = outcome
        .history
        .iter()
        .flat_map(|result| result.outputs_created.iter())
        .collect();
    if !outputs.is_empty() {
        println!("  outputs:");
        for path in outputs {
            println!("    - {}", path);
        }
    }
    Ok(())
}
