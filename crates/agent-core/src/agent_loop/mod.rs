//! Plan/execute iteration loop.
//!
//! # Architecture
//!
//! ```text
//! session = launch()                    // fatal on failure
//! for i in 1..=max_iterations:
//!     plan = planner.plan(context)       // failure = null iteration
//!     result = executor.execute(plan)    // errors become FAILURE results
//!     history.append(result)
//!     if complete(plan, result): break
//! session.close()                        // on every exit path
//! ```
//!
//! # Key Components
//!
//! - [`AgentLoopConfig`]: Immutable loop configuration
//! - [`IterationController`]: Main loop orchestrator

pub mod config;
pub mod controller;

pub use config::{ActionTimeouts, AgentLoopConfig};
pub use controller::IterationController;
