//! Tool adapter registry.
//!
//! Maps tool names requested by the planner onto typed capabilities over a
//! [`action_primitives::BrowserSession`]. Every adapter publishes its name,
//! parameter schema and idempotency hint, and reports each invocation as an
//! [`ActionOutcome`] with a fixed [`FaultClass`].

mod adapter;
pub mod builtin;
mod registry;

pub use action_primitives::FaultClass;
pub use adapter::{ActionClass, ActionOutcome, ToolAdapter, ToolDescriptor};
pub use builtin::{BuiltinOptions, CredentialResolver};
pub use registry::{RegistryError, ToolRegistry, ToolRegistryBuilder};
