use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::adapter::{ToolAdapter, ToolDescriptor};
use crate::builtin::{builtin_adapter, builtin_adapters, BuiltinOptions};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),
    #[error("Invalid tool name '{0}': expected lowercase letters, digits and underscores")]
    InvalidName(String),
    #[error("Unknown tool '{0}'")]
    UnknownTool(String),
}

/// Collects adapters before freezing them into a [`ToolRegistry`].
#[derive(Default)]
pub struct ToolRegistryBuilder {
    adapters: BTreeMap<String, Arc<dyn ToolAdapter>>,
}

impl ToolRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, adapter: Arc<dyn ToolAdapter>) -> Result<Self, RegistryError> {
        let name = adapter.name().to_string();
        if !is_valid_name(&name) {
            return Err(RegistryError::InvalidName(name));
        }
        if self.adapters.contains_key(&name) {
            return Err(RegistryError::DuplicateTool(name));
        }
        debug!(tool = %name, class = %adapter.action_class(), "registered tool adapter");
        self.adapters.insert(name, adapter);
        Ok(self)
    }

    pub fn register_all(
        mut self,
        adapters: impl IntoIterator<Item = Arc<dyn ToolAdapter>>,
    ) -> Result<Self, RegistryError> {
        for adapter in adapters {
            self = self.register(adapter)?;
        }
        Ok(self)
    }

    pub fn build(self) -> ToolRegistry {
        ToolRegistry {
            adapters: Arc::new(self.adapters),
        }
    }
}

/// Immutable name → adapter table shared by the executor.
#[derive(Clone)]
pub struct ToolRegistry {
    adapters: Arc<BTreeMap<String, Arc<dyn ToolAdapter>>>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::new()
    }

    /// Registry holding every built-in adapter.
    pub fn with_builtin_tools(options: &BuiltinOptions) -> Result<Self, RegistryError> {
        Ok(Self::builder()
            .register_all(builtin_adapters(options))?
            .build())
    }

    /// Registry restricted to the named built-ins.
    pub fn with_enabled_tools<S: AsRef<str>>(
        names: &[S],
        options: &BuiltinOptions,
    ) -> Result<Self, RegistryError> {
        let mut builder = Self::builder();
        for name in names {
            let name = name.as_ref();
            let adapter = builtin_adapter(name, options)
                .ok_or_else(|| RegistryError::UnknownTool(name.to_string()))?;
            builder = builder.register(adapter)?;
        }
        Ok(builder.build())
    }

    /// Find the adapter for a planner tool hint.
    ///
    /// Hints are matched after lowercasing and folding '-' and spaces into
    /// '_'; a trailing "_tool" suffix is ignored.
    pub fn resolve(&self, hint: &str) -> Option<Arc<dyn ToolAdapter>> {
        let normalized = normalize_hint(hint);
        if normalized.is_empty() {
            return None;
        }
        if let Some(adapter) = self.adapters.get(&normalized) {
            return Some(adapter.clone());
        }
        normalized
            .strip_suffix("_tool")
            .and_then(|stem| self.adapters.get(stem))
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.adapters.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.adapters.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.adapters
            .values()
            .map(|adapter| adapter.descriptor())
            .collect()
    }

    /// Tool catalog rendered for the planner prompt.
    pub fn prompt_for_llm(&self) -> String {
        let mut blocks = Vec::with_capacity(self.adapters.len() + 1);
        blocks.push("Available browser tools:".to_string());
        blocks.extend(self.descriptors().iter().map(ToolDescriptor::prompt_block));
        blocks.join("\n")
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .next()
            .is_some_and(|ch| ch.is_ascii_lowercase())
        && name
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_')
}

fn normalize_hint(hint: &str) -> String {
    hint.trim()
        .to_ascii_lowercase()
        .chars()
        .map(|ch| if ch == '-' || ch == ' ' { '_' } else { ch })
        .collect()
}
