//! The closed tool table: one executor and one schema per [`ToolKind`].

use std::sync::Arc;

use super::{definition, ToolExecutor, ToolKind, TOOL_COUNT};
use crate::ToolDefinition;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no executor registered for tool {0}")]
    MissingExecutor(ToolKind),
    #[error("schema for tool {kind} is named {found:?}")]
    SchemaMismatch { kind: ToolKind, found: String },
}

/// Read-only after construction; shared across connections behind an `Arc`.
pub struct ToolRegistry {
    definitions: Vec<ToolDefinition>,
    executors: Vec<Arc<dyn ToolExecutor>>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Schemas for every tool, in [`ToolKind::ALL`] order.
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Resolve a tool name from a model reply.
    pub fn lookup(&self, name: &str) -> Option<ToolKind> {
        ToolKind::from_name(name)
    }

    pub fn executor(&self, kind: ToolKind) -> &dyn ToolExecutor {
        self.executors[kind.index()].as_ref()
    }

    pub fn len(&self) -> usize {
        self.executors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }
}

#[derive(Default)]
pub struct ToolRegistryBuilder {
    executors: [Option<Arc<dyn ToolExecutor>>; TOOL_COUNT],
    definitions: [Option<ToolDefinition>; TOOL_COUNT],
}

impl ToolRegistryBuilder {
    pub fn register(mut self, kind: ToolKind, executor: Arc<dyn ToolExecutor>) -> Self {
        self.executors[kind.index()] = Some(executor);
        self
    }

    /// Replace the built-in schema for `kind`.
    pub fn with_definition(mut self, kind: ToolKind, def: ToolDefinition) -> Self {
        self.definitions[kind.index()] = Some(def);
        self
    }

    /// Check that every kind is covered and every schema carries its kind's name.
    pub fn build(self) -> Result<ToolRegistry, RegistryError> {
        let mut definitions = Vec::with_capacity(TOOL_COUNT);
        let mut executors = Vec::with_capacity(TOOL_COUNT);

        for ((kind, executor), def) in ToolKind::ALL
            .into_iter()
            .zip(self.executors)
            .zip(self.definitions)
        {
            let executor = executor.ok_or(RegistryError::MissingExecutor(kind))?;
            let def = def.unwrap_or_else(|| definition(kind));
            if def.name != kind.name() {
                return Err(RegistryError::SchemaMismatch {
                    kind,
                    found: def.name,
                });
            }
            definitions.push(def);
            executors.push(executor);
        }

        Ok(ToolRegistry {
            definitions,
            executors,
        })
    }
}
