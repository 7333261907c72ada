//! Tool orchestration boundary and the in-process implementation.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use integration_primitives::{Payload, ServiceId};
use tracing::{debug, info};

use crate::tool::{Tool, ToolError, ToolMetadata, ToolOutput, ToolResult};

/// Owns registered tools and dispatches calls to them.
#[async_trait]
pub trait ToolOrchestrator: Send + Sync {
    /// Registers a tool and returns its metadata.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::DuplicateTool`] if the id is already present.
    fn register(&self, tool: Arc<dyn Tool>) -> ToolResult<ToolMetadata>;

    /// Removes a tool, returning its metadata when it was registered.
    fn unregister(&self, id: &ServiceId) -> Option<ToolMetadata>;

    /// Executes a registered tool.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] when the id is not registered or
    /// propagates the tool's own error.
    async fn execute(&self, id: &ServiceId, parameters: Payload) -> ToolResult<ToolOutput>;

    /// Lists the metadata of all registered tools.
    fn list(&self) -> Vec<ToolMetadata>;
}

/// Orchestrator that runs tools on the caller's task.
#[derive(Default)]
pub struct LocalOrchestrator {
    tools: RwLock<HashMap<ServiceId, Arc<dyn Tool>>>,
}

impl fmt::Debug for LocalOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.read().keys().cloned().collect();
        ids.sort();
        f.debug_struct("LocalOrchestrator")
            .field("registered", &ids)
            .finish()
    }
}

impl LocalOrchestrator {
    /// Creates an empty orchestrator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, id: &ServiceId) -> Option<Arc<dyn Tool>> {
        self.read().get(id).cloned()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ServiceId, Arc<dyn Tool>>> {
        self.tools.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ServiceId, Arc<dyn Tool>>> {
        self.tools.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ToolOrchestrator for LocalOrchestrator {
    fn register(&self, tool: Arc<dyn Tool>) -> ToolResult<ToolMetadata> {
        let metadata = tool.metadata().clone();
        let mut tools = self.write();
        if tools.contains_key(metadata.id()) {
            return Err(ToolError::DuplicateTool {
                id: metadata.id().clone(),
            });
        }
        tools.insert(metadata.id().clone(), tool);
        info!(tool_id = %metadata.id(), version = metadata.version(), "tool registered");
        Ok(metadata)
    }

    fn unregister(&self, id: &ServiceId) -> Option<ToolMetadata> {
        let removed = self.write().remove(id)?;
        info!(tool_id = %id, "tool unregistered");
        Some(removed.metadata().clone())
    }

    async fn execute(&self, id: &ServiceId, parameters: Payload) -> ToolResult<ToolOutput> {
        // Clone the handle so the lock is not held across the await.
        let tool = self
            .get(id)
            .ok_or_else(|| ToolError::UnknownTool { id: id.clone() })?;
        debug!(tool_id = %id, "executing tool");
        tool.execute(parameters).await
    }

    fn list(&self) -> Vec<ToolMetadata> {
        let mut listed: Vec<_> = self
            .read()
            .values()
            .map(|tool| tool.metadata().clone())
            .collect();
        listed.sort_by(|a, b| a.id().cmp(b.id()));
        listed
    }
}

#[cfg(test)]
mod tests {
    use integration_primitives::{CapabilityId, DynamicValue};

    use super::*;
    use crate::tool::FnTool;

    fn echo(id: &str) -> Arc<dyn Tool> {
        let metadata = ToolMetadata::new(ServiceId::new(id).unwrap(), "Echo", "1.0.0")
            .unwrap()
            .with_capabilities(vec![CapabilityId::new("echo").unwrap()]);
        Arc::new(FnTool::new(metadata, |parameters: Payload| async move {
            Ok(ToolOutput::success(parameters))
        }))
    }

    #[tokio::test]
    async fn register_and_execute_tool() {
        let orchestrator = LocalOrchestrator::new();
        let metadata = orchestrator.register(echo("echo")).unwrap();
        assert_eq!(metadata.id().as_str(), "echo");

        let mut parameters = Payload::new();
        parameters.insert("message".into(), "hello".into());
        let output = orchestrator
            .execute(metadata.id(), parameters.clone())
            .await
            .unwrap();
        assert_eq!(output.data, DynamicValue::Map(parameters));
    }

    #[test]
    fn duplicate_registration_errors() {
        let orchestrator = LocalOrchestrator::new();
        orchestrator.register(echo("echo")).unwrap();

        let err = orchestrator
            .register(echo("echo"))
            .expect_err("duplicate registration should fail");
        assert!(matches!(err, ToolError::DuplicateTool { id } if id.as_str() == "echo"));
    }

    #[tokio::test]
    async fn unknown_tool_errors() {
        let orchestrator = LocalOrchestrator::new();
        let missing = ServiceId::new("missing").unwrap();
        let err = orchestrator
            .execute(&missing, Payload::new())
            .await
            .expect_err("unknown tool should error");

        assert_eq!(err, ToolError::UnknownTool { id: missing });
    }

    #[tokio::test]
    async fn unregistered_tool_is_gone() {
        let orchestrator = LocalOrchestrator::new();
        orchestrator.register(echo("a")).unwrap();
        orchestrator.register(echo("b")).unwrap();

        let id = ServiceId::new("a").unwrap();
        assert!(orchestrator.unregister(&id).is_some());
        assert!(orchestrator.unregister(&id).is_none());
        assert!(orchestrator.execute(&id, Payload::new()).await.is_err());

        let listed: Vec<_> = orchestrator
            .list()
            .into_iter()
            .map(|metadata| metadata.id().to_string())
            .collect();
        assert_eq!(listed, vec!["b".to_owned()]);
    }
}
