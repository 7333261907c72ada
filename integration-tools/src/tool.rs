//! Tool metadata, outputs, and the executor trait.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use integration_primitives::{CapabilityId, DynamicValue, Payload, ServiceId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Metadata describing a tool.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolMetadata {
    id: ServiceId,
    name: String,
    version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    capabilities: Vec<CapabilityId>,
}

impl ToolMetadata {
    /// Creates metadata for the supplied identifier, display name, and version.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidMetadata`] if the name or version is empty.
    pub fn new(
        id: ServiceId,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> ToolResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ToolError::InvalidMetadata {
                reason: "tool name cannot be empty".into(),
            });
        }

        let version = version.into();
        if version.trim().is_empty() {
            return Err(ToolError::InvalidMetadata {
                reason: "tool version cannot be empty".into(),
            });
        }

        Ok(Self {
            id,
            name,
            version,
            description: None,
            capabilities: Vec::new(),
        })
    }

    /// Sets the human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attaches the capabilities the tool advertises.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Vec<CapabilityId>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Returns the tool identifier.
    #[must_use]
    pub fn id(&self) -> &ServiceId {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the semantic version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the advertised capabilities.
    #[must_use]
    pub fn capabilities(&self) -> &[CapabilityId] {
        &self.capabilities
    }
}

/// Value produced by a completed tool call.
///
/// A call can complete and still report `success == false`; that is distinct
/// from a [`ToolError`], which means the call itself failed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolOutput {
    /// Whether the tool considers the call successful.
    pub success: bool,
    /// Tool-specific result data.
    #[serde(default)]
    pub data: DynamicValue,
}

impl ToolOutput {
    /// Successful output carrying `data`.
    #[must_use]
    pub fn success(data: impl Into<DynamicValue>) -> Self {
        Self {
            success: true,
            data: data.into(),
        }
    }

    /// Completed but unsuccessful output carrying `data`.
    #[must_use]
    pub fn failure(data: impl Into<DynamicValue>) -> Self {
        Self {
            success: false,
            data: data.into(),
        }
    }
}

/// Trait implemented by tool executors.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Describes the tool.
    fn metadata(&self) -> &ToolMetadata;

    /// Executes the tool with the given parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Execution`] when the call cannot complete.
    async fn execute(&self, parameters: Payload) -> ToolResult<ToolOutput>;
}

/// Tool backed by an async closure.
pub struct FnTool<F> {
    metadata: ToolMetadata,
    executor: F,
}

impl<F> FnTool<F> {
    /// Wraps `executor` under the supplied metadata.
    #[must_use]
    pub fn new(metadata: ToolMetadata, executor: F) -> Self {
        Self { metadata, executor }
    }
}

impl<F> fmt::Debug for FnTool<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTool")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> Tool for FnTool<F>
where
    F: Send + Sync + Fn(Payload) -> Fut,
    Fut: Future<Output = ToolResult<ToolOutput>> + Send,
{
    fn metadata(&self) -> &ToolMetadata {
        &self.metadata
    }

    async fn execute(&self, parameters: Payload) -> ToolResult<ToolOutput> {
        (self.executor)(parameters).await
    }
}

/// Errors produced by tool registration and invocation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// Tool metadata failed validation.
    #[error("invalid tool metadata: {reason}")]
    InvalidMetadata {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Tool id collided with an existing registration.
    #[error("tool `{id}` is already registered")]
    DuplicateTool {
        /// Identifier of the offending tool.
        id: ServiceId,
    },

    /// Requested tool does not exist.
    #[error("tool `{id}` is not registered")]
    UnknownTool {
        /// Identifier of the missing tool.
        id: ServiceId,
    },

    /// Tool execution failed.
    #[error("tool execution failed: {reason}")]
    Execution {
        /// Human-readable error returned by the tool implementation.
        reason: String,
    },
}

impl ToolError {
    /// Creates an execution error from the supplied reason.
    #[must_use]
    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution {
            reason: reason.into(),
        }
    }
}
