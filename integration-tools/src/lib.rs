//! Tool contract and execution.
//!
//! A [`Tool`] describes itself through [`ToolMetadata`] and executes against a
//! [`Payload`](integration_primitives::Payload). Callers reach tools only via
//! the [`ToolOrchestrator`] trait; [`LocalOrchestrator`] runs them in-process.

#![warn(missing_docs, clippy::pedantic)]

mod orchestrator;
mod tool;

pub use orchestrator::{LocalOrchestrator, ToolOrchestrator};
pub use tool::{FnTool, Tool, ToolError, ToolMetadata, ToolOutput, ToolResult};
