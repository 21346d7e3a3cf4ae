use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors a tool reports about its own execution.
///
/// These never end a turn: the dispatcher turns them into an error
/// [`ToolResult`](super::ToolResult) for the model to read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum ToolError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("execution failed: {0}")]
    Execution(String),
}
