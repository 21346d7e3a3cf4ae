use crate::llm::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("model call failed: {0}")]
    Model(#[from] ModelError),

    #[error("tool host error: {0}")]
    Mcp(#[from] mcp::Error),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid schema for tool `{tool}`: {reason}")]
    InvalidSchema { tool: String, reason: String },

    #[error("duplicate tool name: {0}")]
    DuplicateTool(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("model returned neither text nor tool calls")]
    EmptyCompletion,

    #[error("no final answer after {0} model calls")]
    IterationLimit(usize),
}

impl Error {
    /// Whether this is a network-level failure talking to the model or the
    /// tool host.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Model(_) | Self::Mcp(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
