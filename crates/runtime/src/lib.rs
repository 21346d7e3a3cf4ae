//! Wizard runtime: the agent loop, its model backend and its tools.
//!
//! # Overview
//!
//! - **Conversation**: ordered, append-only message history.
//! - **Backend**: trait abstracting LLM providers; [`OpenAiBackend`] speaks
//!   the OpenAI chat completions API.
//! - **Dispatcher**: runs tool calls, either in-process ([`LocalTools`]) or
//!   through an MCP server ([`RemoteTools`]).
//! - **Agent**: the turn loop tying the three together.
//!
//! # Example
//!
//! ```no_run
//! use runtime::{Agent, OpenAiBackend, tools::math};
//!
//! # async fn example() -> runtime::Result<()> {
//! let backend = OpenAiBackend::builder("sk-...").model("gpt-4o-mini").build();
//! let mut agent = Agent::builder(backend)
//!     .system_prompt("You are Math Wizard.")
//!     .dispatcher(math::registry()?)
//!     .build()?;
//!
//! let outcome = agent.run("What is 15 plus 7?").await;
//! println!("{}", outcome.reply());
//! agent.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod agent;
mod conversation;
mod error;
pub mod llm;
pub mod providers;
pub mod tools;

pub use agent::{
    APOLOGY, Agent, AgentBuilder, DEFAULT_MAX_ITERATIONS, ToolCallPolicy, TurnOutcome,
};
pub use conversation::Conversation;
pub use error::{Error, Result};
pub use llm::{
    Backend, Completion, Message, ModelError, ModelRequest, ModelResponse, Role, ToolCallRequest,
    Usage,
};
pub use providers::{OpenAiBackend, OpenAiBackendBuilder};
pub use tools::{
    Dispatcher, FunctionSchema, LocalTools, RemoteTools, Tool, ToolDescriptor, ToolError,
    ToolResult,
};
