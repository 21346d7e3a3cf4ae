//! Provider-agnostic model types and the backend trait.

pub mod errors;
pub mod types;

pub use errors::ModelError;
pub use types::{
    Backend, Completion, Message, ModelRequest, ModelResponse, Role, ToolCallRequest, Usage,
};
