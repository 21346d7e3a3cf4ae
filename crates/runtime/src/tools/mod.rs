//! Tool descriptors, registries and dispatch.

mod descriptor;
mod dispatcher;
pub mod errors;
mod local;
pub mod math;
mod remote;
mod tool;
mod types;

pub use descriptor::{FunctionDefinition, FunctionSchema, ToolDescriptor, convert, convert_all};
pub use dispatcher::Dispatcher;
pub use errors::ToolError;
pub use local::LocalTools;
pub use remote::RemoteTools;
pub use tool::{FnTool, Tool};
pub use types::ToolResult;
