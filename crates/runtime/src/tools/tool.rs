//! Tool trait and closure-backed tools.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::{ToolDescriptor, ToolError};

/// An in-process tool.
///
/// This is the boundary between the model loop and side effects: the
/// registry only needs the descriptor and a way to run the tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description and input schema.
    fn descriptor(&self) -> &ToolDescriptor;

    /// Run the tool with the model's arguments.
    async fn call(&self, arguments: Map<String, Value>) -> Result<Value, ToolError>;
}

type ToolFuture = Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send>>;

type Handler = dyn Fn(Map<String, Value>) -> ToolFuture + Send + Sync;

/// A tool backed by an async closure over typed arguments.
///
/// The argument object is deserialized into `A` before the closure runs, so
/// missing or mistyped arguments become [`ToolError::InvalidInput`].
pub struct FnTool {
    descriptor: ToolDescriptor,
    handler: Arc<Handler>,
}

impl FnTool {
    pub fn new<A, R, F, Fut>(descriptor: ToolDescriptor, handler: F) -> Self
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ToolError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        Self {
            descriptor,
            handler: Arc::new(move |arguments| -> ToolFuture {
                let handler = Arc::clone(&handler);
                Box::pin(async move {
                    let args: A = serde_json::from_value(Value::Object(arguments))
                        .map_err(|e| ToolError::InvalidInput(e.to_string()))?;
                    let output = (*handler)(args).await?;
                    serde_json::to_value(output)
                        .map_err(|e| ToolError::Execution(format!("serialize output: {e}")))
                })
            }),
        }
    }
}

#[async_trait]
impl Tool for FnTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn call(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        (self.handler)(arguments).await
    }
}

impl std::fmt::Debug for FnTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.descriptor.name)
            .finish()
    }
}
