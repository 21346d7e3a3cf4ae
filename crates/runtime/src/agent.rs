//! The orchestration loop.
//!
//! One call to [`Agent::run`] is one turn: the user message is appended, then
//! the model is called until it answers with text, the turn fails, or the
//! iteration limit is reached.
//!
//! ```text
//!                 ┌──────────────────────────────┐
//!                 v                              │
//!   user ──> AwaitingModel ──tool calls──> ModelRequestedTool
//!                 │
//!                 ├──text──────────> ModelReturnedText (answer)
//!                 └──empty/error───> TurnFailed (apology)
//! ```
//!
//! Every message produced along the way stays in the conversation, even when
//! the turn fails or is dropped half way.

use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::conversation::Conversation;
use crate::llm::{Backend, Completion, Message, ModelRequest, ToolCallRequest};
use crate::tools::{Dispatcher, FunctionSchema, ToolDescriptor, ToolResult, convert_all};
use crate::{Error, Result};

/// Reply shown to the user when a turn fails.
pub const APOLOGY: &str = "Sorry, I ran into a problem answering that. Please try again.";

/// Tool result recorded for calls cut off by a cancelled turn.
const CANCELLED: &str = "cancelled: the turn ended before this tool call finished";

/// Model calls allowed in one turn.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// What to do when one completion requests several tools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallPolicy {
    /// Run every request, one after the other, in the order given.
    #[default]
    Sequential,
    /// Run the first request and drop the rest.
    FirstOnly,
}

enum TurnState {
    AwaitingModel,
    ModelReturnedText(String),
    ModelRequestedTool(Vec<ToolCallRequest>),
    TurnFailed(Error),
}

/// How a turn ended.
#[derive(Debug)]
pub enum TurnOutcome {
    Answered(String),
    Failed(Error),
}

impl TurnOutcome {
    /// Text to show the user: the answer, or [`APOLOGY`].
    pub fn reply(&self) -> &str {
        match self {
            Self::Answered(text) => text,
            Self::Failed(_) => APOLOGY,
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered(_))
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Answered(_) => None,
            Self::Failed(e) => Some(e),
        }
    }

    pub fn into_result(self) -> Result<String> {
        match self {
            Self::Answered(text) => Ok(text),
            Self::Failed(e) => Err(e),
        }
    }
}

/// Builder for an [`Agent`].
pub struct AgentBuilder<B> {
    backend: B,
    dispatcher: Dispatcher,
    system_prompt: Option<String>,
    max_iterations: usize,
    policy: ToolCallPolicy,
}

impl<B: Backend> AgentBuilder<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            dispatcher: Dispatcher::none(),
            system_prompt: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            policy: ToolCallPolicy::default(),
        }
    }

    /// Where tools come from. Defaults to no tools.
    pub fn dispatcher(mut self, dispatcher: impl Into<Dispatcher>) -> Self {
        self.dispatcher = dispatcher.into();
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn tool_call_policy(mut self, policy: ToolCallPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the agent.
    ///
    /// Tool descriptors are converted here, so a bad schema or a repeated
    /// name fails before any model call.
    pub fn build(self) -> Result<Agent<B>> {
        if self.max_iterations == 0 {
            return Err(Error::Config("max_iterations must be at least 1".into()));
        }

        let tool_schemas = convert_all(self.dispatcher.descriptors())?;

        let mut conversation = Conversation::new();
        if let Some(prompt) = self.system_prompt {
            conversation.append(Message::system(prompt))?;
        }

        Ok(Agent {
            backend: self.backend,
            dispatcher: self.dispatcher,
            conversation,
            tool_schemas,
            max_iterations: self.max_iterations,
            policy: self.policy,
        })
    }
}

/// Drives turns between a user, a model backend and a tool dispatcher.
pub struct Agent<B> {
    backend: B,
    dispatcher: Dispatcher,
    conversation: Conversation,
    tool_schemas: Vec<FunctionSchema>,
    max_iterations: usize,
    policy: ToolCallPolicy,
}

impl<B: Backend> Agent<B> {
    pub fn builder(backend: B) -> AgentBuilder<B> {
        AgentBuilder::new(backend)
    }

    /// Answer one user request.
    ///
    /// Never panics on model or tool failures; they end the turn with
    /// [`TurnOutcome::Failed`].
    pub async fn run(&mut self, input: &str) -> TurnOutcome {
        let span = info_span!("turn", conversation = %self.conversation.id());
        self.run_turn(input).instrument(span).await
    }

    async fn run_turn(&mut self, input: &str) -> TurnOutcome {
        // A dropped turn can leave requests without results
        let pending = self.conversation.pending_calls().len();
        if pending > 0 {
            warn!(pending, "closing tool calls left open by an interrupted turn");
            self.close_pending(CANCELLED);
        }

        if let Err(e) = self.conversation.append(Message::user(input)) {
            return TurnOutcome::Failed(e);
        }

        let mut state = TurnState::AwaitingModel;
        let mut model_calls = 0;

        loop {
            state = match state {
                TurnState::AwaitingModel if model_calls >= self.max_iterations => {
                    TurnState::TurnFailed(Error::IterationLimit(self.max_iterations))
                }
                TurnState::AwaitingModel => {
                    model_calls += 1;
                    self.await_model().await
                }
                TurnState::ModelRequestedTool(calls) => match self.dispatch(calls).await {
                    Ok(()) => TurnState::AwaitingModel,
                    Err(e) => TurnState::TurnFailed(e),
                },
                TurnState::ModelReturnedText(text) => {
                    info!(model_calls, "turn answered");
                    return TurnOutcome::Answered(text);
                }
                TurnState::TurnFailed(error) => {
                    warn!(model_calls, error = %error, "turn failed");
                    return TurnOutcome::Failed(error);
                }
            };
        }
    }

    async fn await_model(&mut self) -> TurnState {
        let request = ModelRequest {
            messages: self.conversation.history(),
            tools: (!self.tool_schemas.is_empty()).then_some(self.tool_schemas.as_slice()),
        };

        let response = match self.backend.complete(request).await {
            Ok(response) => response,
            Err(e) => return TurnState::TurnFailed(e.into()),
        };

        let completion = match response.completion {
            Completion::ToolCalls { content, mut calls }
                if self.policy == ToolCallPolicy::FirstOnly && calls.len() > 1 =>
            {
                let dropped = calls.split_off(1);
                warn!(
                    kept = %calls[0].tool_name,
                    dropped = dropped.len(),
                    "dropping extra tool calls"
                );
                Completion::ToolCalls { content, calls }
            }
            completion => completion,
        };

        if let Err(e) = self.conversation.append(completion.to_message()) {
            return TurnState::TurnFailed(e);
        }

        match completion {
            Completion::Text(text) => TurnState::ModelReturnedText(text),
            Completion::ToolCalls { calls, .. } => TurnState::ModelRequestedTool(calls),
            Completion::Empty => TurnState::TurnFailed(Error::EmptyCompletion),
        }
    }

    async fn dispatch(&mut self, calls: Vec<ToolCallRequest>) -> Result<()> {
        for call in calls {
            let invoked = self
                .dispatcher
                .invoke(&call.tool_name, &call.arguments)
                .await;
            let result = match invoked {
                Ok(result) => result,
                Err(e) => {
                    self.close_pending(&e.to_string());
                    return Err(e);
                }
            };

            debug!(
                tool = %call.tool_name,
                id = %call.id,
                is_error = result.is_error,
                "tool call finished"
            );

            self.conversation
                .append(Message::tool(call.id, call.tool_name, result.content))?;
        }
        Ok(())
    }

    /// Record an error result for every request still open, so the history
    /// stays valid for the next model call.
    fn close_pending(&mut self, reason: &str) {
        for call in self.conversation.pending_calls() {
            let result = ToolResult::error(reason);
            let message = Message::tool(call.id, call.tool_name, result.content);
            if let Err(e) = self.conversation.append(message) {
                warn!(error = %e, "could not close tool call");
            }
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Tools offered to the model.
    pub fn tools(&self) -> &[ToolDescriptor] {
        self.dispatcher.descriptors()
    }

    pub fn tool_call_policy(&self) -> ToolCallPolicy {
        self.policy
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Release the tool session, if any.
    pub async fn shutdown(self) -> Result<()> {
        self.dispatcher.shutdown().await
    }
}

impl<B: std::fmt::Display> std::fmt::Debug for Agent<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("backend", &self.backend.to_string())
            .field("conversation", &self.conversation.id())
            .field("messages", &self.conversation.len())
            .field("tools", &self.tool_schemas.len())
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_parses_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: ToolCallPolicy,
        }
        let parsed: Wrapper = serde_json::from_str(r#"{"policy":"first_only"}"#).unwrap();
        assert_eq!(parsed.policy, ToolCallPolicy::FirstOnly);
        assert_eq!(ToolCallPolicy::default(), ToolCallPolicy::Sequential);
    }

    #[test]
    fn outcome_reply() {
        assert_eq!(TurnOutcome::Answered("22".into()).reply(), "22");
        let failed = TurnOutcome::Failed(Error::EmptyCompletion);
        assert_eq!(failed.reply(), APOLOGY);
        assert!(matches!(failed.into_result(), Err(Error::EmptyCompletion)));
    }
}
