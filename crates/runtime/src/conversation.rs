//! Append-only conversation history.

use uuid::Uuid;

use crate::llm::{Message, Role, ToolCallRequest};
use crate::{Error, Result};

/// Ordered message history owned by one agent.
///
/// Messages can only be appended. A tool message must answer a request made
/// by the assistant message it follows, and each request is answered once.
#[derive(Debug, Clone)]
pub struct Conversation {
    id: Uuid,
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            messages: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Add a message to the end of the history.
    pub fn append(&mut self, message: Message) -> Result<()> {
        if message.role == Role::Tool {
            self.check_tool_message(&message)?;
        }
        self.messages.push(message);
        Ok(())
    }

    /// The full history, oldest first.
    pub fn history(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Requests in the latest assistant message that have no tool result yet.
    pub fn pending_calls(&self) -> Vec<ToolCallRequest> {
        let mut answered = Vec::new();
        for message in self.messages.iter().rev() {
            match message.role {
                Role::Tool => answered.extend(message.tool_call_id.as_deref()),
                Role::Assistant => {
                    return message
                        .tool_calls
                        .iter()
                        .filter(|call| !answered.contains(&call.id.as_str()))
                        .cloned()
                        .collect();
                }
                _ => break,
            }
        }
        Vec::new()
    }

    fn check_tool_message(&self, message: &Message) -> Result<()> {
        let id = message
            .tool_call_id
            .as_deref()
            .ok_or_else(|| Error::InvalidState("tool message without tool_call_id".into()))?;

        // Step back over the tool messages already answering the same request
        let mut answered = Vec::new();
        for earlier in self.messages.iter().rev() {
            match earlier.role {
                Role::Tool => answered.extend(earlier.tool_call_id.as_deref()),
                Role::Assistant => {
                    if !earlier.tool_calls.iter().any(|call| call.id == id) {
                        return Err(Error::InvalidState(format!(
                            "tool result `{id}` does not match a pending tool call"
                        )));
                    }
                    if answered.contains(&id) {
                        return Err(Error::InvalidState(format!(
                            "tool call `{id}` already has a result"
                        )));
                    }
                    return Ok(());
                }
                _ => break,
            }
        }

        Err(Error::InvalidState(format!(
            "tool result `{id}` does not follow an assistant tool call"
        )))
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ToolCallRequest;
    use serde_json::json;

    fn calls(ids: &[&str]) -> Message {
        Message::assistant_tool_calls(
            None,
            ids.iter()
                .map(|id| ToolCallRequest {
                    id: id.to_string(),
                    tool_name: "add".into(),
                    arguments: json!({}),
                })
                .collect(),
        )
    }

    #[test]
    fn keeps_insertion_order() {
        let mut conversation = Conversation::new();
        conversation.append(Message::system("sys")).unwrap();
        conversation.append(Message::user("hi")).unwrap();
        conversation.append(Message::assistant("hello")).unwrap();

        let roles: Vec<Role> = conversation.history().iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::System, Role::User, Role::Assistant]);
        assert_eq!(conversation.last().and_then(Message::text), Some("hello"));
    }

    #[test]
    fn tool_message_must_answer_preceding_request() {
        let mut conversation = Conversation::new();
        conversation.append(Message::user("hi")).unwrap();

        let err = conversation.append(Message::tool("call_1", "add", "2")).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));

        conversation.append(calls(&["call_1", "call_2"])).unwrap();
        assert!(conversation.append(Message::tool("call_9", "add", "2")).is_err());
        conversation.append(Message::tool("call_1", "add", "2")).unwrap();
        conversation.append(Message::tool("call_2", "add", "3")).unwrap();
        assert_eq!(conversation.len(), 4);
    }

    #[test]
    fn request_is_answered_once() {
        let mut conversation = Conversation::new();
        conversation.append(calls(&["call_1"])).unwrap();
        conversation.append(Message::tool("call_1", "add", "2")).unwrap();
        let err = conversation.append(Message::tool("call_1", "add", "2")).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn only_latest_assistant_counts() {
        let mut conversation = Conversation::new();
        conversation.append(calls(&["call_1"])).unwrap();
        conversation.append(Message::tool("call_1", "add", "2")).unwrap();
        conversation.append(Message::assistant("done")).unwrap();
        assert!(conversation.append(Message::tool("call_1", "add", "2")).is_err());
    }

    #[test]
    fn pending_calls_are_the_unanswered_requests() {
        let mut conversation = Conversation::new();
        assert!(conversation.pending_calls().is_empty());

        conversation.append(calls(&["call_1", "call_2"])).unwrap();
        conversation.append(Message::tool("call_1", "add", "2")).unwrap();
        let pending: Vec<String> = conversation.pending_calls().into_iter().map(|c| c.id).collect();
        assert_eq!(pending, ["call_2"]);

        conversation.append(Message::tool("call_2", "add", "3")).unwrap();
        assert!(conversation.pending_calls().is_empty());

        conversation.append(Message::user("thanks")).unwrap();
        assert!(conversation.pending_calls().is_empty());
    }

    #[test]
    fn failed_appends_leave_history_untouched() {
        let mut conversation = Conversation::new();
        conversation.append(Message::user("hi")).unwrap();
        let _ = conversation.append(Message::tool("x", "add", "1"));
        assert_eq!(conversation.len(), 1);
    }
}
