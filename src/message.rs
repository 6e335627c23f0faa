//! Chat messages exchanged with the completion endpoint
//!
//! These types serialize directly into the `{role, content}` objects of the
//! chat-completions wire format.

use serde::{Deserialize, Serialize};

/// Author of a chat turn
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat turn
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message carrying instructions for the model
    ///
    /// # Example
    ///
    /// ```
    /// use cgen::message::{Message, Role};
    ///
    /// let message = Message::system("Write commit messages.");
    /// assert_eq!(message.role, Role::System);
    /// ```
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message, such as the diff to describe
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message, such as the model's reply
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered sequence of messages, always opened by a single system message
///
/// # Example
///
/// ```
/// use cgen::message::{Conversation, Message, Role};
///
/// let mut conversation = Conversation::new(Message::system("Write commit messages."));
/// conversation.push(Message::user("+added line"));
///
/// assert_eq!(conversation.messages()[0].role, Role::System);
/// assert_eq!(conversation.messages()[1].content, "+added line");
/// ```
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a conversation with its system message
    ///
    /// # Arguments
    ///
    /// * `system` - Instruction message placed first
    pub fn new(system: Message) -> Self {
        Self {
            messages: vec![system],
        }
    }

    /// Append a turn after the existing ones
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Messages in conversation order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}
