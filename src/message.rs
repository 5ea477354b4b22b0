use serde::{Deserialize, Serialize};

/// A single conversation turn, containing a role and text content.
///
/// Messages represent the chat history threaded through the pipeline: the
/// caller supplies prior turns, the response generator reads the most recent
/// ones, and every completed run appends one user turn and one assistant turn.
///
/// # Examples
///
/// ```
/// use corrag::message::Message;
///
/// let user_msg = Message::user("What is coupling?");
/// let assistant_msg = Message::assistant("Coupling measures interdependence.");
///
/// assert!(user_msg.has_role(Message::USER));
/// assert!(!user_msg.has_role(Message::ASSISTANT));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender (e.g., "user", "assistant", "system").
    ///
    /// Use the constants on [`Message`] for standardized values.
    pub role: String,
    /// The text content of the message.
    pub content: String,
}

impl Message {
    /// User input message role.
    pub const USER: &'static str = "user";
    /// AI assistant response message role.
    pub const ASSISTANT: &'static str = "assistant";
    /// System prompt or instruction message role.
    pub const SYSTEM: &'static str = "system";

    /// Creates a new message with the specified role and content.
    #[must_use]
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    /// Creates a user message with the specified content.
    #[must_use]
    pub fn user(content: &str) -> Self {
        Self::new(Self::USER, content)
    }

    /// Creates an assistant message with the specified content.
    #[must_use]
    pub fn assistant(content: &str) -> Self {
        Self::new(Self::ASSISTANT, content)
    }

    /// Creates a system message with the specified content.
    #[must_use]
    pub fn system(content: &str) -> Self {
        Self::new(Self::SYSTEM, content)
    }

    /// Returns true if this message has the specified role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}
