//! # Message Envelope
//!
//! The structured message carried inside every frame.
//!
//! ```text
//! Message
//! ├── header
//! │   └── command: String   (selects the handler)
//! └── body: bytes           (opaque until the handler decodes it)
//! ```

use serde::{Deserialize, Serialize};

/// Routing header of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MessageHeader {
    /// Command tag, e.g. `"AccountState"`.
    pub command: String,
}

/// A decoded wire message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Message {
    /// Routing header.
    pub header: MessageHeader,
    /// Encoded record, interpreted by the handler for `header.command`.
    pub body: Vec<u8>,
}

impl Message {
    /// Build a message for `command` with the given body.
    pub fn new(command: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            header: MessageHeader {
                command: command.into(),
            },
            body,
        }
    }

    /// The command tag.
    pub fn command(&self) -> &str {
        &self.header.command
    }

    /// Whether the body is empty.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_new() {
        let msg = Message::new("Receipt", vec![1, 2, 3]);
        assert_eq!(msg.command(), "Receipt");
        assert_eq!(msg.body, vec![1, 2, 3]);
        assert!(!msg.is_empty());
    }

    #[test]
    fn test_message_without_body() {
        let msg = Message::new("AccountState", Vec::new());
        assert!(msg.is_empty());
    }
}
