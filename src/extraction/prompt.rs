//! Structured prompt: a conversation paired with an output schema

use super::schema::SchemaDescriptor;
use crate::providers::Message;

/// Conversation transcript plus the schema the model must answer in
///
/// The system message is synthesized from the schema on every
/// [`render`](Self::render) and is never part of the stored transcript.
///
/// # Examples
///
/// ```
/// use playsift::extraction::{SchemaDescriptor, StructuredPrompt};
/// use playsift::providers::{Message, Role};
///
/// let schema = SchemaDescriptor::new().field("answer", "str");
/// let prompt = StructuredPrompt::new(schema).with_message(Message::user("What is 2 + 2?"));
///
/// let rendered = prompt.render();
/// assert_eq!(rendered.len(), 2);
/// assert_eq!(rendered[0].role, Role::System);
/// assert_eq!(prompt.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct StructuredPrompt {
    schema: SchemaDescriptor,
    messages: Vec<Message>,
}

impl StructuredPrompt {
    /// Create a prompt with an empty conversation
    pub fn new(schema: SchemaDescriptor) -> Self {
        Self {
            schema,
            messages: Vec::new(),
        }
    }

    /// Builder form of [`append`](Self::append)
    pub fn with_message(mut self, message: Message) -> Self {
        self.append(message);
        self
    }

    /// The schema this prompt asks for
    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    /// The stored conversation, without the system message
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of stored messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the conversation is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Add a message to the end of the conversation
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Replace the most recent message, returning the one removed
    ///
    /// On an empty conversation this simply appends.
    pub fn replace_last(&mut self, message: Message) -> Option<Message> {
        let removed = self.messages.pop();
        self.messages.push(message);
        removed
    }

    /// The system instruction derived from the schema
    pub fn system_message(&self) -> Message {
        Message::system(format!(
            "Do not output any markdown. Do not make any comments. Do not use escape characters.\n\n\
             Output nothing but a JSON in the following format: {}",
            self.schema.to_json()
        ))
    }

    /// Message sequence to send: system instruction followed by the conversation
    pub fn render(&self) -> Vec<Message> {
        let mut rendered = Vec::with_capacity(self.messages.len() + 1);
        rendered.push(self.system_message());
        rendered.extend(self.messages.iter().cloned());
        rendered
    }
}
