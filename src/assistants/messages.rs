use serde::{Deserialize, Serialize};

use crate::client::AssistantClient;
use crate::error::Error;

/// A message within a thread. Messages are append-only and immutable once
/// created; ordering is server-assigned chronological.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Message {
    pub id: String,
    pub object: String,
    pub created_at: u32,
    pub thread_id: String,
    /// The entity that produced the message.
    pub role: Role,
    /// Ordered content parts.
    pub content: Vec<Content>,
    /// The assistant that produced the message, if any.
    pub assistant_id: Option<String>,
    /// The run that appended this message; null for messages added manually.
    pub run_id: Option<String>,
    #[serde(default)]
    pub file_ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One part of a message body. Render-time handling must be exhaustive; an
/// image part carries only a file reference, its bytes come from
/// [`AssistantClient::get_file_content`]. Each variant's payload sits under
/// a key matching the tag, per the wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum Content {
    Text { text: Text },
    ImageFile { image_file: ImageFile },
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Text {
    pub value: String,
    #[serde(default)]
    pub annotations: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImageFile {
    pub file_id: String,
}

#[derive(Serialize, Debug, Clone)]
struct CreateMessageRequest {
    role: Role,
    content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    file_ids: Vec<String>,
}

/// Clones `messages` in reverse, newest first, for history display. The
/// server hands them out oldest first.
pub fn newest_first(messages: &[Message]) -> Vec<Message> {
    let mut reversed = messages.to_vec();
    reversed.reverse();
    reversed
}

impl AssistantClient {
    pub async fn add_message(
        &self,
        thread_id: &str,
        role: Role,
        content: impl Into<String>,
        file_ids: Vec<String>,
    ) -> Result<Message, Error> {
        self.post(
            format!("threads/{thread_id}/messages"),
            CreateMessageRequest {
                role,
                content: content.into(),
                file_ids,
            },
        )
        .await
    }

    /// All messages of a thread in ascending server chronological order.
    pub async fn list_messages(&self, thread_id: &str) -> Result<Vec<Message>, Error> {
        self.list(format!("threads/{thread_id}/messages")).await
    }
}
