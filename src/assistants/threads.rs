use serde::Deserialize;
use serde_json::json;

use crate::client::{AssistantClient, Deleted};
use crate::error::Error;

/// Remote conversation context holding ordered messages. Threads carry no
/// display name remotely; naming lives in the local
/// [`crate::history::ThreadHistory`].
#[derive(Debug, Deserialize, Clone)]
pub struct Thread {
    pub id: String,
    pub object: String,
    pub created_at: u32,
}

impl AssistantClient {
    pub async fn create_thread(&self) -> Result<Thread, Error> {
        self.post("threads", json!({})).await
    }

    /// Fails with [`Error::NotFound`] if the thread no longer exists
    /// remotely, regardless of any local record of it.
    pub async fn get_thread(&self, thread_id: &str) -> Result<Thread, Error> {
        self.get(format!("threads/{thread_id}")).await
    }

    pub async fn delete_thread(&self, thread_id: &str) -> Result<Deleted, Error> {
        self.delete(format!("threads/{thread_id}")).await
    }
}
