use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{AssistantClient, Deleted};
use crate::error::Error;

/// Remote configuration bundle (model + instructions + tools) that can be
/// invoked to produce responses. The id is server-assigned and immutable;
/// every other field is replaced wholesale by an edit.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Assistant {
    pub id: String,
    pub object: String,
    pub created_at: u32,
    /// The name of the assistant. The maximum length is 256 characters.
    pub name: Option<String>,
    /// The description of the assistant. The maximum length is 512 characters.
    pub description: Option<String>,
    /// ID of the model the assistant responds with.
    pub model: String,
    /// The system instructions that the assistant uses.
    pub instructions: Option<String>,
    pub tools: Vec<Tool>,
    /// Files attached to the assistant, by id. Files are not owned by the
    /// assistant and may be referenced from several places.
    #[serde(default)]
    pub file_ids: Vec<String>,
}

/// A capability the assistant may invoke. Function tools carry their
/// definition under a `function` key next to the tag, per the wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    CodeInterpreter,
    Retrieval,
    Function { function: Function },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Function {
    pub name: String,
    pub description: String,
    /// JSON-schema description of the function's parameters, kept as raw
    /// JSON: the schema is authored by the user and validated by the server.
    pub parameters: Value,
}

/// Payload for `create_assistant` and `edit_assistant`.
///
/// Edits resubmit the complete field set: fields left at their defaults
/// serialize as cleared (`null` / empty), never as "unchanged". Callers
/// editing an assistant must copy over every field they mean to keep.
#[derive(Serialize, Builder, Debug, Clone)]
#[builder(pattern = "owned")]
#[builder(name = "AssistantRequestBuilder")]
#[builder(setter(strip_option, into))]
pub struct AssistantRequest {
    /// ID of the model to use. Falls back to [`crate::DEFAULT_MODEL`] when
    /// not given.
    #[builder(default = "crate::DEFAULT_MODEL.to_string()")]
    pub model: String,
    pub name: String,
    #[builder(default)]
    pub description: Option<String>,
    #[builder(default)]
    pub instructions: Option<String>,
    #[builder(default)]
    pub tools: Vec<Tool>,
    #[builder(default)]
    pub file_ids: Vec<String>,
}

impl AssistantRequest {
    pub fn builder(name: impl Into<String>) -> AssistantRequestBuilder {
        AssistantRequestBuilder::create_empty().name(name)
    }
}

impl AssistantClient {
    pub async fn create_assistant(&self, request: AssistantRequest) -> Result<Assistant, Error> {
        self.post("assistants", request).await
    }

    /// Replaces every mutable field of the assistant with the given payload.
    pub async fn edit_assistant(
        &self,
        assistant_id: &str,
        request: AssistantRequest,
    ) -> Result<Assistant, Error> {
        self.post(format!("assistants/{assistant_id}"), request)
            .await
    }

    pub async fn get_assistant(&self, assistant_id: &str) -> Result<Assistant, Error> {
        self.get(format!("assistants/{assistant_id}")).await
    }

    /// Snapshot of all assistants in server-defined order.
    pub async fn list_assistants(&self) -> Result<Vec<Assistant>, Error> {
        self.list("assistants").await
    }

    /// Deleting an assistant that is already gone fails with
    /// [`Error::NotFound`]; callers wanting idempotence tolerate that error.
    pub async fn delete_assistant(&self, assistant_id: &str) -> Result<Deleted, Error> {
        self.delete(format!("assistants/{assistant_id}")).await
    }
}
