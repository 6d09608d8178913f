//! The model listing exists here so the credential validator has a trivial
//! read-only resource to authenticate against; model ids are otherwise plain
//! strings throughout the crate.

use serde::Deserialize;

use crate::client::AssistantClient;
use crate::error::Error;

#[derive(Debug, Clone, Deserialize)]
pub struct Model {
    pub id: String,
    pub created: Option<u32>,
    pub owned_by: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ModelList {
    data: Vec<Model>,
}

impl AssistantClient {
    pub async fn list_models(&self) -> Result<Vec<Model>, Error> {
        let list: ModelList = self.get("models").await?;
        Ok(list.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_list_deserializes() {
        let list: ModelList = serde_json::from_str(
            r#"{"object":"list","data":[{"id":"gpt-4-1106-preview","object":"model","created":1698957206,"owned_by":"system"}]}"#,
        )
        .unwrap();
        assert_eq!(list.data.len(), 1);
        assert_eq!(list.data[0].id, "gpt-4-1106-preview");
        assert_eq!(list.data[0].owned_by, "system");
    }
}
