use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::Body;
use serde::{Deserialize, Serialize};

use crate::client::{AssistantClient, Deleted};
use crate::error::Error;

/// Remote binary blob. Files are referenced by id from assistants and
/// messages and are not owned by either; metadata and content are fetched by
/// separate operations.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct File {
    pub id: String,
    pub object: String,
    pub created_at: u32,
    pub bytes: u64,
    pub filename: String,
    pub purpose: FilePurpose,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FilePurpose {
    Assistants,
    AssistantsOutput,
    FineTune,
    Vision,
}

/// Attachment of a file to an assistant; the underlying [`File`] survives
/// detachment.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AssistantFile {
    pub id: String,
    pub object: String,
    pub created_at: u32,
    pub assistant_id: String,
}

#[derive(Serialize, Debug, Clone)]
struct AttachFileRequest {
    file_id: String,
}

impl AssistantClient {
    pub async fn upload_file<B: Into<Body>>(
        &self,
        filename: &str,
        mime_type: &str,
        bytes: B,
        purpose: FilePurpose,
    ) -> Result<File, Error> {
        let file_part = Part::stream(bytes)
            .file_name(filename.to_string())
            .mime_str(mime_type)?;
        let form = Form::new()
            .part("file", file_part)
            .text("purpose", purpose.to_string());
        self.post_multipart("files", form).await
    }

    /// Uploads a file from disk, naming it after the path's final component.
    pub async fn upload_file_from_path(
        &self,
        path: &Path,
        purpose: FilePurpose,
    ) -> Result<File, Error> {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::io(
                    path,
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
                )
            })?;
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|source| Error::io(path, source))?;
        self.upload_file(
            &filename,
            "application/octet-stream",
            Body::from(file),
            purpose,
        )
        .await
    }

    /// File metadata; the content comes from
    /// [`AssistantClient::get_file_content`].
    pub async fn get_file(&self, file_id: &str) -> Result<File, Error> {
        self.get(format!("files/{file_id}")).await
    }

    /// The raw bytes of the file, e.g. an image produced by the
    /// code-interpreter tool.
    pub async fn get_file_content(&self, file_id: &str) -> Result<Vec<u8>, Error> {
        self.get_bytes(format!("files/{file_id}/content")).await
    }

    pub async fn delete_file(&self, file_id: &str) -> Result<Deleted, Error> {
        self.delete(format!("files/{file_id}")).await
    }

    pub async fn list_assistant_files(
        &self,
        assistant_id: &str,
    ) -> Result<Vec<AssistantFile>, Error> {
        self.list(format!("assistants/{assistant_id}/files")).await
    }

    pub async fn attach_assistant_file(
        &self,
        assistant_id: &str,
        file_id: &str,
    ) -> Result<AssistantFile, Error> {
        self.post(
            format!("assistants/{assistant_id}/files"),
            AttachFileRequest {
                file_id: file_id.to_string(),
            },
        )
        .await
    }

    /// Detaches the file from the assistant; the file itself remains until
    /// [`AssistantClient::delete_file`].
    pub async fn remove_assistant_file(
        &self,
        assistant_id: &str,
        file_id: &str,
    ) -> Result<Deleted, Error> {
        self.delete(format!("assistants/{assistant_id}/files/{file_id}"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purpose_wire_names_match_display() {
        assert_eq!(FilePurpose::Assistants.to_string(), "assistants");
        assert_eq!(
            serde_json::to_string(&FilePurpose::AssistantsOutput).unwrap(),
            "\"assistants_output\""
        );
        assert_eq!(
            serde_json::from_str::<FilePurpose>("\"assistants\"").unwrap(),
            FilePurpose::Assistants
        );
    }

    #[test]
    fn file_metadata_deserializes() {
        let file: File = serde_json::from_str(
            r#"{"id":"file-abc123","object":"file","created_at":1699061776,"bytes":120000,"filename":"notes.pdf","purpose":"assistants"}"#,
        )
        .unwrap();
        assert_eq!(file.filename, "notes.pdf");
        assert_eq!(file.purpose, FilePurpose::Assistants);
    }
}
