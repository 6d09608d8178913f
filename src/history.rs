//! Local bookkeeping for threads: a JSON array of records mapping each remote
//! thread to a display name and owner. A record exists here iff the thread
//! was created or resumed through this client; the remote thread can outlive
//! or predecease it. Rename and removal rewrite the whole collection
//! (read-modify-write); there is no indexed update, and interleaved writers
//! from a second process can lose updates.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

use serde::{Deserialize, Serialize};

use crate::error::Error;

const HISTORY_FILE_NAME: &str = ".assistant-gpt-threads.json";

/// One thread known to this client. Field names are the wire format of the
/// history file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ThreadRecord {
    /// Owning assistant id.
    pub assistant: String,
    /// Remote thread id.
    pub thread: String,
    /// Display name, local-only.
    pub thread_name: String,
    /// Identity that created the thread.
    pub user: String,
}

#[derive(Debug, Clone)]
pub struct ThreadHistory {
    path: PathBuf,
}

impl ThreadHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the per-user default location, `None` when no home directory
    /// can be determined.
    pub fn from_home() -> Option<Self> {
        Some(Self::new(dirs::home_dir()?.join(HISTORY_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The full record set; an absent file is an empty history.
    pub async fn read(&self) -> Result<Vec<ThreadRecord>, Error> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(Error::io(&self.path, source)),
        };
        serde_json::from_str(&contents).map_err(|source| Error::corrupt(&self.path, source))
    }

    /// Records for one assistant, in insertion order.
    pub async fn for_assistant(&self, assistant_id: &str) -> Result<Vec<ThreadRecord>, Error> {
        Ok(self
            .read()
            .await?
            .into_iter()
            .filter(|record| record.assistant == assistant_id)
            .collect())
    }

    pub async fn find(&self, thread_id: &str) -> Result<Option<ThreadRecord>, Error> {
        Ok(self
            .read()
            .await?
            .into_iter()
            .find(|record| record.thread == thread_id))
    }

    /// Appends a record. Creation never rewrites existing records in place.
    pub async fn append(&self, record: ThreadRecord) -> Result<(), Error> {
        let mut records = self.read().await?;
        records.push(record);
        self.write(&records).await
    }

    /// Renames the record with the given thread id, leaving every other
    /// record untouched. Fails with [`Error::RecordNotFound`] when no record
    /// matches; the collection is left unchanged.
    pub async fn rename(&self, thread_id: &str, new_name: &str) -> Result<(), Error> {
        let mut records = self.read().await?;
        let record = records
            .iter_mut()
            .find(|record| record.thread == thread_id)
            .ok_or_else(|| Error::RecordNotFound {
                thread_id: thread_id.to_string(),
            })?;
        record.thread_name = new_name.to_string();
        self.write(&records).await
    }

    /// Removes the record with the given thread id. Fails with
    /// [`Error::RecordNotFound`] when no record matches. Removing the local
    /// record says nothing about the remote thread.
    pub async fn remove(&self, thread_id: &str) -> Result<(), Error> {
        let mut records = self.read().await?;
        let before = records.len();
        records.retain(|record| record.thread != thread_id);
        if records.len() == before {
            return Err(Error::RecordNotFound {
                thread_id: thread_id.to_string(),
            });
        }
        self.write(&records).await
    }

    async fn write(&self, records: &[ThreadRecord]) -> Result<(), Error> {
        let contents =
            serde_json::to_string(records).map_err(|source| Error::corrupt(&self.path, source))?;
        fs::write(&self.path, contents)
            .await
            .map_err(|source| Error::io(&self.path, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(thread: &str, name: &str) -> ThreadRecord {
        ThreadRecord {
            assistant: "asst_abc123".to_string(),
            thread: thread.to_string(),
            thread_name: name.to_string(),
            user: "Ada".to_string(),
        }
    }

    fn store() -> (tempfile::TempDir, ThreadHistory) {
        let dir = tempdir().unwrap();
        let history = ThreadHistory::new(dir.path().join(HISTORY_FILE_NAME));
        (dir, history)
    }

    #[tokio::test]
    async fn absent_file_is_an_empty_history() {
        let (_dir, history) = store();
        assert!(history.read().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rename_touches_only_the_matching_record() {
        let (_dir, history) = store();
        for i in 0..5 {
            history
                .append(record(&format!("thread_{i}"), &format!("Chat {i}")))
                .await
                .unwrap();
        }

        history.rename("thread_2", "Renamed").await.unwrap();

        let records = history.read().await.unwrap();
        assert_eq!(records.len(), 5);
        for (i, found) in records.iter().enumerate() {
            if i == 2 {
                assert_eq!(found.thread_name, "Renamed");
            } else {
                assert_eq!(*found, record(&format!("thread_{i}"), &format!("Chat {i}")));
            }
        }
    }

    #[tokio::test]
    async fn rename_of_absent_id_fails_and_changes_nothing() {
        let (_dir, history) = store();
        history.append(record("thread_0", "Chat 0")).await.unwrap();

        let error = history.rename("thread_missing", "X").await.unwrap_err();
        assert!(
            matches!(error, Error::RecordNotFound { ref thread_id } if thread_id == "thread_missing")
        );
        assert_eq!(
            history.read().await.unwrap(),
            vec![record("thread_0", "Chat 0")]
        );
    }

    #[tokio::test]
    async fn remove_drops_exactly_one_record() {
        let (_dir, history) = store();
        history.append(record("thread_0", "Chat 0")).await.unwrap();
        history.append(record("thread_1", "Chat 1")).await.unwrap();

        history.remove("thread_0").await.unwrap();
        assert_eq!(
            history.read().await.unwrap(),
            vec![record("thread_1", "Chat 1")]
        );
    }

    #[tokio::test]
    async fn remove_of_absent_id_fails_explicitly() {
        let (_dir, history) = store();
        history.append(record("thread_0", "Chat 0")).await.unwrap();

        assert!(matches!(
            history.remove("thread_missing").await,
            Err(Error::RecordNotFound { .. })
        ));
        assert_eq!(history.read().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn for_assistant_filters_by_owner() {
        let (_dir, history) = store();
        history.append(record("thread_0", "Chat 0")).await.unwrap();
        let mut other = record("thread_1", "Chat 1");
        other.assistant = "asst_other".to_string();
        history.append(other).await.unwrap();

        let records = history.for_assistant("asst_abc123").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].thread, "thread_0");
    }

    #[tokio::test]
    async fn corrupt_history_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(HISTORY_FILE_NAME);
        std::fs::write(&path, "[{\"assistant\":").unwrap();

        let history = ThreadHistory::new(&path);
        assert!(matches!(
            history.read().await,
            Err(Error::LocalStoreCorrupt { .. })
        ));
    }

    #[test]
    fn wire_field_names_match_the_file_format() {
        let value = serde_json::to_value(record("thread_0", "Chat 0")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "assistant": "asst_abc123",
                "thread": "thread_0",
                "thread_name": "Chat 0",
                "user": "Ada",
            })
        );
    }
}
