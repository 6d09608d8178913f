//! End-to-end exercise of the local bookkeeping layer: the credential file
//! and the thread history, driven the way a shell session would drive them.

use assistant_gpt::config::{Config, ConfigStore};
use assistant_gpt::history::{ThreadHistory, ThreadRecord};
use assistant_gpt::Error;
use tempfile::tempdir;

fn record(assistant: &str, thread: &str, name: &str, user: &str) -> ThreadRecord {
    ThreadRecord {
        assistant: assistant.to_string(),
        thread: thread.to_string(),
        thread_name: name.to_string(),
        user: user.to_string(),
    }
}

#[test]
fn first_launch_saves_credentials_then_later_launches_reuse_them() {
    let dir = tempdir().unwrap();
    let store = ConfigStore::new(dir.path().join("key.json"));

    // Nothing saved yet: the shell prompts for a key and name.
    assert!(store.read().unwrap().is_none());

    let config = Config {
        api_key: "sk-test-abc".to_string(),
        name: "Ada".to_string(),
    };
    store.save(&config).unwrap();

    // Next launch reads the identical record back.
    let reread = store.read().unwrap().unwrap();
    assert_eq!(reread, config);
    assert_eq!(reread.credentials().api_key(), "sk-test-abc");

    // Validation failure or an explicit reset deletes the credential.
    store.reset().unwrap();
    assert!(store.read().unwrap().is_none());
}

#[tokio::test]
async fn thread_bookkeeping_across_a_session() {
    let dir = tempdir().unwrap();
    let history = ThreadHistory::new(dir.path().join("threads.json"));

    // Two assistants, three chats.
    history
        .append(record("asst_tutor", "thread_1", "Algebra", "Ada"))
        .await
        .unwrap();
    history
        .append(record("asst_tutor", "thread_2", "Geometry", "Ada"))
        .await
        .unwrap();
    history
        .append(record("asst_coder", "thread_3", "Scripts", "Ada"))
        .await
        .unwrap();

    // The thread dashboard lists only the selected assistant's chats.
    let tutor_threads = history.for_assistant("asst_tutor").await.unwrap();
    assert_eq!(tutor_threads.len(), 2);
    assert!(tutor_threads.iter().all(|r| r.assistant == "asst_tutor"));

    // Renaming one chat leaves the others byte-for-byte intact.
    history.rename("thread_2", "Geometry II").await.unwrap();
    let records = history.read().await.unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0], record("asst_tutor", "thread_1", "Algebra", "Ada"));
    assert_eq!(
        records[1],
        record("asst_tutor", "thread_2", "Geometry II", "Ada")
    );
    assert_eq!(records[2], record("asst_coder", "thread_3", "Scripts", "Ada"));

    // Deleting a chat drops exactly its record.
    history.remove("thread_1").await.unwrap();
    assert!(history.find("thread_1").await.unwrap().is_none());
    assert_eq!(history.read().await.unwrap().len(), 2);

    // Operating on an id that was never recorded fails explicitly and
    // changes nothing.
    assert!(matches!(
        history.rename("thread_1", "Ghost").await,
        Err(Error::RecordNotFound { .. })
    ));
    assert!(matches!(
        history.remove("thread_1").await,
        Err(Error::RecordNotFound { .. })
    ));
    assert_eq!(history.read().await.unwrap().len(), 2);
}
