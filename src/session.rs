//! Session context threaded through composed operations: the selected
//! assistant and open thread live here as explicit values rather than on a
//! long-lived mutable wrapper. Each operation returns a `Result`; what screen
//! to show next is the shell's decision, never made here.

use tokio::sync::mpsc::Receiver;

use crate::assistants::messages::{Message, Role};
use crate::assistants::runs::PollOptions;
use crate::assistants::stream::RunEvent;
use crate::assistants::threads::Thread;
use crate::assistants::Assistant;
use crate::client::AssistantClient;
use crate::error::Error;
use crate::history::{ThreadHistory, ThreadRecord};

pub struct Session {
    client: AssistantClient,
    username: String,
    assistant: Option<Assistant>,
    thread: Option<Thread>,
    thread_name: Option<String>,
}

impl Session {
    pub fn new(client: AssistantClient, username: impl Into<String>) -> Self {
        Self {
            client,
            username: username.into(),
            assistant: None,
            thread: None,
            thread_name: None,
        }
    }

    pub fn client(&self) -> &AssistantClient {
        &self.client
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn assistant(&self) -> Option<&Assistant> {
        self.assistant.as_ref()
    }

    pub fn thread(&self) -> Option<&Thread> {
        self.thread.as_ref()
    }

    pub fn thread_name(&self) -> Option<&str> {
        self.thread_name.as_deref()
    }

    pub fn select_assistant(&mut self, assistant: Assistant) {
        self.assistant = Some(assistant);
        self.close_thread();
    }

    pub fn clear_assistant(&mut self) {
        self.assistant = None;
        self.close_thread();
    }

    /// Drops the open thread from the session without touching the remote
    /// thread or its local record.
    pub fn close_thread(&mut self) {
        self.thread = None;
        self.thread_name = None;
    }

    fn require_assistant(&self) -> Result<&Assistant, Error> {
        self.assistant.as_ref().ok_or(Error::NoAssistantSelected)
    }

    fn require_thread(&self) -> Result<&Thread, Error> {
        self.thread.as_ref().ok_or(Error::NoThreadSelected)
    }

    /// Creates a remote thread and records it locally under `name`, owned by
    /// the selected assistant and this session's user.
    pub async fn open_thread(&mut self, history: &ThreadHistory, name: &str) -> Result<(), Error> {
        let assistant_id = self.require_assistant()?.id.clone();
        let thread = self.client.create_thread().await?;
        history
            .append(ThreadRecord {
                assistant: assistant_id,
                thread: thread.id.clone(),
                thread_name: name.to_string(),
                user: self.username.clone(),
            })
            .await?;
        self.thread = Some(thread);
        self.thread_name = Some(name.to_string());
        Ok(())
    }

    /// Re-opens a thread previously recorded in the history. Fails with
    /// [`Error::RecordNotFound`] for threads this client never knew, and with
    /// [`Error::NotFound`] when the record outlived the remote thread.
    pub async fn resume_thread(
        &mut self,
        history: &ThreadHistory,
        thread_id: &str,
    ) -> Result<(), Error> {
        self.require_assistant()?;
        let record = history
            .find(thread_id)
            .await?
            .ok_or_else(|| Error::RecordNotFound {
                thread_id: thread_id.to_string(),
            })?;
        let thread = self.client.get_thread(thread_id).await?;
        self.thread = Some(thread);
        self.thread_name = Some(record.thread_name);
        Ok(())
    }

    /// Renames the open thread's local record. Threads carry no name
    /// remotely, so nothing leaves the machine.
    pub async fn rename_thread(
        &mut self,
        history: &ThreadHistory,
        new_name: &str,
    ) -> Result<(), Error> {
        let thread_id = self.require_thread()?.id.clone();
        history.rename(&thread_id, new_name).await?;
        self.thread_name = Some(new_name.to_string());
        Ok(())
    }

    /// Deletes the open thread remotely and drops its local record, paired.
    /// A thread already gone remotely still gets its record removed.
    pub async fn delete_thread(&mut self, history: &ThreadHistory) -> Result<(), Error> {
        let thread_id = self.require_thread()?.id.clone();
        match self.client.delete_thread(&thread_id).await {
            Ok(_) | Err(Error::NotFound(_)) => {}
            Err(other) => return Err(other),
        }
        history.remove(&thread_id).await?;
        self.close_thread();
        Ok(())
    }

    /// Appends a user message to the open thread.
    pub async fn post_message(
        &self,
        content: impl Into<String>,
        file_ids: Vec<String>,
    ) -> Result<Message, Error> {
        let thread_id = &self.require_thread()?.id;
        self.client
            .add_message(thread_id, Role::User, content, file_ids)
            .await
    }

    /// The open thread's messages, oldest first.
    pub async fn message_history(&self) -> Result<Vec<Message>, Error> {
        let thread_id = &self.require_thread()?.id;
        self.client.list_messages(thread_id).await
    }

    /// Submits a run and blocks polling it to completion, then returns the
    /// thread's messages (ascending) including the assistant's response.
    /// A terminal non-completed run surfaces as [`Error::RunFailed`]; a run
    /// stuck past the ceiling as [`Error::RunTimedOut`].
    pub async fn send(&self, options: &PollOptions) -> Result<Vec<Message>, Error> {
        let assistant_id = &self.require_assistant()?.id;
        let thread_id = &self.require_thread()?.id;
        let run = self.client.create_run(thread_id, assistant_id).await?;
        self.client.poll_run(thread_id, &run.id, options).await?;
        self.client.list_messages(thread_id).await
    }

    /// Streaming equivalent of [`Session::send`]: the returned receiver
    /// yields incremental [`RunEvent`]s until the server signals done. A
    /// stream failure arrives as a final `Err` item before the channel
    /// closes.
    pub async fn send_streaming(&self) -> Result<Receiver<Result<RunEvent, Error>>, Error> {
        let assistant_id = &self.require_assistant()?.id;
        let thread_id = &self.require_thread()?.id;
        self.client
            .create_run_stream(thread_id, assistant_id)
            .await
    }
}
