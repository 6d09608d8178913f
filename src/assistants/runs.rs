use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::client::AssistantClient;
use crate::error::Error;

/// An asynchronous job that makes an assistant append new messages to a
/// thread. Observed through [`AssistantClient::poll_run`] or the streaming
/// mode in [`crate::assistants::stream`].
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Run {
    pub id: String,
    pub object: String,
    pub created_at: u32,
    pub thread_id: String,
    pub assistant_id: String,
    pub status: RunStatus,
    /// The last error that occurred during this run.
    pub last_error: Option<LastError>,
    pub model: String,
    pub started_at: Option<u32>,
    pub completed_at: Option<u32>,
    pub cancelled_at: Option<u32>,
    pub failed_at: Option<u32>,
    pub expires_at: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Expired,
}

impl RunStatus {
    /// Whether the poller stops here. `Queued` and `InProgress` never escape
    /// the poll loop.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Queued | RunStatus::InProgress)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LastError {
    pub code: String,
    pub message: String,
}

#[derive(Serialize, Debug, Clone)]
pub(crate) struct CreateRunRequest {
    pub assistant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// Cadence and ceiling for [`AssistantClient::poll_run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Fixed wait between status fetches.
    pub interval: Duration,
    /// Wall-clock ceiling after which a still-running job resolves to
    /// [`Error::RunTimedOut`] instead of blocking forever.
    pub max_wait: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(10 * 60),
        }
    }
}

impl AssistantClient {
    /// Submits a run of `assistant_id` against `thread_id`.
    pub async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, Error> {
        self.post(
            format!("threads/{thread_id}/runs"),
            CreateRunRequest {
                assistant_id: assistant_id.to_string(),
                stream: None,
            },
        )
        .await
    }

    pub async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, Error> {
        self.get(format!("threads/{thread_id}/runs/{run_id}")).await
    }

    /// Re-fetches the run at the fixed interval until it reaches a terminal
    /// status. `Completed` resolves with the run; any other terminal status
    /// resolves [`Error::RunFailed`] carrying the full run so the caller sees
    /// what happened. The session blocks inside the wait; there is no
    /// mid-poll cancellation short of dropping the future.
    pub async fn poll_run(
        &self,
        thread_id: &str,
        run_id: &str,
        options: &PollOptions,
    ) -> Result<Run, Error> {
        poll(|| self.get_run(thread_id, run_id), options).await
    }
}

/// Poll loop over an arbitrary fetch, factored out so the protocol can be
/// exercised against scripted status sequences.
pub(crate) async fn poll<F, Fut>(mut fetch: F, options: &PollOptions) -> Result<Run, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Run, Error>>,
{
    let started = Instant::now();

    loop {
        let run = fetch().await?;
        if run.status.is_terminal() {
            return if run.status == RunStatus::Completed {
                Ok(run)
            } else {
                Err(Error::RunFailed { run: Box::new(run) })
            };
        }
        let waited = started.elapsed();
        if waited >= options.max_wait {
            return Err(Error::RunTimedOut {
                run_id: run.id,
                waited,
            });
        }
        tokio::time::sleep(options.interval).await;
    }
}
