//! Streaming mode of the run-completion protocol: instead of polling, the
//! caller submits the run with `stream: true` and receives server-sent
//! events incrementally until the server signals completion. Push-based
//! equivalent of the poll loop, with partial results instead of silence.

use futures_util::{Stream, StreamExt};
use reqwest::Method;
use reqwest_eventsource::{Event, EventSource, RequestBuilderExt};
use serde::Deserialize;
use tokio::sync::mpsc::{channel, Receiver, Sender};

use crate::assistants::runs::{CreateRunRequest, RunStatus};
use crate::client::AssistantClient;
use crate::error::Error;

/// Incremental events of a streamed run. Delta events append to the current
/// response buffer; `Done` is always the last event delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// The assistant began a new response message.
    MessageCreated,
    /// A text fragment to append to the current response.
    MessageDelta(String),
    /// The assistant invoked a tool; `kind` names it (e.g. `code_interpreter`).
    ToolCallCreated(String),
    /// Partial code-interpreter input and/or output-log fragments.
    ToolCallDelta {
        input: Option<String>,
        logs: Vec<String>,
    },
    /// The run moved to a new status.
    StatusChanged(RunStatus),
    /// The server signalled the end of the stream.
    Done,
}

impl AssistantClient {
    /// Submits a run and streams its events. The receiver yields until the
    /// server signals `done` or the stream fails; a transport failure arrives
    /// as a final `Err` item, after which the channel closes. Like the
    /// polling mode this blocks the session until completion, but with
    /// incremental visibility.
    pub async fn create_run_stream(
        &self,
        thread_id: &str,
        assistant_id: &str,
    ) -> Result<Receiver<Result<RunEvent, Error>>, Error> {
        let request = self
            .request_builder(Method::POST, format!("threads/{thread_id}/runs"))
            .json(&CreateRunRequest {
                assistant_id: assistant_id.to_string(),
                stream: Some(true),
            });
        let source = request.eventsource()?;
        let (tx, rx) = channel::<Result<RunEvent, Error>>(32);
        tokio::spawn(async move {
            let mut source = source;
            forward_run_events(&mut source, tx).await;
            source.close();
        });
        Ok(rx)
    }
}

/// Drains `source` into the channel. A stream failure is forwarded as an
/// `Err` item so the consumer can tell a dead connection from a finished
/// run, then the forwarder stops; `StreamEnded` is the server closing the
/// connection after `done` and closes the channel quietly.
async fn forward_run_events<S>(source: &mut S, tx: Sender<Result<RunEvent, Error>>)
where
    S: Stream<Item = Result<Event, reqwest_eventsource::Error>> + Unpin,
{
    while let Some(event) = source.next().await {
        let message = match event {
            Ok(Event::Message(message)) => message,
            Ok(Event::Open) => continue,
            Err(reqwest_eventsource::Error::StreamEnded) => break,
            Err(error) => {
                let _ = tx.send(Err(Error::Stream(error))).await;
                break;
            }
        };
        if message.event == "done" || message.data == "[DONE]" {
            let _ = tx.send(Ok(RunEvent::Done)).await;
            break;
        }
        match parse_event(&message.event, &message.data) {
            Ok(events) => {
                for parsed in events {
                    if tx.send(Ok(parsed)).await.is_err() {
                        return;
                    }
                }
            }
            Err(error) => {
                log::debug!("skipping malformed '{}' event: {error}", message.event);
            }
        }
    }
}

#[derive(Deserialize)]
struct MessageDeltaPayload {
    delta: MessageDeltaBody,
}

#[derive(Deserialize)]
struct MessageDeltaBody {
    #[serde(default)]
    content: Vec<ContentDelta>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentDelta {
    Text {
        text: TextDelta,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct TextDelta {
    value: Option<String>,
}

#[derive(Deserialize)]
struct RunStepPayload {
    step_details: StepDetails,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StepDetails {
    ToolCalls {
        #[serde(default)]
        tool_calls: Vec<ToolCallKind>,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct ToolCallKind {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct RunStepDeltaPayload {
    delta: RunStepDeltaBody,
}

#[derive(Deserialize)]
struct RunStepDeltaBody {
    step_details: StepDetailsDelta,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StepDetailsDelta {
    ToolCalls {
        #[serde(default)]
        tool_calls: Vec<ToolCallDeltaPayload>,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ToolCallDeltaPayload {
    CodeInterpreter {
        code_interpreter: CodeInterpreterDelta,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct CodeInterpreterDelta {
    input: Option<String>,
    #[serde(default)]
    outputs: Vec<CodeInterpreterOutput>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum CodeInterpreterOutput {
    Logs {
        logs: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct RunStatusPayload {
    status: RunStatus,
}

/// Maps one named SSE payload onto [`RunEvent`]s. Unknown event kinds yield
/// nothing rather than failing the stream.
fn parse_event(event: &str, data: &str) -> Result<Vec<RunEvent>, serde_json::Error> {
    Ok(match event {
        "thread.message.created" => vec![RunEvent::MessageCreated],
        "thread.message.delta" => {
            let payload: MessageDeltaPayload = serde_json::from_str(data)?;
            let mut text = String::new();
            for part in payload.delta.content {
                if let ContentDelta::Text { text: delta } = part {
                    if let Some(value) = delta.value {
                        text.push_str(&value);
                    }
                }
            }
            if text.is_empty() {
                vec![]
            } else {
                vec![RunEvent::MessageDelta(text)]
            }
        }
        "thread.run.step.created" => {
            let payload: RunStepPayload = serde_json::from_str(data)?;
            match payload.step_details {
                StepDetails::ToolCalls { tool_calls } => tool_calls
                    .into_iter()
                    .map(|call| RunEvent::ToolCallCreated(call.kind))
                    .collect(),
                StepDetails::Other => vec![],
            }
        }
        "thread.run.step.delta" => {
            let payload: RunStepDeltaPayload = serde_json::from_str(data)?;
            match payload.delta.step_details {
                StepDetailsDelta::ToolCalls { tool_calls } => tool_calls
                    .into_iter()
                    .filter_map(|call| match call {
                        ToolCallDeltaPayload::CodeInterpreter { code_interpreter } => {
                            let logs = code_interpreter
                                .outputs
                                .into_iter()
                                .filter_map(|output| match output {
                                    CodeInterpreterOutput::Logs { logs } => Some(logs),
                                    CodeInterpreterOutput::Other => None,
                                })
                                .collect();
                            Some(RunEvent::ToolCallDelta {
                                input: code_interpreter.input,
                                logs,
                            })
                        }
                        ToolCallDeltaPayload::Other => None,
                    })
                    .collect(),
                StepDetailsDelta::Other => vec![],
            }
        }
        "thread.run.created"
        | "thread.run.queued"
        | "thread.run.in_progress"
        | "thread.run.requires_action"
        | "thread.run.completed"
        | "thread.run.failed"
        | "thread.run.cancelled"
        | "thread.run.expired" => {
            let payload: RunStatusPayload = serde_json::from_str(data)?;
            vec![RunEvent::StatusChanged(payload.status)]
        }
        _ => vec![],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_delta_parses() {
        let events = parse_event(
            "thread.message.delta",
            r#"{"id":"msg_123","object":"thread.message.delta","delta":{"content":[{"index":0,"type":"text","text":{"value":"Hel"}},{"index":0,"type":"text","text":{"value":"lo"}}]}}"#,
        )
        .unwrap();
        assert_eq!(events, vec![RunEvent::MessageDelta("Hello".to_string())]);
    }

    #[test]
    fn code_interpreter_delta_parses_input_and_logs() {
        let events = parse_event(
            "thread.run.step.delta",
            r#"{"id":"step_123","object":"thread.run.step.delta","delta":{"step_details":{"type":"tool_calls","tool_calls":[{"index":0,"id":"call_123","type":"code_interpreter","code_interpreter":{"input":"print(1+1)","outputs":[{"type":"logs","logs":"2"}]}}]}}}"#,
        )
        .unwrap();
        assert_eq!(
            events,
            vec![RunEvent::ToolCallDelta {
                input: Some("print(1+1)".to_string()),
                logs: vec!["2".to_string()],
            }]
        );
    }

    #[test]
    fn tool_call_step_creation_names_the_tool() {
        let events = parse_event(
            "thread.run.step.created",
            r#"{"id":"step_123","object":"thread.run.step","step_details":{"type":"tool_calls","tool_calls":[{"id":"call_123","type":"code_interpreter","code_interpreter":{"input":"","outputs":[]}}]}}"#,
        )
        .unwrap();
        assert_eq!(
            events,
            vec![RunEvent::ToolCallCreated("code_interpreter".to_string())]
        );
    }

    #[test]
    fn message_creation_step_yields_nothing() {
        let events = parse_event(
            "thread.run.step.created",
            r#"{"id":"step_123","object":"thread.run.step","step_details":{"type":"message_creation","message_creation":{"message_id":"msg_123"}}}"#,
        )
        .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn run_lifecycle_events_surface_status() {
        let events = parse_event(
            "thread.run.completed",
            r#"{"id":"run_123","object":"thread.run","status":"completed"}"#,
        )
        .unwrap();
        assert_eq!(events, vec![RunEvent::StatusChanged(RunStatus::Completed)]);

        let events = parse_event(
            "thread.run.failed",
            r#"{"id":"run_123","object":"thread.run","status":"failed"}"#,
        )
        .unwrap();
        assert_eq!(events, vec![RunEvent::StatusChanged(RunStatus::Failed)]);
    }

    #[test]
    fn unknown_events_are_skipped() {
        let events = parse_event("thread.run.step.completed", r#"{"id":"step_123"}"#).unwrap();
        assert!(events.is_empty());
    }

    use eventsource_stream::Event as MessageEvent;

    fn message_event(event: &str, data: &str) -> Result<Event, reqwest_eventsource::Error> {
        Ok(Event::Message(MessageEvent {
            event: event.to_string(),
            data: data.to_string(),
            id: String::new(),
            retry: None,
        }))
    }

    #[tokio::test]
    async fn stream_failure_reaches_the_consumer() {
        let utf8_error = String::from_utf8(vec![0xff]).unwrap_err();
        let mut source = futures_util::stream::iter(vec![
            Ok(Event::Open),
            message_event(
                "thread.message.delta",
                r#"{"delta":{"content":[{"index":0,"type":"text","text":{"value":"Hel"}}]}}"#,
            ),
            Err(reqwest_eventsource::Error::Utf8(utf8_error)),
        ]);
        let (tx, mut rx) = channel(32);
        forward_run_events(&mut source, tx).await;

        assert_eq!(
            rx.recv().await.unwrap().unwrap(),
            RunEvent::MessageDelta("Hel".to_string())
        );
        // The failure arrives as the final item, not a silent close.
        assert!(matches!(rx.recv().await.unwrap(), Err(Error::Stream(_))));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn done_event_delivers_done_then_closes() {
        let mut source = futures_util::stream::iter(vec![
            Ok(Event::Open),
            message_event(
                "thread.run.completed",
                r#"{"id":"run_123","object":"thread.run","status":"completed"}"#,
            ),
            message_event("done", "[DONE]"),
        ]);
        let (tx, mut rx) = channel(32);
        forward_run_events(&mut source, tx).await;

        assert_eq!(
            rx.recv().await.unwrap().unwrap(),
            RunEvent::StatusChanged(RunStatus::Completed)
        );
        assert_eq!(rx.recv().await.unwrap().unwrap(), RunEvent::Done);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn server_close_after_done_is_not_an_error() {
        let mut source = futures_util::stream::iter(vec![Err::<Event, _>(
            reqwest_eventsource::Error::StreamEnded,
        )]);
        let (tx, mut rx) = channel(32);
        forward_run_events(&mut source, tx).await;

        assert!(rx.recv().await.is_none());
    }
}
