//! Folds a streamed chat completion into the client-facing response shape
//!
//! Every upstream event updates one [`AggregateResponse`], and after each
//! event the whole aggregate is written out as one JSON line. The client
//! therefore always holds a complete snapshot of the answer so far.

use azure_openai_ox::{AzureOpenAIError, ChatChunk};
use futures_util::{Stream, StreamExt, stream::BoxStream};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{RelayError, StreamErrorPolicy};

/// Content fragment the data-source endpoint sends to close an answer
const DONE_SENTINEL: &str = "[DONE]";

/// Identity fields every chunk carries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkMeta {
    pub id: String,
    pub model: String,
    pub created: u64,
    pub object: String,
}

/// One decoded upstream event
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// The upstream reported a failure; forwarded as is
    Error(Value),
    /// A new assistant message begins
    AssistantStart { meta: ChunkMeta, content: Option<String> },
    /// More text for the current assistant message
    ContentDelta { meta: ChunkMeta, content: String },
    /// A tool message (e.g. retrieval citations), kept verbatim
    ToolDelta { meta: ChunkMeta, delta: Value },
    /// Metadata only, such as the chunk carrying `finish_reason`
    Empty(ChunkMeta),
}

impl StreamEvent {
    /// Decode one event payload (already stripped of its `data:` marker)
    pub fn decode(payload: &str) -> Result<Self, RelayError> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| RelayError::parse(format!("invalid event `{payload}`: {e}")))?;

        if value.get("error").is_some() {
            return Ok(StreamEvent::Error(value));
        }

        let chunk: ChatChunk = serde_json::from_value(value)
            .map_err(|e| RelayError::parse(format!("unexpected event shape: {e}")))?;
        let meta = ChunkMeta {
            id: chunk.id.clone(),
            model: chunk.model.clone(),
            created: chunk.created,
            object: chunk.object.clone(),
        };

        let Some(delta) = chunk.first_delta() else {
            return Ok(StreamEvent::Empty(meta));
        };
        let content = delta.get("content").and_then(Value::as_str);

        match delta.get("role").and_then(Value::as_str) {
            Some("tool") => Ok(StreamEvent::ToolDelta {
                meta,
                delta: delta.clone(),
            }),
            Some("assistant") => Ok(StreamEvent::AssistantStart {
                meta,
                content: content.map(str::to_string),
            }),
            Some(other) => Err(RelayError::parse(format!("unexpected delta role `{other}`"))),
            None => match content {
                Some(content) => Ok(StreamEvent::ContentDelta {
                    meta,
                    content: content.to_string(),
                }),
                None => Ok(StreamEvent::Empty(meta)),
            },
        }
    }
}

/// The event payload of a raw line, or `None` for lines that carry no event
pub fn event_payload(line: &str) -> Option<&str> {
    let line = line.trim();
    let payload = line.strip_prefix("data:").unwrap_or(line).trim();

    if payload.is_empty() || payload.starts_with(':') || payload == DONE_SENTINEL {
        None
    } else {
        Some(payload)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateChoice {
    pub messages: Vec<Value>,
}

/// Client-facing answer, identical for streamed and non-streamed replies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResponse {
    pub id: String,
    pub model: String,
    pub created: u64,
    pub object: String,
    pub choices: Vec<AggregateChoice>,
}

impl Default for AggregateResponse {
    fn default() -> Self {
        Self {
            id: String::new(),
            model: String::new(),
            created: 0,
            object: String::new(),
            choices: vec![AggregateChoice::default()],
        }
    }
}

impl AggregateResponse {
    /// Compact JSON followed by a newline
    pub fn frame(&self) -> Result<String, RelayError> {
        let mut frame = serde_json::to_string(self)
            .map_err(|e| RelayError::parse(format!("cannot encode response: {e}")))?;
        frame.push('\n');
        Ok(frame)
    }
}

/// Fold state for one streamed answer
#[derive(Debug, Default)]
pub struct Reassembler {
    aggregate: AggregateResponse,
    /// Index of the latest assistant entry
    assistant: Option<usize>,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aggregate(&self) -> &AggregateResponse {
        &self.aggregate
    }

    pub fn into_aggregate(self) -> AggregateResponse {
        self.aggregate
    }

    fn messages(&mut self) -> &mut Vec<Value> {
        if self.aggregate.choices.is_empty() {
            self.aggregate.choices.push(AggregateChoice::default());
        }
        &mut self.aggregate.choices[0].messages
    }

    fn copy_meta(&mut self, meta: ChunkMeta) {
        self.aggregate.id = meta.id;
        self.aggregate.model = meta.model;
        self.aggregate.created = meta.created;
        self.aggregate.object = meta.object;
    }

    /// Fold one event into the aggregate
    ///
    /// Error events are not folded; callers forward them instead.
    pub fn apply(&mut self, event: StreamEvent) -> Result<(), RelayError> {
        match event {
            StreamEvent::Error(_) => Ok(()),
            StreamEvent::Empty(meta) => {
                self.copy_meta(meta);
                Ok(())
            }
            StreamEvent::ToolDelta { meta, delta } => {
                self.copy_meta(meta);
                self.messages().push(delta);
                Ok(())
            }
            StreamEvent::AssistantStart { meta, content } => {
                self.copy_meta(meta);
                let messages = self.messages();
                let index = messages.len();
                messages.push(json!({
                    "role": "assistant",
                    "content": content.unwrap_or_default()
                }));
                self.assistant = Some(index);
                Ok(())
            }
            StreamEvent::ContentDelta { meta, content } => {
                self.copy_meta(meta);
                if content == DONE_SENTINEL {
                    return Ok(());
                }
                let index = self.assistant.ok_or_else(|| {
                    RelayError::parse("content delta before any assistant message")
                })?;
                let entry = &mut self.messages()[index];
                let mut text = entry
                    .get("content")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                text.push_str(&content);
                entry["content"] = Value::String(text);
                Ok(())
            }
        }
    }
}

/// Decode a raw line; `None` for lines without an event
pub fn decode_line(line: &str) -> Result<Option<StreamEvent>, RelayError> {
    event_payload(line).map(StreamEvent::decode).transpose()
}

/// `{"error": "<message>"}` as a frame
pub fn error_frame(error: &RelayError) -> String {
    format!("{}\n", error.to_json())
}

/// Turn upstream lines into client frames
///
/// The stream ends after the first parse or transport failure, with one
/// `{"error": ...}` frame. An upstream error event is forwarded verbatim,
/// after which `policy` decides whether the stream goes on.
pub fn reassemble<S>(lines: S, policy: StreamErrorPolicy) -> BoxStream<'static, String>
where
    S: Stream<Item = Result<String, AzureOpenAIError>> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut lines = Box::pin(lines);
        let mut reassembler = Reassembler::new();

        while let Some(line) = lines.next().await {
            let event = match line.map_err(RelayError::from).and_then(|line| decode_line(&line)) {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(error) => {
                    log::error!("ending stream: {error}");
                    yield error_frame(&error);
                    break;
                }
            };

            if let StreamEvent::Error(raw) = &event {
                log::warn!("upstream error event: {raw}");
                yield format!("{raw}\n");
                if policy == StreamErrorPolicy::Terminate {
                    break;
                }
                continue;
            }

            match reassembler.apply(event).and_then(|()| reassembler.aggregate().frame()) {
                Ok(frame) => {
                    log::debug!("frame: {}", frame.trim_end());
                    yield frame;
                }
                Err(error) => {
                    log::error!("ending stream: {error}");
                    yield error_frame(&error);
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn fold(lines: &[&str]) -> Result<AggregateResponse, RelayError> {
        let mut reassembler = Reassembler::new();
        for line in lines {
            if let Some(event) = decode_line(line)? {
                reassembler.apply(event)?;
            }
        }
        Ok(reassembler.into_aggregate())
    }

    fn chunk(delta: Value) -> String {
        format!(
            "data: {}",
            json!({
                "id": "chatcmpl-1",
                "model": "gpt-35-turbo",
                "created": 1_700_000_000,
                "object": "extensions.chat.completion.chunk",
                "choices": [{"index": 0, "messages": [{"index": 0, "delta": delta}]}]
            })
        )
    }

    async fn collect(lines: Vec<String>, policy: StreamErrorPolicy) -> Vec<Value> {
        let upstream = stream::iter(lines.into_iter().map(Ok::<_, AzureOpenAIError>));
        reassemble(upstream, policy)
            .map(|frame| {
                assert!(frame.ends_with('\n'));
                serde_json::from_str::<Value>(frame.trim_end()).unwrap()
            })
            .collect()
            .await
    }

    #[test]
    fn test_hello_world() {
        let lines = [
            chunk(json!({"role": "assistant"})),
            chunk(json!({"content": "Hello"})),
            chunk(json!({"content": " world"})),
            chunk(json!({"content": "[DONE]"})),
        ];
        let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
        let aggregate = fold(&lines).unwrap();

        assert_eq!(aggregate.id, "chatcmpl-1");
        assert_eq!(aggregate.created, 1_700_000_000);
        assert_eq!(
            aggregate.choices[0].messages,
            vec![json!({"role": "assistant", "content": "Hello world"})]
        );
    }

    #[test]
    fn test_tool_delta_is_a_distinct_entry() {
        let tool = json!({"role": "tool", "content": "{\"citations\": []}"});
        let lines = [
            chunk(tool.clone()),
            chunk(json!({"role": "assistant"})),
            chunk(json!({"content": "Hi"})),
        ];
        let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
        let before = fold(&lines).unwrap();

        let mut with_tool: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        with_tool.push(chunk(tool.clone()));
        let with_tool: Vec<&str> = with_tool.iter().map(String::as_str).collect();
        let after = fold(&with_tool).unwrap();

        let messages = &after.choices[0].messages;
        assert_eq!(messages.len(), before.choices[0].messages.len() + 1);
        assert_eq!(messages[0], tool);
        assert_eq!(messages[1], json!({"role": "assistant", "content": "Hi"}));
        assert_eq!(messages[2], tool);
    }

    #[test]
    fn test_plain_endpoint_shape() {
        let lines = [
            r#"data: {"id":"","object":"","created":0,"model":"","choices":[],"prompt_filter_results":[]}"#,
            r#"data: {"id":"c1","object":"chat.completion.chunk","created":5,"model":"gpt-4","choices":[{"index":0,"delta":{"role":"assistant","content":""}}]}"#,
            r#"data: {"id":"c1","object":"chat.completion.chunk","created":5,"model":"gpt-4","choices":[{"index":0,"delta":{"content":"Hey"}}]}"#,
            r#"data: {"id":"c1","object":"chat.completion.chunk","created":5,"model":"gpt-4","choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#,
            "data: [DONE]",
        ];
        let aggregate = fold(&lines).unwrap();

        assert_eq!(aggregate.model, "gpt-4");
        assert_eq!(
            aggregate.choices[0].messages,
            vec![json!({"role": "assistant", "content": "Hey"})]
        );
    }

    #[test]
    fn test_ignored_lines() {
        assert_eq!(event_payload(""), None);
        assert_eq!(event_payload("   "), None);
        assert_eq!(event_payload(": keep-alive"), None);
        assert_eq!(event_payload("data: [DONE]"), None);
        assert_eq!(event_payload("data:{\"a\":1}"), Some("{\"a\":1}"));
        assert_eq!(event_payload("{\"a\":1}"), Some("{\"a\":1}"));
    }

    #[test]
    fn test_content_before_assistant_is_an_error() {
        let line = chunk(json!({"content": "orphan"}));
        let err = fold(&[line.as_str()]).unwrap_err();
        assert!(matches!(err, RelayError::Parse(_)));
    }

    #[test]
    fn test_second_assistant_start_opens_a_new_entry() {
        let lines = [
            chunk(json!({"role": "assistant"})),
            chunk(json!({"content": "Hello world"})),
            chunk(json!({"role": "assistant"})),
            chunk(json!({"content": "again"})),
        ];
        let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
        let aggregate = fold(&lines).unwrap();

        assert_eq!(
            aggregate.choices[0].messages,
            vec![
                json!({"role": "assistant", "content": "Hello world"}),
                json!({"role": "assistant", "content": "again"}),
            ]
        );
    }

    #[test]
    fn test_order_matters() {
        let start = chunk(json!({"role": "assistant"}));
        let text = chunk(json!({"content": "x"}));
        assert!(fold(&[start.as_str(), text.as_str()]).is_ok());
        assert!(fold(&[text.as_str(), start.as_str()]).is_err());
    }

    #[tokio::test]
    async fn test_frame_after_every_event() {
        let frames = collect(
            vec![
                chunk(json!({"role": "assistant"})),
                String::new(),
                chunk(json!({"content": "line one\nline two"})),
            ],
            StreamErrorPolicy::Terminate,
        )
        .await;

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0]["choices"][0]["messages"][0]["content"], "");
        assert_eq!(
            frames[1]["choices"][0]["messages"][0]["content"],
            "line one\nline two"
        );
    }

    #[tokio::test]
    async fn test_malformed_line_ends_stream() {
        let frames = collect(
            vec![
                chunk(json!({"role": "assistant"})),
                "data: {not json".to_string(),
                chunk(json!({"content": "never"})),
            ],
            StreamErrorPolicy::Terminate,
        )
        .await;

        assert_eq!(frames.len(), 2);
        let last = frames[1].as_object().unwrap();
        assert_eq!(last.len(), 1);
        assert!(last["error"].as_str().unwrap().starts_with("Parse error"));
    }

    #[tokio::test]
    async fn test_error_event_policy() {
        let lines = vec![
            chunk(json!({"role": "assistant"})),
            r#"data: {"error": {"code": "429", "message": "Too many requests"}}"#.to_string(),
            chunk(json!({"content": "after"})),
        ];

        let terminated = collect(lines.clone(), StreamErrorPolicy::Terminate).await;
        assert_eq!(terminated.len(), 2);
        assert_eq!(terminated[1]["error"]["code"], "429");

        let continued = collect(lines, StreamErrorPolicy::Continue).await;
        assert_eq!(continued.len(), 3);
        assert_eq!(continued[2]["choices"][0]["messages"][0]["content"], "after");
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream() {
        let upstream = stream::iter(vec![
            Ok(chunk(json!({"role": "assistant"}))),
            Err(AzureOpenAIError::EmptyEmbedding),
        ]);
        let frames: Vec<String> = reassemble(upstream, StreamErrorPolicy::Continue)
            .collect()
            .await;

        assert_eq!(frames.len(), 2);
        assert!(frames[1].starts_with("{\"error\":"));
    }
}
