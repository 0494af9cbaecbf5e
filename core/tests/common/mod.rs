#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use counsel_core::{
    chat::{
        stream::{decode_lines, lines, strip_event_prefix, DONE_SENTINEL},
        ChatError, ChatProvider, Fragment, FragmentStream, GenerationParams, Message, ModelInfo,
    },
    Gateway, ProviderId, ProviderSelection,
};
use futures::{stream, StreamExt};

/// How a fake request fails.
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    ConnectionRefused,
    Timeout,
    Status(u16),
    Rejected,
}

impl Failure {
    fn error(self) -> ChatError {
        match self {
            Failure::ConnectionRefused => ChatError::Network("connection refused".into()),
            Failure::Timeout => ChatError::Timeout("no response within 300s".to_string()),
            Failure::Status(status) => ChatError::Api {
                status,
                message: "model crashed".to_string(),
            },
            Failure::Rejected => ChatError::Configuration("model name is empty".to_string()),
        }
    }

    fn unreachable(self) -> bool {
        matches!(self, Failure::ConnectionRefused | Failure::Timeout)
    }
}

enum Script {
    /// Raw wire lines, delivered as byte chunks and decoded like a streaming backend would.
    Lines(Vec<String>),
    /// Lines followed by a broken connection.
    LinesThenDrop(Vec<String>),
    Fail(Failure),
}

/// In-process provider with a scripted response.
///
/// Each line is either a JSON record `{"response": "..."}` (optionally prefixed with `data:`)
/// or the `[DONE]` sentinel. Anything else is skipped, as real decoders do.
pub struct FakeProvider {
    name: &'static str,
    script: Script,
    models: Vec<ModelInfo>,
    calls: AtomicUsize,
    lines_read: Arc<AtomicUsize>,
    requests: Mutex<Vec<(Vec<Message>, GenerationParams)>>,
}

impl FakeProvider {
    fn with_script(name: &'static str, script: Script) -> Self {
        Self {
            name,
            script,
            models: vec![ModelInfo {
                id: "mistral:latest".to_string(),
                size: Some(4_113_301_824),
                modified_at: None,
            }],
            calls: AtomicUsize::new(0),
            lines_read: Arc::new(AtomicUsize::new(0)),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Streams one `response` record per fragment.
    pub fn replying(name: &'static str, fragments: &[&str]) -> Self {
        Self::with_script(name, Script::Lines(fragments.iter().map(|f| record(f)).collect()))
    }

    /// Streams the given raw lines.
    pub fn raw(name: &'static str, lines: &[&str]) -> Self {
        Self::with_script(
            name,
            Script::Lines(lines.iter().map(|l| l.to_string()).collect()),
        )
    }

    pub fn dropping_after(name: &'static str, fragments: &[&str]) -> Self {
        Self::with_script(
            name,
            Script::LinesThenDrop(fragments.iter().map(|f| record(f)).collect()),
        )
    }

    pub fn failing(name: &'static str, failure: Failure) -> Self {
        Self::with_script(name, Script::Fail(failure))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn lines_read(&self) -> usize {
        self.lines_read.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<(Vec<Message>, GenerationParams)> {
        self.requests.lock().unwrap().clone()
    }

    fn stream(&self, wire: &[String], drop_at_end: bool) -> FragmentStream {
        let mut chunks: Vec<Result<Vec<u8>, ChatError>> = wire
            .iter()
            .map(|line| Ok(format!("{}\n", line).into_bytes()))
            .collect();
        if drop_at_end {
            chunks.push(Err(ChatError::Streaming("connection reset by peer".to_string())));
        }

        let counter = Arc::clone(&self.lines_read);
        let counted = lines(stream::iter(chunks)).inspect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        decode_lines(counted, decode)
    }
}

fn record(fragment: &str) -> String {
    serde_json::json!({ "response": fragment }).to_string()
}

fn decode(line: &str) -> Vec<Fragment> {
    let payload = strip_event_prefix(line.trim());
    if payload.is_empty() {
        return Vec::new();
    }
    if payload == DONE_SENTINEL {
        return vec![Fragment::Done];
    }
    serde_json::from_str::<serde_json::Value>(payload)
        .ok()
        .and_then(|v| v.get("response")?.as_str().map(Fragment::text))
        .into_iter()
        .collect()
}

#[async_trait]
impl ChatProvider for FakeProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn default_model(&self) -> &str {
        "fake"
    }

    async fn open_stream(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<FragmentStream, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((messages.to_vec(), params.clone()));

        match &self.script {
            Script::Lines(wire) => Ok(self.stream(wire, false)),
            Script::LinesThenDrop(wire) => Ok(self.stream(wire, true)),
            Script::Fail(failure) => Err(failure.error()),
        }
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, ChatError> {
        match &self.script {
            Script::Fail(failure) if failure.unreachable() => Err(failure.error()),
            _ => Ok(self.models.clone()),
        }
    }
}

pub fn gateway(
    active: ProviderId,
    local: &Arc<FakeProvider>,
    hosted: Option<&Arc<FakeProvider>>,
) -> Gateway {
    Gateway::new(
        ProviderSelection::new(active),
        Arc::clone(local) as Arc<dyn ChatProvider>,
        hosted.map(|h| Arc::clone(h) as Arc<dyn ChatProvider>),
    )
}

pub fn conversation(question: &str) -> Vec<Message> {
    vec![
        Message::system("You are a legal AI assistant."),
        Message::user(question),
    ]
}
