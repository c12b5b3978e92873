#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, Response};
use chatkit_server::api::{stream::decode_line, AppState};
use chatkit_server::llm::{
    CompletionRequest, CompletionStream, LlmClient, LlmError, StreamEvent, TokenUsage, ToolCall,
};
use chatkit_server::settings::{MemoryStorage, SettingsStore};
use chatkit_server::tools::{Catalog, ToolBindings, ToolRegistry};
use chatkit_server::transcribe::{AudioUpload, TranscribeError, Transcriber};
use chatkit_server::Config;
use futures::stream::{self, StreamExt};

/// One scripted provider turn.
pub enum Turn {
    /// Events yielded by the stream.
    Events(Vec<Result<StreamEvent, LlmError>>),
    /// `stream_chat` itself fails.
    Fail(LlmError),
    /// Yields nothing until the client gives up.
    Hang,
}

/// LLM client that replays scripted turns and records every request.
#[derive(Default)]
pub struct ScriptedLlm {
    turns: Mutex<VecDeque<Turn>>,
    /// Returned once the script runs out.
    repeat: Mutex<Option<Vec<StreamEvent>>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn new(turns: Vec<Turn>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            ..Default::default()
        }
    }

    /// Answer every request with the same events.
    pub fn repeating(events: Vec<StreamEvent>) -> Self {
        Self {
            repeat: Mutex::new(Some(events)),
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn stream_chat(&self, request: CompletionRequest) -> Result<CompletionStream, LlmError> {
        self.requests.lock().unwrap().push(request);

        let turn = self.turns.lock().unwrap().pop_front();
        let turn = match turn {
            Some(turn) => turn,
            None => match self.repeat.lock().unwrap().clone() {
                Some(events) => Turn::Events(events.into_iter().map(Ok).collect()),
                None => Turn::Events(text_turn("")),
            },
        };

        match turn {
            Turn::Events(events) => Ok(stream::iter(events).boxed()),
            Turn::Fail(e) => Err(e),
            Turn::Hang => Ok(stream::pending::<Result<StreamEvent, LlmError>>().boxed()),
        }
    }
}

pub fn text_turn(text: &str) -> Vec<Result<StreamEvent, LlmError>> {
    vec![
        Ok(StreamEvent::TextDelta(text.to_string())),
        Ok(StreamEvent::Finish {
            finish_reason: Some("stop".to_string()),
            usage: Some(TokenUsage::new(10, 5)),
        }),
    ]
}

pub fn tool_turn(id: &str, name: &str, args: &str) -> Vec<StreamEvent> {
    vec![
        StreamEvent::ToolCall(ToolCall::function(id, name, args)),
        StreamEvent::Finish {
            finish_reason: Some("tool_calls".to_string()),
            usage: Some(TokenUsage::new(20, 3)),
        },
    ]
}

/// Transcriber returning a fixed result.
pub struct FakeTranscriber {
    pub result: Result<String, u16>,
    pub uploads: Mutex<Vec<AudioUpload>>,
}

impl FakeTranscriber {
    pub fn ok(text: &str) -> Self {
        Self {
            result: Ok(text.to_string()),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            result: Err(status),
            uploads: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, audio: AudioUpload) -> Result<String, TranscribeError> {
        self.uploads.lock().unwrap().push(audio);
        match &self.result {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(TranscribeError::Upstream {
                status: *status,
                body: "upstream failure".to_string(),
            }),
        }
    }
}

pub struct TestState {
    pub llm: Arc<dyn LlmClient>,
    pub transcriber: Option<Arc<dyn Transcriber>>,
    pub catalog: Catalog,
    pub max_duration: Duration,
    pub storage: Arc<MemoryStorage>,
}

impl TestState {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            transcriber: None,
            catalog: Catalog::builtin().unwrap(),
            max_duration: Duration::from_secs(5),
            storage: Arc::new(MemoryStorage::new()),
        }
    }

    pub fn transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn storage(mut self, storage: Arc<MemoryStorage>) -> Self {
        self.storage = storage;
        self
    }

    pub fn max_duration(mut self, limit: Duration) -> Self {
        self.max_duration = limit;
        self
    }

    pub fn build(self) -> Arc<AppState> {
        let config = Config {
            chat_max_duration: self.max_duration,
            ..Config::default()
        };
        let settings = SettingsStore::new(self.storage, Arc::new(self.catalog));

        Arc::new(AppState {
            config,
            llm: self.llm,
            transcriber: self.transcriber,
            tools: Arc::new(ToolRegistry::with_defaults()),
            bindings: Arc::new(ToolBindings::builtin()),
            settings: Arc::new(settings),
        })
    }
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Decode a data-stream response into `(code, value)` parts.
pub async fn read_parts(response: Response<Body>) -> Vec<(char, serde_json::Value)> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec())
        .unwrap()
        .lines()
        .map(|line| decode_line(line).unwrap())
        .collect()
}
