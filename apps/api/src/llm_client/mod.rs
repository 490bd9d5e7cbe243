/// LLM Client: the single point of entry for all Gemini API calls in the service.
///
/// ARCHITECTURAL RULE: No other module may call the backend directly.
/// Pipeline stages go through `ModelGateway`; the chat session holds the
/// `ModelBackend` the gateway hands out.
///
/// Model: gemini-2.5-flash (hardcoded, not configurable)
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;

pub mod extract;
pub mod prompts;
pub mod sse;
#[cfg(test)]
pub mod testing;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// The model used for every generation and chat call.
pub const MODEL: &str = "gemini-2.5-flash";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Whole-response ceiling for `generate`. Chat streams get none, since a long reply is
/// still a healthy one. Per-stage deadlines are enforced by the orchestrator.
const GENERATE_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Prompt blocked by the backend: {0}")]
    Blocked(String),

    #[error("Backend credential is not configured")]
    Unavailable,
}

/// Desired shape of a single-shot response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    Json,
}

impl ResponseFormat {
    fn mime_type(self) -> Option<&'static str> {
        match self {
            ResponseFormat::Text => None,
            ResponseFormat::Json => Some("application/json"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

/// One prior exchange in a chat session, replayed to the backend on every send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            text: text.into(),
        }
    }
}

/// Incremental text deltas of one streamed reply.
pub type DeltaStream = BoxStream<'static, Result<String, LlmError>>;

/// The backend seam. `LlmClient` talks HTTP; tests plug in deterministic fakes.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn generate(&self, prompt: &str, format: ResponseFormat) -> Result<String, LlmError>;

    async fn stream_chat(
        &self,
        system_instruction: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<DeltaStream, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<TurnRole>,
    parts: Vec<Part<'a>>,
}

impl<'a> Content<'a> {
    fn new(role: Option<TurnRole>, text: &'a str) -> Self {
        Self {
            role,
            parts: vec![Part { text }],
        }
    }
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate, if any.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback.as_ref()?.block_reason.as_deref()
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP client
// ────────────────────────────────────────────────────────────────────────────

/// HTTP implementation of `ModelBackend` against the Generative Language REST API.
/// Single attempt per call; retries are the caller's decision.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
    generate_timeout: Duration,
}

impl LlmClient {
    pub fn new(api_key: String, base_url: impl Into<String>) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?,
            api_key,
            base_url: base_url.into(),
            generate_timeout: GENERATE_TIMEOUT,
        })
    }

    #[cfg(test)]
    fn with_generate_timeout(mut self, timeout: Duration) -> Self {
        self.generate_timeout = timeout;
        self
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.base_url.trim_end_matches('/'),
            MODEL,
            method
        )
    }

    /// `timeout` bounds the whole exchange, body included; `None` leaves only the
    /// connect timeout.
    async fn post(
        &self,
        url: &str,
        body: &GenerateContentRequest<'_>,
        timeout: Option<Duration>,
    ) -> Result<Response, LlmError> {
        let mut request = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {}: {}", status, body);
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    /// Makes a raw single-shot call, returning the full response object.
    pub async fn call(
        &self,
        prompt: &str,
        format: ResponseFormat,
    ) -> Result<GenerateContentResponse, LlmError> {
        let request_body = GenerateContentRequest {
            contents: vec![Content::new(Some(TurnRole::User), prompt)],
            system_instruction: None,
            generation_config: format.mime_type().map(|mime| GenerationConfig {
                response_mime_type: mime,
            }),
        };

        let response = self
            .post(
                &self.endpoint("generateContent"),
                &request_body,
                Some(self.generate_timeout),
            )
            .await?;
        let body: GenerateContentResponse = response.json().await?;

        if let Some(usage) = &body.usage_metadata {
            debug!(
                "LLM call succeeded: prompt_tokens={}, output_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        Ok(body)
    }
}

#[async_trait]
impl ModelBackend for LlmClient {
    async fn generate(&self, prompt: &str, format: ResponseFormat) -> Result<String, LlmError> {
        let response = self.call(prompt, format).await?;
        if let Some(reason) = response.block_reason() {
            return Err(LlmError::Blocked(reason.to_string()));
        }
        response.text().ok_or(LlmError::EmptyContent)
    }

    async fn stream_chat(
        &self,
        system_instruction: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<DeltaStream, LlmError> {
        let mut contents: Vec<Content<'_>> = history
            .iter()
            .map(|turn| Content::new(Some(turn.role), &turn.text))
            .collect();
        contents.push(Content::new(Some(TurnRole::User), message));

        let request_body = GenerateContentRequest {
            contents,
            system_instruction: Some(Content::new(None, system_instruction)),
            generation_config: None,
        };

        let url = format!("{}?alt=sse", self.endpoint("streamGenerateContent"));
        let response = self.post(&url, &request_body, None).await?;

        Ok(delta_stream(response.bytes_stream()))
    }
}

/// Adapts a raw SSE byte stream into text deltas. A transport or decode error is
/// yielded once and ends the stream.
fn delta_stream<S>(bytes: S) -> DeltaStream
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
{
    struct State<S> {
        bytes: std::pin::Pin<Box<S>>,
        decoder: sse::SseDecoder,
        ready: VecDeque<Result<String, LlmError>>,
        done: bool,
    }

    let state = State {
        bytes: Box::pin(bytes),
        decoder: sse::SseDecoder::default(),
        ready: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.ready.pop_front() {
                if item.is_err() {
                    state.done = true;
                    state.ready.clear();
                }
                return Some((item, state));
            }
            if state.done {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    for data in state.decoder.push(&chunk) {
                        state.ready.extend(decode_event(&data));
                    }
                }
                Some(Err(e)) => {
                    state.ready.push_back(Err(LlmError::Http(e)));
                }
                None => {
                    state.done = true;
                    if let Some(data) = state.decoder.finish() {
                        state.ready.extend(decode_event(&data));
                    }
                }
            }
        }
    })
    .boxed()
}

fn decode_event(data: &str) -> Option<Result<String, LlmError>> {
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }
    let chunk: GenerateContentResponse = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => return Some(Err(LlmError::Parse(e))),
    };
    if let Some(reason) = chunk.block_reason() {
        return Some(Err(LlmError::Blocked(reason.to_string())));
    }
    chunk.text().map(Ok)
}

// ────────────────────────────────────────────────────────────────────────────
// Gateway
// ────────────────────────────────────────────────────────────────────────────

/// Owns the availability decision. Built once at startup: with a credential it wraps a
/// live backend, without one it is permanently in mock mode and never touches the
/// network. Stages branch on `is_available()` and supply their own mock values.
#[derive(Clone, Default)]
pub struct ModelGateway {
    backend: Option<Arc<dyn ModelBackend>>,
}

impl ModelGateway {
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        match &config.gemini_api_key {
            Some(key) => {
                let client = LlmClient::new(key.clone(), config.gemini_base_url.clone())?;
                info!("LLM gateway live (model: {MODEL})");
                Ok(Self::live(Arc::new(client)))
            }
            None => {
                warn!("No backend credential configured; running in mock mode");
                Ok(Self::unavailable())
            }
        }
    }

    pub fn live(backend: Arc<dyn ModelBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    pub fn unavailable() -> Self {
        Self { backend: None }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    pub fn backend(&self) -> Option<Arc<dyn ModelBackend>> {
        self.backend.clone()
    }

    pub async fn generate(&self, prompt: &str, format: ResponseFormat) -> Result<String, LlmError> {
        let backend = self.backend.as_ref().ok_or(LlmError::Unavailable)?;
        backend.generate(prompt, format).await
    }
}

impl std::fmt::Debug for ModelGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelGateway")
            .field("available", &self.is_available())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        extract::{Path, Query, State},
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Mutex;

    type Captured = Arc<Mutex<Vec<(HeaderMap, Value)>>>;

    /// Spawns a loopback server standing in for the Generative Language API.
    async fn fake_backend(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1beta")
    }

    fn candidate(text: &str) -> Value {
        json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5}
        })
    }

    async fn capture_generate(
        State(captured): State<Captured>,
        Path(call): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        assert_eq!(call, format!("{MODEL}:generateContent"));
        captured.lock().unwrap().push((headers, body));
        Json(candidate("```json\n{\"ok\": true}\n```"))
    }

    #[tokio::test]
    async fn test_generate_sends_key_and_json_mime_type() {
        let captured: Captured = Arc::default();
        let router = Router::new()
            .route(
                "/v1beta/models/:call",
                post(capture_generate),
            )
            .with_state(captured.clone());
        let base = fake_backend(router).await;

        let client = LlmClient::new("secret-key".to_string(), base).unwrap();
        let text = client.generate("Analyze me", ResponseFormat::Json).await.unwrap();
        assert_eq!(text, "```json\n{\"ok\": true}\n```");

        let captured = captured.lock().unwrap();
        let (headers, body) = &captured[0];
        assert_eq!(headers["x-goog-api-key"], "secret-key");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Analyze me");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    }

    #[tokio::test]
    async fn test_plain_text_format_omits_generation_config() {
        let captured: Captured = Arc::default();
        let router = Router::new()
            .route(
                "/v1beta/models/:call",
                post(capture_generate),
            )
            .with_state(captured.clone());
        let base = fake_backend(router).await;

        let client = LlmClient::new("k".to_string(), base).unwrap();
        client.generate("hello", ResponseFormat::Text).await.unwrap();
        assert!(captured.lock().unwrap()[0].1.get("generationConfig").is_none());
    }

    #[tokio::test]
    async fn test_api_error_message_is_surfaced() {
        let router = Router::new().route(
            "/v1beta/models/:call",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}})),
                )
                    .into_response()
            }),
        );
        let base = fake_backend(router).await;

        let client = LlmClient::new("bad".to_string(), base).unwrap();
        match client.generate("x", ResponseFormat::Json).await {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_candidates_is_empty_content() {
        let router = Router::new().route(
            "/v1beta/models/:call",
            post(|| async { Json(json!({"candidates": []})) }),
        );
        let base = fake_backend(router).await;

        let client = LlmClient::new("k".to_string(), base).unwrap();
        assert!(matches!(
            client.generate("x", ResponseFormat::Json).await,
            Err(LlmError::EmptyContent)
        ));
    }

    #[tokio::test]
    async fn test_blocked_prompt_is_reported() {
        let router = Router::new().route(
            "/v1beta/models/:call",
            post(|| async { Json(json!({"promptFeedback": {"blockReason": "SAFETY"}})) }),
        );
        let base = fake_backend(router).await;

        let client = LlmClient::new("k".to_string(), base).unwrap();
        assert!(matches!(
            client.generate("x", ResponseFormat::Json).await,
            Err(LlmError::Blocked(reason)) if reason == "SAFETY"
        ));
    }

    #[tokio::test]
    async fn test_stream_chat_yields_deltas_and_replays_history() {
        let captured: Captured = Arc::default();
        async fn stream_handler(
            State(captured): State<Captured>,
            Path(call): Path<String>,
            Query(query): Query<HashMap<String, String>>,
            headers: HeaderMap,
            Json(body): Json<Value>,
        ) -> impl IntoResponse {
            assert_eq!(call, format!("{MODEL}:streamGenerateContent"));
            assert_eq!(query.get("alt").map(String::as_str), Some("sse"));
            captured.lock().unwrap().push((headers, body));
            let events = [candidate("Hello"), candidate(", there"), candidate("!")]
                .iter()
                .map(|c| format!("data: {c}\r\n\r\n"))
                .collect::<String>();
            ([("content-type", "text/event-stream")], events)
        }

        let router = Router::new()
            .route(
                "/v1beta/models/:call",
                post(stream_handler),
            )
            .with_state(captured.clone());
        let base = fake_backend(router).await;

        let client = LlmClient::new("k".to_string(), base).unwrap();
        let history = vec![ChatTurn::user("Hi"), ChatTurn::model("Hello! How can I help?")];
        let deltas: Vec<String> = client
            .stream_chat("You are Caramel.", &history, "Tell me about mentoring")
            .await
            .unwrap()
            .map(|d| d.unwrap())
            .collect()
            .await;
        assert_eq!(deltas, vec!["Hello", ", there", "!"]);

        let captured = captured.lock().unwrap();
        let body = &captured[0].1;
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You are Caramel.");
        assert!(body["systemInstruction"].get("role").is_none());
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["parts"][0]["text"], "Tell me about mentoring");
    }

    #[tokio::test]
    async fn test_chat_stream_outlives_generate_timeout() {
        let router = Router::new().route(
            "/v1beta/models/:call",
            post(|| async {
                let events = stream::iter([candidate("Slow"), candidate(" reply")])
                    .enumerate()
                    .then(|(i, c)| async move {
                        if i > 0 {
                            tokio::time::sleep(Duration::from_millis(300)).await;
                        }
                        Ok::<_, std::convert::Infallible>(format!("data: {c}\n\n"))
                    });
                (
                    [("content-type", "text/event-stream")],
                    Body::from_stream(events),
                )
            }),
        );
        let base = fake_backend(router).await;

        let client = LlmClient::new("k".to_string(), base)
            .unwrap()
            .with_generate_timeout(Duration::from_millis(100));
        let deltas: Vec<String> = client
            .stream_chat("You are Caramel.", &[], "hi")
            .await
            .unwrap()
            .map(|d| d.unwrap())
            .collect()
            .await;
        assert_eq!(deltas, vec!["Slow", " reply"]);
    }

    #[tokio::test]
    async fn test_generate_is_bounded_by_timeout() {
        let router = Router::new().route(
            "/v1beta/models/:call",
            post(|| async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Json(candidate("too late"))
            }),
        );
        let base = fake_backend(router).await;

        let client = LlmClient::new("k".to_string(), base)
            .unwrap()
            .with_generate_timeout(Duration::from_millis(100));
        assert!(matches!(
            client.generate("x", ResponseFormat::Json).await,
            Err(LlmError::Http(e)) if e.is_timeout()
        ));
    }

    #[tokio::test]
    async fn test_delta_stream_stops_after_bad_event() {
        let chunks: Vec<Result<Bytes, reqwest::Error>> = vec![
            Ok(Bytes::from(format!("data: {}\n\n", candidate("partial")))),
            Ok(Bytes::from_static(b"data: {not json\n\ndata: {}\n\n")),
        ];
        let items: Vec<Result<String, LlmError>> =
            delta_stream(stream::iter(chunks)).collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "partial");
        assert!(matches!(items[1], Err(LlmError::Parse(_))));
    }

    #[tokio::test]
    async fn test_unavailable_gateway_never_calls_backend() {
        let gateway = ModelGateway::unavailable();
        assert!(!gateway.is_available());
        assert!(gateway.backend().is_none());
        assert!(matches!(
            gateway.generate("x", ResponseFormat::Json).await,
            Err(LlmError::Unavailable)
        ));
    }

    #[test]
    fn test_gateway_from_config_without_key_is_mock() {
        let gateway = ModelGateway::from_config(&Config::default()).unwrap();
        assert!(!gateway.is_available());
    }

    #[test]
    fn test_gateway_from_config_with_key_is_live() {
        let config = Config {
            gemini_api_key: Some("k".to_string()),
            ..Config::default()
        };
        assert!(ModelGateway::from_config(&config).unwrap().is_available());
    }
}
