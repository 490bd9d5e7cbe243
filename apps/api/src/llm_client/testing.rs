//! Deterministic `ModelBackend` fakes shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use super::{ChatTurn, DeltaStream, LlmError, ModelBackend, ModelGateway, ResponseFormat};

type GenerateFn = dyn Fn(&str) -> Result<String, LlmError> + Send + Sync;
type ChatFn = dyn Fn(&str) -> Vec<Result<String, LlmError>> + Send + Sync;

/// Answers every call from closures and records what it was asked.
pub struct ScriptedBackend {
    generate: Box<GenerateFn>,
    chat: Box<ChatFn>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<(String, ResponseFormat)>>,
    histories: Mutex<Vec<Vec<ChatTurn>>>,
}

impl ScriptedBackend {
    pub fn replying(
        generate: impl Fn(&str) -> Result<String, LlmError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            generate: Box::new(generate),
            chat: Box::new(|_| vec![Ok("ok".to_string())]),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            histories: Mutex::new(Vec::new()),
        }
    }

    /// Always returns the same text.
    pub fn fixed(text: &str) -> Self {
        let text = text.to_string();
        Self::replying(move |_| Ok(text.clone()))
    }

    pub fn with_chat(
        mut self,
        chat: impl Fn(&str) -> Vec<Result<String, LlmError>> + Send + Sync + 'static,
    ) -> Self {
        self.chat = Box::new(chat);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<(String, ResponseFormat)> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn histories(&self) -> Vec<Vec<ChatTurn>> {
        self.histories.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    async fn generate(&self, prompt: &str, format: ResponseFormat) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), format));
        (self.generate)(prompt)
    }

    async fn stream_chat(
        &self,
        _system_instruction: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<DeltaStream, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.histories.lock().unwrap().push(history.to_vec());
        Ok(stream::iter((self.chat)(message)).boxed())
    }
}

/// Wraps a backend in a live gateway while keeping a handle for assertions.
pub fn live_gateway(backend: ScriptedBackend) -> (ModelGateway, Arc<ScriptedBackend>) {
    let backend = Arc::new(backend);
    (ModelGateway::live(backend.clone()), backend)
}
