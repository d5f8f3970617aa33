//! Scripted stand-in for the model endpoint.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::llm_client::{GenerateRequest, GenerativeModel, LlmError, ModelResponse, Part};

/// Replays queued responses in order and records every request. An empty
/// queue answers with `LlmError::EmptyContent`.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<ModelResponse, LlmError>>>,
    requests: Mutex<Vec<GenerateRequest>>,
    delay: Mutex<Option<Duration>>,
    panic_next: Mutex<bool>,
}

impl ScriptedModel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, response: ModelResponse) {
        self.replies.lock().unwrap().push_back(Ok(response));
    }

    pub fn push_text(&self, text: &str) {
        self.push(ModelResponse {
            text: text.to_string(),
            sources: Vec::new(),
        });
    }

    pub fn push_error(&self, error: LlmError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Every call sleeps this long before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// The next call panics instead of answering.
    pub fn panic_next(&self) {
        *self.panic_next.lock().unwrap() = true;
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    async fn generate(&self, request: &GenerateRequest) -> Result<ModelResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let panic_now = std::mem::take(&mut *self.panic_next.lock().unwrap());
        if panic_now {
            panic!("scripted model failure");
        }
        let next = self.replies.lock().unwrap().pop_front();
        next.unwrap_or(Err(LlmError::EmptyContent))
    }
}

impl GenerateRequest {
    /// All text parts joined, for prompt assertions.
    pub fn prompt_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(text) => Some(text.as_str()),
                Part::InlineData { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
