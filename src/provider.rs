//! Generative Backend Abstraction
//!
//! The interface the orchestrator uses to talk to the generative text service: model
//! listing and single-shot generation. Adapters return raw HTTP replies for generation
//! so classification stays with the request executor.

use crate::error::{sanitize_message, GenerationError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod catalog;
pub mod gemini;

pub use catalog::{ModelCatalog, ModelDescriptor, RankedModelList};
pub use gemini::GeminiClient;

/// Wire format requested from the model and expected by the parser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Ten `key=value` lines; survives truncation.
    #[default]
    Kv,
    /// One JSON object constrained by a response schema.
    Json,
}

/// Generation parameters sent with every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub output_format: OutputFormat,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.75,
            max_output_tokens: 1500,
            output_format: OutputFormat::Kv,
        }
    }
}

/// One entry of the model listing, before eligibility filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedModel {
    pub name: String,
    pub supported_methods: Vec<String>,
}

/// Raw reply of a generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReply {
    pub status: u16,
    /// `Retry-After` header value, in whole seconds.
    pub retry_after: Option<Duration>,
    pub body: String,
}

impl BackendReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Header hint first, then the `retryDelay` the service embeds in error bodies.
    pub fn retry_hint(&self) -> Option<Duration> {
        self.retry_after.or_else(|| retry_delay_from_body(&self.body))
    }
}

/// Generative backend client trait
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// List every model the credentials can see. Non-success statuses come back as
    /// classified errors.
    async fn list_models(&self) -> Result<Vec<ListedModel>, GenerationError>;

    /// Issue one generation request. `Err` is reserved for transport failures; every
    /// HTTP status, success or not, is returned as a reply.
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<BackendReply, GenerationError>;

    fn backend_name(&self) -> &str;
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Pull the text payload out of a successful generation body
/// (first candidate, first content part, text).
pub fn extract_text(body: &str) -> Result<String, GenerationError> {
    let parsed: GenerateResponse = serde_json::from_str(body).map_err(|e| {
        GenerationError::malformed(format!(
            "unreadable generation response ({}): {}",
            e,
            sanitize_message(body)
        ))
    })?;
    parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or_else(|| {
            GenerationError::malformed(format!(
                "generation response has no text payload: {}",
                sanitize_message(body)
            ))
        })
}

/// Parse the `retryDelay` field (`"37s"`, `"1.5s"`) from a structured error body.
pub fn retry_delay_from_body(body: &str) -> Option<Duration> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let details = value.get("error")?.get("details")?.as_array()?;
    details.iter().find_map(|detail| {
        let raw = detail.get("retryDelay")?.as_str()?;
        let seconds: f64 = raw.trim().strip_suffix('s')?.parse().ok()?;
        Duration::try_from_secs_f64(seconds).ok()
    })
}

/// Parse an integer-seconds `Retry-After` header value.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

// Mock backend for testing
#[cfg(test)]
pub struct MockBackend {
    models: Vec<ListedModel>,
    replies: parking_lot::Mutex<std::collections::VecDeque<Result<BackendReply, GenerationError>>>,
    fallback: BackendReply,
    pub generate_calls: parking_lot::Mutex<Vec<String>>,
    pub list_calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockBackend {
    /// Backend listing `model_ids`, answering with `replies` in order and then `fallback`.
    pub fn new(
        model_ids: &[&str],
        replies: Vec<Result<BackendReply, GenerationError>>,
        fallback: BackendReply,
    ) -> Self {
        Self {
            models: model_ids
                .iter()
                .map(|id| ListedModel {
                    name: format!("models/{id}"),
                    supported_methods: vec![catalog::GENERATE_METHOD.to_string()],
                })
                .collect(),
            replies: parking_lot::Mutex::new(replies.into_iter().collect()),
            fallback,
            generate_calls: parking_lot::Mutex::new(Vec::new()),
            list_calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn text_reply(text: &str) -> BackendReply {
        BackendReply {
            status: 200,
            retry_after: None,
            body: serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": text }] } }]
            })
            .to_string(),
        }
    }

    pub fn status_reply(status: u16) -> BackendReply {
        BackendReply {
            status,
            retry_after: None,
            body: format!(r#"{{"error":{{"code":{status}}}}}"#),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl GenerativeBackend for MockBackend {
    async fn list_models(&self) -> Result<Vec<ListedModel>, GenerationError> {
        self.list_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(self.models.clone())
    }

    async fn generate(
        &self,
        model: &str,
        _prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<BackendReply, GenerationError> {
        self.generate_calls.lock().push(model.to_string());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()))
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}
