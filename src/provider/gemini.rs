//! Gemini REST adapter: model listing and `generateContent`.

use crate::error::{sanitize_message, DraftError, FailureKind, GenerationError};
use crate::provider::{
    parse_retry_after, BackendReply, GenerationOptions, GenerativeBackend, ListedModel,
    OutputFormat,
};
use crate::record::FIELDS;
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Upper bound on listing pages followed in one call.
const MAX_LISTING_PAGES: usize = 20;

// Helper function to map transport failures; the URL carries the key and is dropped.
fn map_transport_error(error: reqwest::Error) -> GenerationError {
    let kind = if error.is_timeout() {
        "request timeout"
    } else if error.is_connect() {
        "connection error"
    } else {
        "transport error"
    };
    GenerationError::transport(format!("{}: {}", kind, sanitize_message(&error.without_url().to_string())))
}

fn build_backend_http_client(
    connect_timeout: Duration,
    request_timeout: Duration,
) -> Result<Client, DraftError> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(request_timeout)
        .build()
        .map_err(|e| DraftError::BackendError(format!("Failed to create HTTP client: {}", e)))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

/// Schema constraining the model to one object with exactly the ten string fields.
pub fn idea_response_schema() -> Value {
    let properties: serde_json::Map<String, Value> = FIELDS
        .iter()
        .map(|field| (field.to_string(), json!({ "type": "STRING" })))
        .collect();
    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": FIELDS,
        "propertyOrdering": FIELDS,
    })
}

/// Gemini backend client
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, DraftError> {
        let client = build_backend_http_client(connect_timeout, request_timeout)?;
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            client,
            api_key,
            base_url,
        })
    }

    fn request_body<'a>(prompt: &'a str, options: &GenerationOptions) -> GenerateRequest<'a> {
        let (response_mime_type, response_schema) = match options.output_format {
            OutputFormat::Json => (Some("application/json"), Some(idea_response_schema())),
            OutputFormat::Kv => (None, None),
        };
        GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_output_tokens,
                response_mime_type,
                response_schema,
            },
        }
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn list_models(&self) -> Result<Vec<ListedModel>, GenerationError> {
        let url = format!("{}/models", self.base_url);
        let mut listed = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_LISTING_PAGES {
            let mut query: Vec<(&str, &str)> = vec![("key", self.api_key.as_str()), ("pageSize", "100")];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }
            let response = self
                .client
                .get(&url)
                .query(&query)
                .send()
                .await
                .map_err(map_transport_error)?;

            let status = response.status().as_u16();
            if !response.status().is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(GenerationError::new(
                    FailureKind::from_status(status),
                    format!("model listing failed: HTTP {} {}", status, sanitize_message(&error_text)),
                ));
            }

            let page: ModelsResponse = response.json().await.map_err(|e| {
                GenerationError::malformed(format!("Failed to parse models response: {}", e.without_url()))
            })?;
            listed.extend(page.models.into_iter().map(|m| ListedModel {
                name: m.name,
                supported_methods: m.supported_generation_methods,
            }));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(count = listed.len(), "Listed backend models");
        Ok(listed)
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<BackendReply, GenerationError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&Self::request_body(prompt, options))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_retry_after);
        let body = response.text().await.map_err(map_transport_error)?;

        Ok(BackendReply {
            status,
            retry_after,
            body,
        })
    }

    fn backend_name(&self) -> &str {
        "gemini"
    }
}
