use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use tagflow_core::api::{first_of, AnnotationRequest, EndpointKind, RemoteClient, RemoteError};

use super::{read_json, transport_error};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// `generateContent` client for Gemini endpoints.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_base_url(http, DEFAULT_GEMINI_BASE_URL)
    }

    pub fn with_base_url(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn build_body(request: &AnnotationRequest<'_>) -> Value {
        let prompt = request.prompt;
        let safety: Vec<Value> = HARM_CATEGORIES
            .iter()
            .map(|c| json!({ "category": c, "threshold": "BLOCK_NONE" }))
            .collect();
        json!({
            "contents": [
                { "role": "user", "parts": [{ "text": prompt.system }] },
                { "role": "model", "parts": [{ "text": prompt.acknowledgment }] },
                {
                    "role": "user",
                    "parts": [
                        { "inlineData": { "mimeType": request.payload.mime_type, "data": request.payload.base64 } },
                        { "text": prompt.instruction }
                    ]
                }
            ],
            "generationConfig": { "temperature": request.endpoint.temperature },
            "safetySettings": safety,
        })
    }

    async fn call(&self, request: AnnotationRequest<'_>) -> Result<String, RemoteError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, request.endpoint.model
        );
        tracing::debug!(url = %url, "generateContent request");

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &request.endpoint.api_key)
            .json(&Self::build_body(&request))
            .send()
            .await
            .map_err(transport_error)?;

        let value = read_json(resp).await?;
        Ok(candidate_text(&value))
    }
}

/// Concatenated text parts of the first candidate; empty when the response
/// carries none (e.g. blocked output).
fn candidate_text(value: &Value) -> String {
    value
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}

#[async_trait]
impl RemoteClient for GeminiClient {
    fn kind(&self) -> EndpointKind {
        EndpointKind::Gemini
    }

    async fn send(
        &self,
        request: AnnotationRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<String, RemoteError> {
        first_of(self.call(request), cancel).await
    }
}
