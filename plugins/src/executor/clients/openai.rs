use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use tagflow_core::api::{AnnotationRequest, EndpointKind, RemoteClient, RemoteError};

use super::{read_json, transport_error};

const MAX_TOKENS: u32 = 1024;

/// Chat-completions client for OpenAI-compatible gateways.
pub struct OpenAiClient {
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    fn build_body(request: &AnnotationRequest<'_>) -> Value {
        let prompt = request.prompt;
        json!({
            "model": request.endpoint.model,
            "messages": [
                { "role": "user", "content": prompt.system },
                { "role": "assistant", "content": prompt.acknowledgment },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": prompt.instruction },
                        { "type": "image_url", "image_url": { "url": request.payload.data_url() } }
                    ]
                }
            ],
            "max_tokens": MAX_TOKENS,
            "temperature": request.endpoint.temperature,
        })
    }

    async fn call(&self, request: AnnotationRequest<'_>) -> Result<String, RemoteError> {
        let url = format!("{}/chat/completions", request.endpoint.resolved_base_url());
        tracing::debug!(url = %url, model = %request.endpoint.model, "chat completion request");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&request.endpoint.api_key)
            .json(&Self::build_body(&request))
            .send()
            .await
            .map_err(transport_error)?;

        let value = read_json(resp).await?;
        Ok(value
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}

#[async_trait]
impl RemoteClient for OpenAiClient {
    fn kind(&self) -> EndpointKind {
        EndpointKind::Openai
    }

    async fn send(
        &self,
        request: AnnotationRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<String, RemoteError> {
        if cancel.is_cancelled() {
            return Err(RemoteError::Cancelled);
        }
        // Dropping the request future aborts the connection.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RemoteError::Cancelled),
            res = self.call(request) => res,
        }
    }
}
