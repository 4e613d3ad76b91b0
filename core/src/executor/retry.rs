use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::{AttemptError, TaskFailure};

use super::backoff::strategy_for;
use super::traits::{
    AnnotationRequest, Payload, PreparedAsset, Preprocessor, RemoteClient, FALLBACK_MIME_TYPE,
};
use super::types::{Endpoint, RunConfig, ValidationConfig, WorkItem};

/// Drives the attempts for one task against one endpoint.
pub struct RetryController {
    client: Arc<dyn RemoteClient>,
    preprocessor: Option<Arc<dyn Preprocessor>>,
}

impl RetryController {
    pub fn new(client: Arc<dyn RemoteClient>, preprocessor: Option<Arc<dyn Preprocessor>>) -> Self {
        Self {
            client,
            preprocessor,
        }
    }

    /// Label `item`, retrying per `config.retry`.
    ///
    /// `on_attempt` is called with the 1-based attempt number right before
    /// each request. Cancellation at any point yields [`TaskFailure::Stopped`]
    /// without further delay.
    pub async fn run<F>(
        &self,
        item: &WorkItem,
        endpoint: &Endpoint,
        config: &RunConfig,
        mut on_attempt: F,
        cancel: &CancellationToken,
    ) -> Result<String, TaskFailure>
    where
        F: FnMut(u32),
    {
        if cancel.is_cancelled() {
            return Err(TaskFailure::Stopped);
        }

        let asset = self.prepare(item, config).await;
        let payload = Payload::encode(&asset.bytes, asset.mime_type);
        let request = AnnotationRequest {
            endpoint,
            prompt: &config.prompt,
            payload: &payload,
        };

        let strategy = strategy_for(&config.retry);
        let max_attempts = strategy.max_attempts();

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                return Err(TaskFailure::Stopped);
            }
            on_attempt(attempt);

            let err = match self.client.send(request, cancel).await {
                Ok(text) => match validate(text, &config.validation) {
                    Ok(text) => return Ok(text),
                    Err(e) => e,
                },
                Err(e) => AttemptError::Remote(e),
            };

            if err.is_cancelled() || cancel.is_cancelled() {
                return Err(TaskFailure::Stopped);
            }
            if err.is_fatal() {
                tracing::warn!(task = %item.name, endpoint = %endpoint.label(), error = %err, "fatal error, not retrying");
                return Err(TaskFailure::Fatal(err.to_string()));
            }
            if !strategy.should_retry(attempt, &err) {
                tracing::warn!(task = %item.name, attempt, error = %err, "giving up");
                return Err(TaskFailure::Failed(err.to_string()));
            }

            let delay = strategy.next_delay(attempt);
            tracing::debug!(
                task = %item.name,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "retrying"
            );
            tokio::select! {
                _ = cancel.cancelled() => return Err(TaskFailure::Stopped),
                _ = tokio::time::sleep(delay) => {}
            }
        }

        Err(TaskFailure::MaxAttempts)
    }

    /// Compress when enabled; any preprocessing failure falls back to the
    /// original bytes.
    async fn prepare(&self, item: &WorkItem, config: &RunConfig) -> PreparedAsset {
        let original = || PreparedAsset {
            bytes: item.content.clone(),
            mime_type: self
                .preprocessor
                .as_ref()
                .and_then(|p| p.sniff_mime(&item.content))
                .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string()),
        };

        let Some(pre) = self.preprocessor.clone() else {
            return original();
        };
        if !config.compression.enabled {
            return original();
        }

        let content = item.content.clone();
        let policy = config.compression.clone();
        match tokio::task::spawn_blocking(move || pre.prepare(&content, &policy)).await {
            Ok(Ok(asset)) => asset,
            Ok(Err(e)) => {
                tracing::warn!(task = %item.name, error = %e, "preprocessing failed, sending original");
                original()
            }
            Err(e) => {
                tracing::warn!(task = %item.name, error = %e, "preprocessing aborted, sending original");
                original()
            }
        }
    }
}

/// Reject blank output, and output at or under the minimum length when
/// validation is on. Length counts characters, not bytes.
fn validate(text: String, policy: &ValidationConfig) -> Result<String, AttemptError> {
    if text.trim().is_empty() {
        return Err(AttemptError::EmptyResponse);
    }
    if policy.enabled {
        let len = text.chars().count();
        if len <= policy.min_chars {
            return Err(AttemptError::TooShort(len));
        }
    }
    Ok(text)
}
