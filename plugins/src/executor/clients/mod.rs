//! Remote annotation clients, one per endpoint kind.

mod gemini;
mod openai;

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tagflow_core::api::{RemoteClient, RemoteError};

pub use gemini::{GeminiClient, DEFAULT_GEMINI_BASE_URL};
pub use openai::OpenAiClient;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared HTTP client. Only the connect phase is bounded; a request runs
/// until it completes or is cancelled.
pub fn http_client() -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()?)
}

/// One client for every endpoint kind, sharing a connection pool.
pub fn default_clients() -> anyhow::Result<Vec<Arc<dyn RemoteClient>>> {
    let http = http_client()?;
    Ok(vec![
        Arc::new(GeminiClient::new(http.clone())),
        Arc::new(OpenAiClient::new(http)),
    ])
}

fn transport_error(err: reqwest::Error) -> RemoteError {
    let kind = if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connect"
    } else if err.is_body() {
        "body"
    } else {
        "request"
    };
    RemoteError::Transport(format!("{kind}: {err}"))
}

/// Non-2xx becomes a classified [`RemoteError`]; 2xx is decoded as JSON.
async fn read_json(resp: reqwest::Response) -> Result<Value, RemoteError> {
    let status = resp.status();
    let body = resp.text().await.map_err(transport_error)?;

    if !status.is_success() {
        return Err(RemoteError::from_status(status.as_u16(), &body));
    }

    serde_json::from_str::<Value>(&body).map_err(|e| RemoteError::Decode(e.to_string()))
}
