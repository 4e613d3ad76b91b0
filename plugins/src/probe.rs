use serde_json::Value;
use tagflow_core::api::{truncate_body, Endpoint, EndpointKind};

/// Models offered for Gemini endpoints; the service is not queried.
pub const DEFAULT_GEMINI_MODELS: &[&str] = &[
    "gemini-3-flash-preview",
    "gemini-3-pro-preview",
    "gemini-2.0-flash-exp",
    "gemini-1.5-pro",
    "gemini-1.5-flash",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub models: Vec<String>,
    /// The configured model when offered, otherwise the first one offered.
    pub selected: String,
}

/// Connectivity check: list the models an endpoint offers.
pub async fn probe_models(http: &reqwest::Client, endpoint: &Endpoint) -> anyhow::Result<ProbeReport> {
    if endpoint.api_key.trim().is_empty() {
        anyhow::bail!("endpoint {} has no API key", endpoint.label());
    }

    let models = match endpoint.kind {
        EndpointKind::Gemini => DEFAULT_GEMINI_MODELS.iter().map(|m| m.to_string()).collect(),
        EndpointKind::Openai => list_openai_models(http, endpoint).await?,
    };

    let selected = if models.iter().any(|m| m == &endpoint.model) {
        endpoint.model.clone()
    } else {
        models.first().cloned().unwrap_or_else(|| endpoint.model.clone())
    };
    Ok(ProbeReport { models, selected })
}

async fn list_openai_models(http: &reqwest::Client, endpoint: &Endpoint) -> anyhow::Result<Vec<String>> {
    let url = format!("{}/models", endpoint.resolved_base_url());
    let resp = http
        .get(&url)
        .bearer_auth(&endpoint.api_key)
        .send()
        .await?;

    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        anyhow::bail!("API error {}: {}", status.as_u16(), truncate_body(&body));
    }

    let value: Value = serde_json::from_str(&body)?;
    let models = value
        .get("data")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|m| m.get("id").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    Ok(models)
}
