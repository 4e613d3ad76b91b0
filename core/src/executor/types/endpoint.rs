use serde::{Deserialize, Serialize};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Transport used to reach an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    /// Google generative language API, multi-turn `generateContent`.
    Gemini,
    /// Any `/chat/completions` compatible HTTP service.
    #[serde(alias = "openai_compatible")]
    Openai,
}

impl EndpointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Openai => "openai",
        }
    }
}

impl std::fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured remote annotation target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: String,

    #[serde(default)]
    pub name: String,

    pub kind: EndpointKind,

    #[serde(default)]
    pub api_key: String,

    pub model: String,

    /// Only used by [`EndpointKind::Openai`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_true")]
    pub active: bool,

    /// Soft exclusion that keeps the rest of the configuration intact.
    #[serde(default)]
    pub disabled: bool,
}

fn default_temperature() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

impl Endpoint {
    pub fn new(id: impl Into<String>, kind: EndpointKind, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind,
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            temperature: default_temperature(),
            active: true,
            disabled: false,
        }
    }

    /// Eligible for dispatch iff active, not disabled and holding a credential.
    pub fn is_eligible(&self) -> bool {
        self.active && !self.disabled && !self.api_key.trim().is_empty()
    }

    /// Base URL with trailing slashes removed, falling back to the public
    /// OpenAI API.
    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .as_deref()
            .map(|u| u.trim().trim_end_matches('/'))
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_OPENAI_BASE_URL)
            .to_string()
    }

    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}
