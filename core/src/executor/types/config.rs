use serde::{Deserialize, Serialize};

use super::endpoint::Endpoint;

/// Everything a batch run reads from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of parallel workers; 1 means strictly serial.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub compression: CompressionConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub prompt: PromptConfig,

    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

fn default_concurrency() -> usize {
    1
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            retry: RetryConfig::default(),
            compression: CompressionConfig::default(),
            validation: ValidationConfig::default(),
            prompt: PromptConfig::default(),
            endpoints: Vec::new(),
        }
    }
}

impl RunConfig {
    pub fn eligible_endpoints(&self) -> Vec<Endpoint> {
        self.endpoints
            .iter()
            .filter(|e| e.is_eligible())
            .cloned()
            .collect()
    }

    /// Clamp values into their valid ranges.
    pub fn normalize(&mut self) {
        self.concurrency = self.concurrency.max(1);
        self.retry.max_attempts = self.retry.max_attempts.max(1);
        self.compression.quality = self.compression.quality.clamp(0.01, 1.0);
        self.compression.max_dimension = self.compression.max_dimension.max(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RetryStrategyKind {
    /// Constant `interval_ms` between attempts.
    #[default]
    Fixed,
    Linear,
    ExponentialBackoff,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_retry_enabled")]
    pub enabled: bool,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default)]
    pub strategy: RetryStrategyKind,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_retry_enabled() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_interval_ms() -> u64 {
    2000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_retry_enabled(),
            max_attempts: default_max_attempts(),
            interval_ms: default_interval_ms(),
            strategy: RetryStrategyKind::default(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn effective_max_attempts(&self) -> u32 {
        if self.enabled {
            self.max_attempts.max(1)
        } else {
            1
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    #[serde(default = "default_compression_enabled")]
    pub enabled: bool,
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: f64,
    /// Longest edge after scaling, in pixels.
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    /// Lossy encoder quality in `0.0..=1.0`.
    #[serde(default = "default_quality")]
    pub quality: f32,
}

fn default_compression_enabled() -> bool {
    true
}

fn default_max_size_mb() -> f64 {
    3.5
}

fn default_max_dimension() -> u32 {
    2048
}

fn default_quality() -> f32 {
    0.85
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: default_compression_enabled(),
            max_size_mb: default_max_size_mb(),
            max_dimension: default_max_dimension(),
            quality: default_quality(),
        }
    }
}

impl CompressionConfig {
    pub fn max_size_bytes(&self) -> u64 {
        (self.max_size_mb.max(0.0) * 1024.0 * 1024.0) as u64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_validation_enabled")]
    pub enabled: bool,
    /// Results whose length is at or below this are rejected.
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
}

fn default_validation_enabled() -> bool {
    true
}

fn default_min_chars() -> usize {
    20
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: default_validation_enabled(),
            min_chars: default_min_chars(),
        }
    }
}

/// Three-stage prompt: system framing, the modeled acknowledgment, and the
/// final instruction that travels with the image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default = "default_system_prompt")]
    pub system: String,
    #[serde(default = "default_ack_prompt")]
    pub acknowledgment: String,
    #[serde(default = "default_instruction_prompt")]
    pub instruction: String,
}

fn default_system_prompt() -> String {
    "You are a professional image tagging AI. Your task is to produce detailed, high quality tags for the provided image. Output comma separated values only.".to_string()
}

fn default_ack_prompt() -> String {
    "Understood. I will act as a professional image tagging AI and reply with comma separated tags for the image you provide. Please send the image.".to_string()
}

fn default_instruction_prompt() -> String {
    "Analyze this image and produce comprehensive tags covering subject, style, mood and technical aspects. Output only the tags, nothing else.".to_string()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system: default_system_prompt(),
            acknowledgment: default_ack_prompt(),
            instruction: default_instruction_prompt(),
        }
    }
}
