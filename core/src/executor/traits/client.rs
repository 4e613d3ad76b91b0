use async_trait::async_trait;
use base64::Engine as _;
use tokio_util::sync::CancellationToken;

use crate::error::RemoteError;
use crate::executor::types::{Endpoint, EndpointKind, PromptConfig};

/// 已编码的图像载荷（每个任务编码一次，所有重试复用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub mime_type: String,
    pub base64: String,
}

impl Payload {
    pub fn encode(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            base64: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

/// One annotation request against one endpoint.
#[derive(Debug, Clone, Copy)]
pub struct AnnotationRequest<'a> {
    pub endpoint: &'a Endpoint,
    pub prompt: &'a PromptConfig,
    pub payload: &'a Payload,
}

/// 远端标注客户端插件
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Endpoint kind this client serves.
    fn kind(&self) -> EndpointKind;

    /// Perform a single request. Implementations must return
    /// [`RemoteError::Cancelled`] once `cancel` fires and never report a
    /// result that arrives afterwards.
    async fn send(
        &self,
        request: AnnotationRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<String, RemoteError>;
}
