use bytes::Bytes;

use crate::executor::types::{CompressionConfig, PreprocessError};

pub const FALLBACK_MIME_TYPE: &str = "image/jpeg";

/// Transmission-ready asset bytes.
#[derive(Debug, Clone)]
pub struct PreparedAsset {
    pub bytes: Bytes,
    pub mime_type: String,
}

/// 预处理插件（发送前压缩/缩放）
pub trait Preprocessor: Send + Sync {
    fn name(&self) -> &str;

    /// Return content unchanged when it already fits the size budget,
    /// otherwise a scaled and re-encoded copy.
    fn prepare(
        &self,
        content: &Bytes,
        policy: &CompressionConfig,
    ) -> Result<PreparedAsset, PreprocessError>;

    /// MIME type of untouched content.
    fn sniff_mime(&self, _content: &[u8]) -> Option<String> {
        None
    }
}
