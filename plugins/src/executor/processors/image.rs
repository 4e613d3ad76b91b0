use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, ImageFormat};

use tagflow_core::api::{CompressionConfig, PreparedAsset, PreprocessError, Preprocessor};

const JPEG_MIME_TYPE: &str = "image/jpeg";

/// Downscales oversized images and re-encodes them as JPEG.
#[derive(Debug, Default)]
pub struct ImagePreprocessorPlugin;

impl ImagePreprocessorPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Preprocessor for ImagePreprocessorPlugin {
    fn name(&self) -> &str {
        "image-preprocessor"
    }

    fn prepare(
        &self,
        content: &Bytes,
        policy: &CompressionConfig,
    ) -> Result<PreparedAsset, PreprocessError> {
        if content.len() as u64 <= policy.max_size_bytes() {
            return Ok(PreparedAsset {
                bytes: content.clone(),
                mime_type: self
                    .sniff_mime(content)
                    .unwrap_or_else(|| JPEG_MIME_TYPE.to_string()),
            });
        }

        let img =
            image::load_from_memory(content).map_err(|e| PreprocessError::Decode(e.to_string()))?;
        let (width, height) = fit_within(img.width(), img.height(), policy.max_dimension);
        let img = if (width, height) != (img.width(), img.height()) {
            img.resize_exact(width, height, FilterType::Triangle)
        } else {
            img
        };

        // JPEG has no alpha channel.
        let rgb = img.to_rgb8();
        let mut out = Cursor::new(Vec::with_capacity(content.len() / 2));
        JpegEncoder::new_with_quality(&mut out, jpeg_quality(policy.quality))
            .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
            .map_err(|e| PreprocessError::Encode(e.to_string()))?;

        let bytes = Bytes::from(out.into_inner());
        tracing::debug!(
            from = content.len(),
            to = bytes.len(),
            width,
            height,
            "image compressed"
        );
        Ok(PreparedAsset {
            bytes,
            mime_type: JPEG_MIME_TYPE.to_string(),
        })
    }

    fn sniff_mime(&self, content: &[u8]) -> Option<String> {
        let mime = match image::guess_format(content).ok()? {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Tiff => "image/tiff",
            _ => return None,
        };
        Some(mime.to_string())
    }
}

/// Scale the longer side down to `max_dim`, keeping the aspect ratio.
fn fit_within(width: u32, height: u32, max_dim: u32) -> (u32, u32) {
    let max_dim = max_dim.max(1);
    if width > height {
        if width > max_dim {
            let h = (height as f64 * max_dim as f64 / width as f64).round() as u32;
            return (max_dim, h.max(1));
        }
    } else if height > max_dim {
        let w = (width as f64 * max_dim as f64 / height as f64).round() as u32;
        return (w.max(1), max_dim);
    }
    (width, height)
}

fn jpeg_quality(quality: f32) -> u8 {
    (quality.clamp(0.01, 1.0) * 100.0).round() as u8
}
