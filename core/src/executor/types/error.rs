use thiserror::Error;

/// Errors raised by an asset preprocessor. The engine swallows these and
/// sends the original bytes instead.
#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("decode failed: {0}")]
    Decode(String),

    #[error("encode failed: {0}")]
    Encode(String),
}
