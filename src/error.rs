use thiserror::Error;

/// Failure modes for a single share-link resolution attempt. Every variant
/// is terminal for the attempt; retry, if any, belongs to the caller.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no url found in input text")]
    NoUrlFound,
    #[error("upstream request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("parse api returned status {0}")]
    Api(i64),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("decoded payload carries no media url")]
    NoMediaFound,
}

/// A decoding layer handed invalid input to the next one.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid base64 after alphabet translation: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("xor produced invalid code point {0:#x}")]
    CodePoint(u32),
    #[error("iv must be 16 bytes, got {0}")]
    IvLength(usize),
    #[error("aes padding validation failed")]
    Padding,
    #[error("plaintext is not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("plaintext is not json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("encrypted response is missing {0}")]
    MissingField(&'static str),
}

/// Errors from the plain HTTP service clients (mailbox, scheduler, article
/// scraping).
#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    Malformed(String),
}
