use thiserror::Error;

/// Failures raised while talking to the 511.org transit API.
///
/// URLs carried here are the ones built before the API key is attached.
#[derive(Debug, Error)]
pub enum TransitError {
    #[error("received non-ok status code from {url}: {status}")]
    UpstreamRequest { url: String, status: u16 },

    #[error("response from {url} is missing `{missing_path}`")]
    MalformedResponse { url: String, missing_path: String },

    #[error("invalid request url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}
