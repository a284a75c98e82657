use thiserror::Error;

/// Errors returned by the Yotpo API client.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network, TLS, or timeout failure from the underlying HTTP client.
    ///
    /// The request URL is stripped before wrapping: it carries the access token.
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("unexpected HTTP status {status} from {endpoint}")]
    UnexpectedStatus { status: u16, endpoint: String },

    /// The response body did not match the bottomlines page envelope.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{base_url}': {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Http(err.without_url())
    }
}

impl ProviderError {
    /// `true` for failures caused by the shape of the response body.
    #[must_use]
    pub fn is_schema(&self) -> bool {
        matches!(self, ProviderError::Deserialize { .. })
    }
}
