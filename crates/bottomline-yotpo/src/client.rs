//! HTTP client for the Yotpo `bottom_lines` endpoint.
//!
//! Wraps `reqwest` with credential handling, URL construction, and typed
//! page deserialization. A single call fetches a single page; pagination is
//! driven by the caller.

use std::time::Duration;

use bottomline_core::{AppConfig, Credentials, RatingPage};
use reqwest::{Client, Url};

use crate::error::ProviderError;
use crate::normalize::normalize_page;
use crate::retry::retry_with_backoff;
use crate::types::BottomLinesEnvelope;

const DEFAULT_BASE_URL: &str = "https://api.yotpo.com/v1/";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_USER_AGENT: &str = "bottomline/0.1 (ratings-import)";

/// Client for the Yotpo bottomlines API.
///
/// Use [`YotpoClient::new`] for production or [`YotpoClient::with_base_url`]
/// to point at a mock server in tests. Retries are off unless enabled with
/// [`YotpoClient::with_retries`].
pub struct YotpoClient {
    client: Client,
    credentials: Credentials,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl std::fmt::Debug for YotpoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YotpoClient")
            .field("credentials", &self.credentials)
            .field("base_url", &self.base_url.as_str())
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl YotpoClient {
    /// Creates a client pointed at the production Yotpo API with the default
    /// 10-second timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(credentials: Credentials) -> Result<Self, ProviderError> {
        Self::with_base_url(
            credentials,
            DEFAULT_TIMEOUT_SECS,
            DEFAULT_USER_AGENT,
            DEFAULT_BASE_URL,
        )
    }

    /// Creates a client from process configuration, including retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built, or
    /// [`ProviderError::InvalidBaseUrl`] if `YOTPO_BASE_URL` is not a URL.
    pub fn from_config(config: &AppConfig, credentials: Credentials) -> Result<Self, ProviderError> {
        Ok(Self::with_base_url(
            credentials,
            config.yotpo_request_timeout_secs,
            &config.yotpo_user_agent,
            &config.yotpo_base_url,
        )?
        .with_retries(config.yotpo_max_retries, config.yotpo_retry_backoff_base_ms))
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ProviderError::InvalidBaseUrl`] if
    /// `base_url` cannot carry a path.
    pub fn with_base_url(
        credentials: Credentials,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .user_agent(user_agent)
            .build()?;

        // Normalise to exactly one trailing slash so path segments append
        // below the base path rather than replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| ProviderError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ProviderError::InvalidBaseUrl {
                base_url: base_url.to_owned(),
                reason: "URL cannot carry a path".to_owned(),
            });
        }

        Ok(Self {
            client,
            credentials,
            base_url: parsed,
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    /// Enables bounded retries on timeouts, connect failures, and 5xx
    /// responses. `max_retries = 0` disables retrying.
    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Fetches one page of bottomlines.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::Http`] on network failure or timeout.
    /// - [`ProviderError::UnexpectedStatus`] on a non-2xx response.
    /// - [`ProviderError::Deserialize`] if the body is not a
    ///   `response.bottomlines` envelope.
    pub async fn fetch_page(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<RatingPage, ProviderError> {
        let url = self.bottom_lines_url(page_number, page_size)?;

        let envelope = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.request_page(&url, page_number)
        })
        .await?;

        Ok(normalize_page(envelope, page_size))
    }

    async fn request_page(
        &self,
        url: &Url,
        page_number: u32,
    ) -> Result<BottomLinesEnvelope, ProviderError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::UnexpectedStatus {
                status: status.as_u16(),
                endpoint: redact(url),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ProviderError::Deserialize {
            context: format!("bottom_lines(page={page_number})"),
            source: e,
        })
    }

    /// Builds `<base>/apps/{app_key}/bottom_lines?count=&page=&utoken=` with
    /// every component percent-encoded.
    fn bottom_lines_url(&self, page_number: u32, page_size: u32) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ProviderError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: "URL cannot carry a path".to_owned(),
            })?
            .pop_if_empty()
            .push("apps")
            .push(&self.credentials.app_key)
            .push("bottom_lines");
        url.query_pairs_mut()
            .append_pair("count", &page_size.to_string())
            .append_pair("page", &page_number.to_string())
            .append_pair("utoken", &self.credentials.secret);
        Ok(url)
    }
}

/// Renders `url` with the access token masked.
fn redact(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if k == "utoken" {
                "[redacted]".to_owned()
            } else {
                v.into_owned()
            };
            (k.into_owned(), value)
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
