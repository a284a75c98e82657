//! Seams between the pipeline and the ratings provider.

use std::sync::Arc;

use async_trait::async_trait;
use bottomline_core::{AppConfig, Credentials, RatingPage};
use bottomline_yotpo::{ProviderError, YotpoClient};

/// One paginated read against the ratings provider.
#[async_trait]
pub trait RatingsSource: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ProviderError`] on transport failure, a non-2xx answer, or a
    /// body without the bottomlines envelope.
    async fn fetch_page(&self, page_number: u32, page_size: u32)
        -> Result<RatingPage, ProviderError>;
}

#[async_trait]
impl RatingsSource for YotpoClient {
    async fn fetch_page(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<RatingPage, ProviderError> {
        YotpoClient::fetch_page(self, page_number, page_size).await
    }
}

/// Builds a [`RatingsSource`] for the credentials current at run start.
///
/// Credentials are operator-editable, so the pipeline connects once per run
/// instead of holding a client for its whole lifetime.
pub trait RatingsConnector: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the client cannot be constructed.
    fn connect(&self, credentials: Credentials) -> Result<Arc<dyn RatingsSource>, ProviderError>;
}

/// Connects to the Yotpo API using process configuration.
#[derive(Debug, Clone)]
pub struct YotpoConnector {
    config: AppConfig,
}

impl YotpoConnector {
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }
}

impl RatingsConnector for YotpoConnector {
    fn connect(&self, credentials: Credentials) -> Result<Arc<dyn RatingsSource>, ProviderError> {
        Ok(Arc::new(YotpoClient::from_config(&self.config, credentials)?))
    }
}
