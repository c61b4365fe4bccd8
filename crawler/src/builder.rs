//! Builder pattern for configuring and creating crawler instances.

use crate::client::{Connector, RestConnector};
use crate::crawler::Crawler;
use nodewatch_client::{
    ClientConfiguration, ClientError, NetworkFamily, UserAgent, UserAgentError,
    SYMBOL_CURRENCY_MOSAIC_ID,
};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default number of concurrent workers.
pub const DEFAULT_WORKER_COUNT: usize = 16;

/// Errors that can occur during crawler configuration.
#[derive(Debug)]
pub enum CrawlerBuilderError {
    /// User agent doesn't follow the required format.
    InvalidUserAgent(UserAgentError),
    /// At least one worker is needed to make progress.
    NoWorkers,
    /// The HTTP client could not be created.
    Client(ClientError),
}

impl fmt::Display for CrawlerBuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlerBuilderError::InvalidUserAgent(err) => {
                write!(f, "Invalid user agent: {err}")
            }
            CrawlerBuilderError::NoWorkers => write!(f, "Worker count must be at least 1"),
            CrawlerBuilderError::Client(err) => write!(f, "Could not create node client: {err}"),
        }
    }
}

impl std::error::Error for CrawlerBuilderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CrawlerBuilderError::InvalidUserAgent(err) => Some(err),
            CrawlerBuilderError::NoWorkers => None,
            CrawlerBuilderError::Client(err) => Some(err),
        }
    }
}

/// Builder for creating a customized [`Crawler`] instance.
///
/// # Example
///
/// ```
/// # fn main() -> Result<(), nodewatch_crawler::CrawlerBuilderError> {
/// use nodewatch_crawler::{CrawlerBuilder, NetworkFamily};
/// use std::time::Duration;
///
/// // Create a crawler for a Symbol network with default settings
/// let basic_crawler = CrawlerBuilder::new(NetworkFamily::Symbol).build()?;
///
/// // Create a crawler with custom settings
/// let custom_crawler = CrawlerBuilder::new(NetworkFamily::Nem)
///     .with_user_agent("my-crawler/1.0")?
///     .with_worker_count(4)
///     .with_timeout(Duration::from_secs(5))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CrawlerBuilder {
    /// Network family the crawler will operate on.
    network: NetworkFamily,
    /// Configuration for every node client.
    client_configuration: ClientConfiguration,
    /// Mosaic reported as the Symbol account balance.
    currency_mosaic_id: String,
    /// Number of concurrent workers.
    worker_count: usize,
}

impl CrawlerBuilder {
    /// Create a new crawler builder for the specified network family.
    pub fn new(network: NetworkFamily) -> Self {
        CrawlerBuilder {
            network,
            client_configuration: ClientConfiguration::default(),
            currency_mosaic_id: SYMBOL_CURRENCY_MOSAIC_ID.to_string(),
            worker_count: DEFAULT_WORKER_COUNT,
        }
    }

    /// Set a custom user agent string for the crawler.
    ///
    /// It must follow the `name/version` convention.
    pub fn with_user_agent<S: Into<String>>(
        mut self,
        user_agent: S,
    ) -> Result<Self, CrawlerBuilderError> {
        let user_agent =
            UserAgent::new(user_agent.into()).map_err(CrawlerBuilderError::InvalidUserAgent)?;
        self.client_configuration = self.client_configuration.with_user_agent(user_agent);
        Ok(self)
    }

    /// Set the number of concurrent workers.
    ///
    /// Each worker probes one node at a time, so this bounds the number of
    /// nodes being probed simultaneously. Defaults to 16.
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the timeout for every request made to a node.
    ///
    /// Defaults to 20 seconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client_configuration = self.client_configuration.with_timeout(timeout);
        self
    }

    /// Use the client certificate in `directory` for nodes requiring TLS.
    pub fn with_certificate_directory<P: Into<PathBuf>>(mut self, directory: P) -> Self {
        self.client_configuration = self
            .client_configuration
            .with_certificate_directory(directory);
        self
    }

    /// Replace the whole client configuration.
    pub fn with_client_configuration(mut self, configuration: ClientConfiguration) -> Self {
        self.client_configuration = configuration;
        self
    }

    /// Set the mosaic whose amount is reported as a Symbol account balance.
    pub fn with_currency_mosaic_id<S: Into<String>>(mut self, mosaic_id: S) -> Self {
        self.currency_mosaic_id = mosaic_id.into();
        self
    }

    /// Build a crawler talking to nodes over REST.
    pub fn build(self) -> Result<Crawler<RestConnector>, CrawlerBuilderError> {
        let connector = RestConnector::new(
            self.network,
            &self.client_configuration,
            &self.currency_mosaic_id,
        )
        .map_err(CrawlerBuilderError::Client)?;
        self.build_with_connector(connector)
    }

    /// Build a crawler using a custom [`Connector`].
    pub fn build_with_connector<K: Connector>(
        self,
        connector: K,
    ) -> Result<Crawler<K>, CrawlerBuilderError> {
        if self.worker_count == 0 {
            return Err(CrawlerBuilderError::NoWorkers);
        }

        Ok(Crawler::new(connector, self.worker_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let crawler = CrawlerBuilder::new(NetworkFamily::Symbol).build().unwrap();
        assert_eq!(crawler.worker_count(), DEFAULT_WORKER_COUNT);
    }

    #[test]
    fn test_invalid_user_agent() {
        let result = CrawlerBuilder::new(NetworkFamily::Symbol).with_user_agent("no version");
        assert!(matches!(
            result,
            Err(CrawlerBuilderError::InvalidUserAgent(_))
        ));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = CrawlerBuilder::new(NetworkFamily::Nem)
            .with_worker_count(0)
            .build();
        assert!(matches!(result, Err(CrawlerBuilderError::NoWorkers)));
    }

    #[test]
    fn test_missing_certificates_fail_build() {
        let directory = tempfile::tempdir().unwrap();
        let result = CrawlerBuilder::new(NetworkFamily::Symbol)
            .with_certificate_directory(directory.path())
            .build();
        assert!(matches!(result, Err(CrawlerBuilderError::Client(_))));
    }
}
