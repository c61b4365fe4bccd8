//! Client configuration types and constants.

use crate::error::ClientError;
use crate::user_agent::{default_user_agent, UserAgent};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default timeout for a single REST request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
/// Default number of extra attempts after a transient transport failure.
pub const DEFAULT_RETRY_COUNT: u32 = 2;
/// Client certificate file expected inside a certificate directory.
pub const CERTIFICATE_FILE: &str = "node.crt.pem";
/// Client private key file expected inside a certificate directory.
pub const PRIVATE_KEY_FILE: &str = "node.key.pem";

/// Configuration used to build a client.
#[derive(Debug, Clone)]
pub struct ClientConfiguration {
    /// Timeout applied to every request.
    pub timeout: Duration,
    /// Extra attempts after connect or timeout failures. Status errors are never retried.
    pub retry_count: u32,
    /// Directory holding the client TLS identity for secured nodes.
    pub certificate_directory: Option<PathBuf>,
    /// User agent advertised on every request.
    pub user_agent: UserAgent,
}

impl Default for ClientConfiguration {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_REQUEST_TIMEOUT,
            retry_count: DEFAULT_RETRY_COUNT,
            certificate_directory: None,
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfiguration {
    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how many times a transient failure is retried.
    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// Use the TLS identity found in `directory`.
    ///
    /// The directory must contain [`CERTIFICATE_FILE`] and [`PRIVATE_KEY_FILE`].
    pub fn with_certificate_directory<P: Into<PathBuf>>(mut self, directory: P) -> Self {
        self.certificate_directory = Some(directory.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: UserAgent) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Build the HTTP client shared by every node client created from this configuration.
    pub fn build_http_client(&self) -> Result<reqwest::Client, ClientError> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str());

        if let Some(directory) = &self.certificate_directory {
            let identity = load_identity(directory)?;
            // Node certificates are self-signed by the node's CA.
            builder = builder
                .identity(identity)
                .danger_accept_invalid_certs(true);
        }

        builder.build().map_err(ClientError::Http)
    }
}

fn load_identity(directory: &Path) -> Result<reqwest::Identity, ClientError> {
    let mut pem = fs::read(directory.join(CERTIFICATE_FILE)).map_err(ClientError::Certificate)?;
    pem.push(b'\n');
    pem.extend(fs::read(directory.join(PRIVATE_KEY_FILE)).map_err(ClientError::Certificate)?);
    reqwest::Identity::from_pem(&pem).map_err(ClientError::Http)
}

impl fmt::Display for ClientConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ClientConfiguration {{ timeout: {:?}, retries: {}, user_agent: \"{}\", certificates: {} }}",
            self.timeout,
            self.retry_count,
            self.user_agent,
            match &self.certificate_directory {
                Some(directory) => directory.display().to_string(),
                None => "none".to_string(),
            }
        )
    }
}
