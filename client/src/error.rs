//! Error types for node probing.

use std::error::Error;
use std::fmt;
use std::io;

/// Errors that can occur while talking to a node's REST API.
#[derive(Debug)]
pub enum ClientError {
    /// The request could not be sent or the response could not be read.
    ///
    /// Covers refused connections and timeouts.
    Http(reqwest::Error),
    /// The node answered with a non-success status code.
    Status { url: String, status: u16 },
    /// The node answered, but the body did not have the expected shape.
    MalformedResponse(String),
    /// The certificate directory could not be read.
    Certificate(io::Error),
    /// The host string could not be turned into an endpoint.
    InvalidHost(String),
}

impl ClientError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Http(err) => err.is_connect() || err.is_timeout(),
            _ => false,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Http(err) => write!(f, "Request failed: {err}"),
            ClientError::Status { url, status } => {
                write!(f, "Request to {url} failed with status {status}")
            }
            ClientError::MalformedResponse(reason) => {
                write!(f, "Malformed response from node: {reason}")
            }
            ClientError::Certificate(err) => {
                write!(f, "Could not load client certificate: {err}")
            }
            ClientError::InvalidHost(host) => write!(f, "Invalid node host: {host}"),
        }
    }
}

impl Error for ClientError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ClientError::Http(err) => Some(err),
            ClientError::Status { .. } => None,
            ClientError::MalformedResponse(_) => None,
            ClientError::Certificate(err) => Some(err),
            ClientError::InvalidHost(_) => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Http(err)
    }
}
