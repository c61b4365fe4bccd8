//! User agent validation for outgoing REST requests.
//!
//! Node operators see the user agent in their access logs, so it follows the
//! HTTP product token convention of `name/version`.

use std::fmt;

/// Errors that can occur during user agent validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAgentError {
    /// The user agent format is invalid (must be `name/version`).
    InvalidFormat,
    /// The name component is missing or empty.
    MissingName,
    /// The version component is missing or empty.
    MissingVersion,
}

impl fmt::Display for UserAgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserAgentError::InvalidFormat => {
                write!(f, "User agent must follow format 'name/version'")
            }
            UserAgentError::MissingName => {
                write!(f, "User agent name component cannot be empty")
            }
            UserAgentError::MissingVersion => {
                write!(f, "User agent version component cannot be empty")
            }
        }
    }
}

impl std::error::Error for UserAgentError {}

/// A validated `name/version` user agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgent(String);

impl UserAgent {
    /// Validate and wrap a user agent string.
    ///
    /// # Example
    ///
    /// ```
    /// use nodewatch_client::UserAgent;
    ///
    /// assert!(UserAgent::new("nodewatch/0.1.0").is_ok());
    /// assert!(UserAgent::new("nodewatch").is_err());
    /// ```
    pub fn new<S: Into<String>>(user_agent: S) -> Result<Self, UserAgentError> {
        let user_agent = user_agent.into();
        validate_product_token(&user_agent)?;
        Ok(UserAgent(user_agent))
    }

    /// Build a user agent from its components, which are trusted to be well formed.
    pub fn from_name_version(name: &str, version: &str) -> Self {
        UserAgent(format!("{name}/{version}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Default user agent advertised by nodewatch clients.
pub fn default_user_agent() -> UserAgent {
    UserAgent::from_name_version("nodewatch", env!("CARGO_PKG_VERSION"))
}

fn validate_product_token(user_agent: &str) -> Result<(), UserAgentError> {
    if user_agent.chars().any(char::is_whitespace) {
        return Err(UserAgentError::InvalidFormat);
    }

    let parts: Vec<&str> = user_agent.split('/').collect();
    if parts.len() != 2 {
        return Err(UserAgentError::InvalidFormat);
    }

    if parts[0].is_empty() {
        return Err(UserAgentError::MissingName);
    }

    if parts[1].is_empty() {
        return Err(UserAgentError::MissingVersion);
    }

    Ok(())
}
