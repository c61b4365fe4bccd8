mod configuration;
mod error;
mod model;
mod network;
mod rest;
mod user_agent;

pub use configuration::{
    ClientConfiguration, CERTIFICATE_FILE, DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRY_COUNT,
    PRIVATE_KEY_FILE,
};
pub use error::ClientError;
pub use model::{
    format_symbol_version, AccountInfo, FinalizationInfo, NodeInfo, PeerInfo,
    SYMBOL_API_ROLE, SYMBOL_REST_PORT,
};
pub use network::{NetworkFamily, SYMBOL_CURRENCY_MOSAIC_ID};
pub use rest::{Endpoint, RestClient};
pub use user_agent::{default_user_agent, UserAgent, UserAgentError};
