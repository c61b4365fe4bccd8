//! Blockchain network families understood by the client.

use std::fmt;
use std::str::FromStr;

/// Symbol mainnet currency mosaic (`symbol.xym`).
pub const SYMBOL_CURRENCY_MOSAIC_ID: &str = "6BED913FA20223F8";

/// The family of a blockchain network.
///
/// Families differ in their REST layout, in how a node's funded identity is
/// found, and in whether they run a finality gadget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkFamily {
    /// NIS1 network. Harvesting nodes may be delegated ("remote") accounts.
    Nem,
    /// Symbol network with finalization.
    Symbol,
}

impl NetworkFamily {
    /// Whether nodes of this family report a finalized height.
    pub fn supports_finalization(self) -> bool {
        matches!(self, NetworkFamily::Symbol)
    }

    /// Whether a node's reported key may be a remote harvester standing in for a main account.
    pub fn has_remote_harvesters(self) -> bool {
        matches!(self, NetworkFamily::Nem)
    }

    /// REST port assumed when a host is given without one.
    pub fn default_port(self) -> u16 {
        match self {
            NetworkFamily::Nem => 7890,
            NetworkFamily::Symbol => 3000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NetworkFamily::Nem => "nem",
            NetworkFamily::Symbol => "symbol",
        }
    }
}

impl fmt::Display for NetworkFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nem" => Ok(NetworkFamily::Nem),
            "symbol" => Ok(NetworkFamily::Symbol),
            other => Err(other.to_string()),
        }
    }
}
