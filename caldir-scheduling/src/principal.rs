//! Calendar user address resolution.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SchedulingError, SchedulingResult};

/// A principal known to this server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    /// Principal URL, the identity compared against a calendar's owner
    pub url: String,
    /// Calendar user addresses (e.g. `mailto:`, `urn:uuid:`)
    pub addresses: Vec<String>,
    /// Calendar home collection
    pub home_url: String,
}

impl Principal {
    pub fn has_address(&self, address: &str) -> bool {
        self.addresses.iter().any(|a| a == address)
    }
}

/// Resolves calendar user addresses to principals.
pub trait Directory: Send + Sync {
    fn principal_for_address(&self, address: &str) -> Option<Principal>;
}

/// Directory backed by a fixed list of principals, loadable from TOML:
///
/// ```toml
/// [[principal]]
/// url = "/principals/users/olivia/"
/// addresses = ["mailto:olivia@example.com"]
/// home_url = "/calendars/users/olivia/"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryDirectory {
    #[serde(default, rename = "principal")]
    pub principals: Vec<Principal>,
}

impl InMemoryDirectory {
    pub fn new(principals: Vec<Principal>) -> Self {
        InMemoryDirectory { principals }
    }

    pub fn from_toml(content: &str) -> SchedulingResult<Self> {
        toml::from_str(content).map_err(|e| SchedulingError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> SchedulingResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

impl Directory for InMemoryDirectory {
    fn principal_for_address(&self, address: &str) -> Option<Principal> {
        self.principals
            .iter()
            .find(|p| p.has_address(address))
            .cloned()
    }
}
