use std::time::Duration;

use crate::ini::Section;
use crate::LgError;

/// Default deadline for a single BioRIS operation.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Connection settings of a BioRIS routing information service.
///
/// Section keys: `api` (host:port of the gRPC service), `router`, `vrf_id`
/// and `timeout` (seconds).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BioRisConfig {
    pub id: String,
    pub name: String,

    pub api: String,
    pub router: String,
    pub vrf_id: u64,
    pub timeout: Duration,
}

impl Default for BioRisConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            api: String::new(),
            router: String::new(),
            vrf_id: 0,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl BioRisConfig {
    pub fn from_section(id: &str, name: &str, section: &Section) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            api: section.get_or("api", ""),
            router: section.get_or("router", ""),
            vrf_id: section.parse_or("vrf_id", 0),
            timeout: Duration::from_secs(section.parse_or("timeout", DEFAULT_TIMEOUT_SECS)),
        }
    }

    /// Check that the required fields are set.
    pub fn verify(&self) -> Result<(), LgError> {
        let reason = if self.api.is_empty() {
            "missing api configuration"
        } else if self.router.is_empty() {
            "a router needs to be specified"
        } else {
            return Ok(());
        };
        Err(LgError::InvalidBackendConfig {
            section: format!("source:{}.bioris", self.id),
            reason: reason.to_string(),
        })
    }
}
