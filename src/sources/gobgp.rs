//! Configuration of GoBGP sources.
//!
//! The GoBGP client is supplied by the caller through
//! [SourceRegistry::with_gobgp](crate::SourceRegistry::with_gobgp).
use std::time::Duration;

use crate::ini::Section;

const DEFAULT_PROCESSING_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoBgpConfig {
    pub id: String,
    pub name: String,

    pub host: String,
    pub insecure: bool,
    pub tls_crt: String,
    pub tls_common_name: String,
    pub processing_timeout: Duration,
}

impl GoBgpConfig {
    pub fn from_section(id: &str, name: &str, section: &Section) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            host: section.get_or("host", ""),
            insecure: section.parse_or("insecure", false),
            tls_crt: section.get_or("tls_crt", ""),
            tls_common_name: section.get_or("tls_common_name", ""),
            processing_timeout: Duration::from_secs(
                section.parse_or("processing_timeout", DEFAULT_PROCESSING_TIMEOUT_SECS),
            ),
        }
    }
}
