//! Configuration of birdwatcher (BIRD HTTP API) sources.
//!
//! The birdwatcher client itself lives outside of this crate and is plugged
//! into the registry with [SourceRegistry::with_birdwatcher](crate::SourceRegistry::with_birdwatcher).
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use tracing::info;

use crate::ini::Section;
use crate::LgError;

const DEFAULT_TIMEZONE: &str = "UTC";
const DEFAULT_SERVER_TIME: &str = "%Y-%m-%dT%H:%M:%S%.f%:z";
const DEFAULT_SERVER_TIME_SHORT: &str = "%Y-%m-%d";
const DEFAULT_SERVER_TIME_EXT: &str = "%a, %d %b %Y %H:%M:%S %z";
const DEFAULT_PEER_TABLE_PREFIX: &str = "T";
const DEFAULT_PIPE_PROTOCOL_PREFIX: &str = "M";

/// How BIRD keeps its routing tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableType {
    /// all peers share the master table
    SingleTable,
    /// one table per peer, connected to the master table through pipes
    MultiTable,
}

impl FromStr for TableType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single_table" => Ok(TableType::SingleTable),
            "multi_table" => Ok(TableType::MultiTable),
            other => Err(format!("unknown birdwatcher type: {:?}", other)),
        }
    }
}

impl Display for TableType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TableType::SingleTable => write!(f, "single_table"),
            TableType::MultiTable => write!(f, "multi_table"),
        }
    }
}

/// Birdwatcher source settings.
///
/// Time formats are chrono format strings matching what birdwatcher
/// renders for server time, short dates and extended (RFC 2822) dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BirdwatcherConfig {
    pub id: String,
    pub name: String,

    pub api: String,
    pub timezone: String,
    pub server_time: String,
    pub server_time_short: String,
    pub server_time_ext: String,

    pub table_type: TableType,
    pub peer_table_prefix: String,
    pub pipe_protocol_prefix: String,
}

impl BirdwatcherConfig {
    pub fn from_section(id: &str, name: &str, section: &Section) -> Result<Self, LgError> {
        let table_type = section
            .get_or("type", "")
            .parse::<TableType>()
            .map_err(|reason| LgError::InvalidBackendConfig {
                section: section.name().to_string(),
                reason,
            })?;

        let config = Self {
            id: id.to_string(),
            name: name.to_string(),
            api: section.get_or("api", ""),
            timezone: section.get_or("timezone", DEFAULT_TIMEZONE),
            server_time: section.get_or("servertime", DEFAULT_SERVER_TIME),
            server_time_short: section.get_or("servertime_short", DEFAULT_SERVER_TIME_SHORT),
            server_time_ext: section.get_or("servertime_ext", DEFAULT_SERVER_TIME_EXT),
            table_type,
            peer_table_prefix: section.get_or("peer_table_prefix", DEFAULT_PEER_TABLE_PREFIX),
            pipe_protocol_prefix: section
                .get_or("pipe_protocol_prefix", DEFAULT_PIPE_PROTOCOL_PREFIX),
        };

        info!(
            "adding birdwatcher source {} of type {} with peer_table_prefix {} and pipe_protocol_prefix {}",
            config.id, config.table_type, config.peer_table_prefix, config.pipe_protocol_prefix
        );
        Ok(config)
    }
}
