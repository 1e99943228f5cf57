//! Domain objects returned by routing data sources.
//!
//! Every response carries an [ApiStatus] envelope with version, cache and
//! time-to-live information, regardless of whether the backend caches
//! anything.
use std::fmt::{Display, Formatter};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cache information of a response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStatus {
    pub cached_at: Option<DateTime<Utc>>,
    pub orig_ttl: i64,
}

/// Envelope shared by all source responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiStatus {
    pub version: String,
    pub cache_status: CacheStatus,
    pub result_from_cache: bool,
    pub ttl: DateTime<Utc>,
}

impl ApiStatus {
    /// An envelope for an uncached result that expires at `ttl`.
    pub fn uncached(version: &str, ttl: DateTime<Utc>) -> Self {
        ApiStatus {
            version: version.to_string(),
            cache_status: CacheStatus::default(),
            result_from_cache: false,
            ttl,
        }
    }
}

/// Backend health and version information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub server_time: DateTime<Utc>,
    pub last_reboot: Option<DateTime<Utc>>,
    pub last_reconfig: Option<DateTime<Utc>>,
    pub message: String,
    pub router_id: String,
    pub version: String,
    pub backend: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub api: ApiStatus,
    pub status: Status,
}

/// A BGP peering of a route server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbour {
    pub id: String,
    pub address: String,
    pub asn: u32,
    /// normalized session state, `up` for established sessions
    pub state: String,
    pub description: String,
    pub routes_received: u64,
    pub routes_filtered: u64,
    pub routes_exported: u64,
    pub routes_preferred: u64,
    pub routes_accepted: u64,
    pub uptime: Duration,
    pub last_error: String,
    #[serde(rename = "routeserver_id")]
    pub route_server_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighboursResponse {
    pub api: ApiStatus,
    pub neighbours: Vec<Neighbour>,
}

/// Session state of a neighbour without route counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighbourStatus {
    pub id: String,
    pub state: String,
    pub since: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighboursStatusResponse {
    pub api: ApiStatus,
    pub neighbours: Vec<NeighbourStatus>,
}

/// Standard BGP community (RFC 1997).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Community(pub u32, pub u32);

impl From<u32> for Community {
    fn from(value: u32) -> Self {
        Community(value >> 16, value & 0xffff)
    }
}

/// Large BGP community (RFC 8092).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LargeCommunity(pub u32, pub u32, pub u32);

impl Display for LargeCommunity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.0, self.1, self.2)
    }
}

/// Extended BGP community (RFC 4360).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtCommunity(pub String, pub String, pub String);

/// BGP attributes of a route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BgpInfo {
    pub origin: String,
    pub as_path: Vec<u32>,
    pub next_hop: String,
    pub communities: Vec<Community>,
    pub large_communities: Vec<LargeCommunity>,
    pub ext_communities: Vec<ExtCommunity>,
    pub local_pref: u32,
    pub med: u32,
}

/// A route as seen by a route server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub neighbour_id: Option<String>,
    pub network: String,
    pub interface: String,
    pub gateway: String,
    pub metric: u32,
    pub bgp: BgpInfo,
    pub age: Duration,
    #[serde(rename = "type")]
    pub route_type: Vec<String>,
    pub primary: bool,
}

/// Routes of a source, partitioned by acceptance category.
///
/// Operations fill in the category they were asked for; categories a
/// backend cannot classify are empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutesResponse {
    pub api: ApiStatus,
    pub imported: Vec<Route>,
    pub filtered: Vec<Route>,
    pub not_exported: Vec<Route>,
}

impl RoutesResponse {
    pub fn new(api: ApiStatus) -> Self {
        RoutesResponse {
            api,
            imported: vec![],
            filtered: vec![],
            not_exported: vec![],
        }
    }
}
