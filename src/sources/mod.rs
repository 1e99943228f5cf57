//! Routing data sources.
//!
//! This module defines the `Source` trait that abstracts route server
//! backends, allowing the looking glass to query birdwatcher, GoBGP and
//! BioRIS route servers through one interface.

pub mod bioris;
pub mod birdwatcher;
pub mod gobgp;

use async_trait::async_trait;

use crate::api::{NeighboursResponse, NeighboursStatusResponse, RoutesResponse, StatusResponse};
use crate::LgError;

/// The `Source` trait defines the interface of a route server backend.
///
/// Operations are independent of each other. Remote failures are returned as
/// [LgError] values carrying a description of the failed operation;
/// categories a backend cannot provide are returned as empty results.
#[async_trait]
pub trait Source: Send + Sync {
    /// Get health and version information of the route server.
    async fn status(&self) -> Result<StatusResponse, LgError>;

    /// Get all neighbours with their route counters.
    async fn neighbours(&self) -> Result<NeighboursResponse, LgError>;

    /// Get the session state of all neighbours.
    async fn neighbours_status(&self) -> Result<NeighboursStatusResponse, LgError>;

    /// Get all routes of a neighbour, partitioned by acceptance category.
    async fn routes(&self, neighbour_id: &str) -> Result<RoutesResponse, LgError>;

    /// Get the routes received from a neighbour.
    async fn routes_received(&self, neighbour_id: &str) -> Result<RoutesResponse, LgError>;

    /// Get the routes of a neighbour rejected by the import filter.
    async fn routes_filtered(&self, neighbour_id: &str) -> Result<RoutesResponse, LgError>;

    /// Get the routes of a neighbour not exported to other neighbours.
    async fn routes_not_exported(&self, neighbour_id: &str) -> Result<RoutesResponse, LgError>;

    /// Get all routes known to the route server.
    async fn all_routes(&self) -> Result<RoutesResponse, LgError>;

    /// Drop expired cache entries, returning the number of removed entries.
    fn expire_caches(&self) -> usize;
}
