use looking_glass_sources::api::{Neighbour, NeighbourStatus, Route};
use looking_glass_sources::SourceConfig;
use serde::Serialize;

#[derive(Serialize, tabled::Tabled)]
pub struct SourceRow {
    pub order: usize,
    pub id: String,
    pub name: String,
    pub group: String,
    pub backend: String,
}

impl From<&SourceConfig> for SourceRow {
    fn from(source: &SourceConfig) -> Self {
        SourceRow {
            order: source.order,
            id: source.id.clone(),
            name: source.name.clone(),
            group: source.group.clone().unwrap_or_default(),
            backend: source.backend.kind().as_str().to_string(),
        }
    }
}

#[derive(Serialize, tabled::Tabled)]
pub struct NeighbourRow {
    pub address: String,
    pub asn: u32,
    pub state: String,
    pub uptime: String,
    pub received: u64,
    pub exported: u64,
    pub description: String,
}

impl From<&Neighbour> for NeighbourRow {
    fn from(neighbour: &Neighbour) -> Self {
        NeighbourRow {
            address: neighbour.address.clone(),
            asn: neighbour.asn,
            state: neighbour.state.clone(),
            uptime: format_uptime(neighbour.uptime),
            received: neighbour.routes_received,
            exported: neighbour.routes_exported,
            description: neighbour.description.clone(),
        }
    }
}

#[derive(Serialize, tabled::Tabled)]
pub struct NeighbourStatusRow {
    pub id: String,
    pub state: String,
    pub since: String,
}

impl From<&NeighbourStatus> for NeighbourStatusRow {
    fn from(status: &NeighbourStatus) -> Self {
        NeighbourStatusRow {
            id: status.id.clone(),
            state: status.state.clone(),
            since: format_uptime(status.since),
        }
    }
}

#[derive(Serialize, tabled::Tabled)]
pub struct RouteRow {
    pub network: String,
    pub neighbour: String,
    pub next_hop: String,
    pub as_path: String,
    pub local_pref: u32,
    pub med: u32,
}

impl From<&Route> for RouteRow {
    fn from(route: &Route) -> Self {
        RouteRow {
            network: route.network.clone(),
            neighbour: route.neighbour_id.clone().unwrap_or_default(),
            next_hop: route.bgp.next_hop.clone(),
            as_path: route
                .bgp
                .as_path
                .iter()
                .map(|asn| asn.to_string())
                .collect::<Vec<_>>()
                .join(" "),
            local_pref: route.bgp.local_pref,
            med: route.bgp.med,
        }
    }
}

/// Render a duration rounded to whole seconds.
fn format_uptime(uptime: std::time::Duration) -> String {
    let secs = std::time::Duration::from_secs(uptime.as_secs());
    humantime::format_duration(secs).to_string()
}
