//! BioRIS routing information service adapter.
//!
//! Neighbours are read with the unary `GetNeighbors` call, routes are dumped
//! per address family with the server streaming `DumpRIB` call. The gRPC
//! channel is created on first use and reused until a call reports the
//! service as unavailable, after which the next call reconnects.
mod config;

use std::future::Future;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, info, warn};

use crate::api::{
    self, ApiStatus, BgpInfo, Community, LargeCommunity, Neighbour, NeighbourStatus,
    NeighboursResponse, NeighboursStatusResponse, Route, RoutesResponse, StatusResponse,
};
use crate::sources::Source;
use crate::LgError;

pub use config::BioRisConfig;

/// Generated BioRIS protocol types.
pub mod proto {
    pub mod bio {
        pub mod net {
            tonic::include_proto!("bio.net");
        }
        pub mod route {
            tonic::include_proto!("bio.route");
        }
        pub mod ris {
            tonic::include_proto!("bio.ris");
        }
    }
}

use proto::bio::net::{ip, Ip, Prefix};
use proto::bio::ris::dump_rib_request::AfiSafi;
use proto::bio::ris::routing_information_service_client::RoutingInformationServiceClient;
use proto::bio::ris::{bgp_neighbor, BgpNeighbor, DumpRibRequest, GetNeighborsRequest};
use proto::bio::route::{path, BgpPath};

const API_VERSION: &str = "v0.1.0";
const BACKEND: &str = "BioRIS";

/// Lifetime of an uncached non-route response.
const RESPONSE_TTL_SECS: i64 = 60;

/// Address families dumped for a route query, in result order.
const ADDRESS_FAMILIES: [AfiSafi; 2] = [AfiSafi::Ipv4Unicast, AfiSafi::Ipv6Unicast];

/// Observable state of the connection to the routing information service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// no channel, the next call dials
    Unconnected,
    /// channel in use
    Connected,
    /// the last call found the service unavailable, the next call redials
    Stale,
}

enum Connection {
    Unconnected,
    Connected(Channel),
    Stale(Channel),
}

/// A BioRIS route server source.
pub struct BioRis {
    config: BioRisConfig,
    connection: Mutex<Connection>,
}

impl BioRis {
    /// Create a new source. No connection is made until the first call.
    pub fn new(config: BioRisConfig) -> Self {
        info!(
            "initializing BioRIS source {}: api {}, router {}",
            config.id, config.api, config.router
        );
        BioRis {
            config,
            connection: Mutex::new(Connection::Unconnected),
        }
    }

    pub fn config(&self) -> &BioRisConfig {
        &self.config
    }

    pub fn connection_state(&self) -> ConnectionState {
        match *self.connection.lock() {
            Connection::Unconnected => ConnectionState::Unconnected,
            Connection::Connected(_) => ConnectionState::Connected,
            Connection::Stale(_) => ConnectionState::Stale,
        }
    }

    /// Get a client for the current channel, dialing if needed.
    fn client(&self) -> Result<RoutingInformationServiceClient<Channel>, LgError> {
        let mut connection = self.connection.lock();

        if let Connection::Connected(channel) = &*connection {
            return Ok(RoutingInformationServiceClient::new(channel.clone()));
        }
        if let Connection::Stale(_) = &*connection {
            debug!("closing stale connection to {}", self.config.api);
            *connection = Connection::Unconnected;
        }

        let channel = self.dial()?;
        *connection = Connection::Connected(channel.clone());
        Ok(RoutingInformationServiceClient::new(channel))
    }

    fn dial(&self) -> Result<Channel, LgError> {
        let uri = if self.config.api.contains("://") {
            self.config.api.clone()
        } else {
            format!("http://{}", self.config.api)
        };
        debug!("connecting to BioRIS at {}", uri);

        let endpoint = Endpoint::from_shared(uri)
            .map_err(|e| LgError::ConnectError {
                context: format!("could not connect to api {}", self.config.api),
                source: e,
            })?
            .connect_timeout(self.config.timeout);
        Ok(endpoint.connect_lazy())
    }

    fn mark_stale(&self) {
        let mut connection = self.connection.lock();
        let current = std::mem::replace(&mut *connection, Connection::Unconnected);
        *connection = match current {
            Connection::Connected(channel) | Connection::Stale(channel) => {
                Connection::Stale(channel)
            }
            Connection::Unconnected => Connection::Unconnected,
        };
    }

    /// Wrap a failed call, marking the connection stale if the service is unreachable.
    fn check<T>(&self, result: Result<T, tonic::Status>, context: &str) -> Result<T, LgError> {
        result.map_err(|status| {
            let err = LgError::remote(context, status);
            if err.is_unavailable() {
                warn!("BioRIS at {} unavailable: {}", self.config.api, err);
                self.mark_stale();
            }
            err
        })
    }

    async fn with_timeout<T, F>(&self, context: &str, fut: F) -> Result<T, LgError>
    where
        F: Future<Output = Result<T, LgError>>,
    {
        tokio::time::timeout(self.config.timeout, fut)
            .await
            .map_err(|_| LgError::Timeout {
                context: context.to_string(),
                secs: self.config.timeout.as_secs(),
            })?
    }

    async fn fetch_neighbours(&self) -> Result<Vec<BgpNeighbor>, LgError> {
        let mut client = self.client()?;
        let request = GetNeighborsRequest {
            router: self.config.router.clone(),
            vrf_id: self.config.vrf_id,
            vrf: String::new(),
        };
        let response = client.get_neighbors(request).await;
        Ok(self
            .check(response, "could not get neighbors")?
            .into_inner()
            .neighbors)
    }

    async fn dump_routes(&self, neighbour_id: &str) -> Result<Vec<Route>, LgError> {
        let mut client = self.client()?;
        let mut routes = vec![];

        for afisafi in ADDRESS_FAMILIES {
            let request = DumpRibRequest {
                router: self.config.router.clone(),
                vrf_id: self.config.vrf_id,
                vrf: String::new(),
                afisafi: afisafi as i32,
                neighbor: neighbour_id.to_string(),
            };
            let context = format!("could not dump {} RIB", afisafi.as_str_name());
            let response = client.dump_rib(request).await;
            let mut stream = self.check(response, &context)?.into_inner();

            while let Some(reply) = self.check(stream.message().await, "receive failed")? {
                if let Some(route) = reply.route {
                    routes.extend(routes_from_ris_route(&route));
                }
            }
        }

        debug!(
            "received {} routes from {} for neighbour {:?}",
            routes.len(),
            self.config.id,
            neighbour_id
        );
        Ok(routes)
    }

    async fn routes_response(&self, neighbour_id: &str) -> Result<RoutesResponse, LgError> {
        let imported = self
            .with_timeout("route dump", self.dump_routes(neighbour_id))
            .await?;
        let mut response = RoutesResponse::new(ApiStatus::uncached(API_VERSION, Utc::now()));
        response.imported = imported;
        Ok(response)
    }
}

#[async_trait]
impl Source for BioRis {
    async fn status(&self) -> Result<StatusResponse, LgError> {
        Ok(StatusResponse {
            api: default_api_status(),
            status: api::Status {
                server_time: Utc::now(),
                last_reboot: None,
                last_reconfig: None,
                message: String::new(),
                router_id: self.config.router.clone(),
                version: API_VERSION.to_string(),
                backend: BACKEND.to_string(),
            },
        })
    }

    async fn neighbours(&self) -> Result<NeighboursResponse, LgError> {
        let neighbors = self
            .with_timeout("get neighbors", self.fetch_neighbours())
            .await?;
        let now = Utc::now();
        Ok(NeighboursResponse {
            api: default_api_status(),
            neighbours: neighbors
                .iter()
                .map(|n| neighbour_from_bgp_neighbor(n, &self.config.id, now))
                .collect(),
        })
    }

    async fn neighbours_status(&self) -> Result<NeighboursStatusResponse, LgError> {
        let neighbors = self
            .with_timeout("get neighbors", self.fetch_neighbours())
            .await?;
        let now = Utc::now();
        Ok(NeighboursStatusResponse {
            api: default_api_status(),
            neighbours: neighbors
                .iter()
                .map(|n| NeighbourStatus {
                    id: optional_ip_to_string(n.neighbor_address.as_ref()),
                    state: neighbour_state(n.status),
                    since: uptime(n.established_since, now),
                })
                .collect(),
        })
    }

    async fn routes(&self, neighbour_id: &str) -> Result<RoutesResponse, LgError> {
        self.routes_response(neighbour_id).await
    }

    async fn routes_received(&self, neighbour_id: &str) -> Result<RoutesResponse, LgError> {
        self.routes_response(neighbour_id).await
    }

    /// BioRIS does not classify filtered routes.
    async fn routes_filtered(&self, _neighbour_id: &str) -> Result<RoutesResponse, LgError> {
        Ok(RoutesResponse::new(default_api_status()))
    }

    /// BioRIS does not classify not exported routes.
    async fn routes_not_exported(&self, _neighbour_id: &str) -> Result<RoutesResponse, LgError> {
        Ok(RoutesResponse::new(default_api_status()))
    }

    async fn all_routes(&self) -> Result<RoutesResponse, LgError> {
        self.routes_response("").await
    }

    fn expire_caches(&self) -> usize {
        0
    }
}

fn default_api_status() -> ApiStatus {
    ApiStatus::uncached(
        API_VERSION,
        Utc::now() + chrono::Duration::seconds(RESPONSE_TTL_SECS),
    )
}

fn ip_to_string(ip: &Ip) -> String {
    match ip.version() {
        ip::Version::Ipv4 => Ipv4Addr::from(ip.lower as u32).to_string(),
        ip::Version::Ipv6 => {
            Ipv6Addr::from(((ip.higher as u128) << 64) | ip.lower as u128).to_string()
        }
    }
}

fn optional_ip_to_string(ip: Option<&Ip>) -> String {
    ip.map(ip_to_string).unwrap_or_default()
}

fn prefix_to_string(prefix: &Prefix) -> String {
    format!(
        "{}/{}",
        optional_ip_to_string(prefix.address.as_ref()),
        prefix.length
    )
}

/// Normalize a remote session state. Only established sessions are renamed.
fn neighbour_state(status: i32) -> String {
    match bgp_neighbor::Status::try_from(status) {
        Ok(bgp_neighbor::Status::Established) => "up".to_string(),
        Ok(status) => status.as_str_name().to_string(),
        Err(_) => status.to_string(),
    }
}

fn uptime(established_since: u64, now: DateTime<Utc>) -> Duration {
    if established_since == 0 {
        return Duration::ZERO;
    }
    let secs = now.timestamp() - established_since as i64;
    Duration::from_secs(secs.max(0) as u64)
}

fn neighbour_from_bgp_neighbor(
    neighbor: &BgpNeighbor,
    route_server_id: &str,
    now: DateTime<Utc>,
) -> Neighbour {
    let address = optional_ip_to_string(neighbor.neighbor_address.as_ref());
    let stats = neighbor.stats.clone().unwrap_or_default();

    Neighbour {
        id: address.clone(),
        address,
        asn: neighbor.peer_asn,
        state: neighbour_state(neighbor.status),
        description: neighbor.description.clone(),
        routes_received: stats.routes_received,
        routes_filtered: 0,
        routes_exported: stats.routes_exported,
        routes_preferred: 0,
        routes_accepted: 0,
        uptime: uptime(neighbor.established_since, now),
        last_error: String::new(),
        route_server_id: route_server_id.to_string(),
    }
}

fn origin_name(origin: u32) -> String {
    match origin {
        0 => "IGP".to_string(),
        1 => "EGP".to_string(),
        2 => "incomplete".to_string(),
        other => other.to_string(),
    }
}

/// Translate the BGP paths of a RIB entry, skipping paths of other types.
fn routes_from_ris_route(route: &proto::bio::route::Route) -> Vec<Route> {
    let network = route
        .pfx
        .as_ref()
        .map(prefix_to_string)
        .unwrap_or_default();

    route
        .paths
        .iter()
        .filter(|p| p.r#type == path::Type::Bgp as i32)
        .filter_map(|p| p.bgp_path.as_ref())
        .map(|bgp_path| route_from_bgp_path(&network, bgp_path))
        .collect()
}

fn route_from_bgp_path(network: &str, bgp_path: &BgpPath) -> Route {
    // AS sets in later segments are not expanded
    let as_path = bgp_path
        .as_path
        .first()
        .map(|segment| segment.asns.clone())
        .unwrap_or_default();

    Route {
        id: network.to_string(),
        neighbour_id: bgp_path.source.as_ref().map(ip_to_string),
        network: network.to_string(),
        bgp: BgpInfo {
            origin: origin_name(bgp_path.origin),
            as_path,
            next_hop: optional_ip_to_string(bgp_path.next_hop.as_ref()),
            communities: bgp_path
                .communities
                .iter()
                .map(|c| Community::from(*c))
                .collect(),
            large_communities: bgp_path
                .large_communities
                .iter()
                .map(|c| LargeCommunity(c.global_administrator, c.data_part1, c.data_part2))
                .collect(),
            ext_communities: vec![],
            local_pref: bgp_path.local_pref,
            med: bgp_path.med,
        },
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::pin::Pin;
    use std::sync::Arc;

    use futures::Stream;
    use tokio::sync::oneshot;
    use tokio_stream::wrappers::TcpListenerStream;
    use tonic::transport::Server;
    use tonic::{Request, Response, Status};

    use proto::bio::ris::routing_information_service_server::{
        RoutingInformationService, RoutingInformationServiceServer,
    };
    use proto::bio::ris::{BgpNeighborStats, DumpRibReply, GetNeighborsResponse};
    use proto::bio::route::{AsPathSegment, Path};

    fn ipv4(addr: [u8; 4]) -> Ip {
        Ip {
            higher: 0,
            lower: u32::from(Ipv4Addr::from(addr)) as u64,
            version: ip::Version::Ipv4 as i32,
        }
    }

    fn ipv6(addr: &str) -> Ip {
        let value = u128::from(addr.parse::<Ipv6Addr>().unwrap());
        Ip {
            higher: (value >> 64) as u64,
            lower: value as u64,
            version: ip::Version::Ipv6 as i32,
        }
    }

    fn bgp_path(asns: Vec<u32>, source: Ip) -> Path {
        Path {
            r#type: path::Type::Bgp as i32,
            bgp_path: Some(BgpPath {
                next_hop: Some(source.clone()),
                local_pref: 100,
                as_path: vec![AsPathSegment {
                    as_sequence: true,
                    asns,
                }],
                med: 10,
                source: Some(source),
                communities: vec![(65535 << 16) + 666],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn static_path() -> Path {
        Path {
            r#type: path::Type::Static as i32,
            ..Default::default()
        }
    }

    fn rib_entry(address: Ip, length: u32, paths: Vec<Path>) -> DumpRibReply {
        DumpRibReply {
            route: Some(proto::bio::route::Route {
                pfx: Some(Prefix {
                    address: Some(address),
                    length,
                }),
                paths,
            }),
        }
    }

    #[derive(Default)]
    struct MockRis {
        neighbors: Vec<BgpNeighbor>,
        ribs: HashMap<i32, Vec<DumpRibReply>>,
        fail_ipv6: bool,
        slow: bool,
        requests: Arc<parking_lot::Mutex<Vec<DumpRibRequest>>>,
    }

    #[tonic::async_trait]
    impl RoutingInformationService for MockRis {
        async fn get_neighbors(
            &self,
            _request: Request<GetNeighborsRequest>,
        ) -> Result<Response<GetNeighborsResponse>, Status> {
            if self.slow {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            Ok(Response::new(GetNeighborsResponse {
                neighbors: self.neighbors.clone(),
            }))
        }

        type DumpRIBStream = Pin<Box<dyn Stream<Item = Result<DumpRibReply, Status>> + Send>>;

        async fn dump_rib(
            &self,
            request: Request<DumpRibRequest>,
        ) -> Result<Response<Self::DumpRIBStream>, Status> {
            let request = request.into_inner();
            self.requests.lock().push(request.clone());

            let mut replies: Vec<Result<DumpRibReply, Status>> = self
                .ribs
                .get(&request.afisafi)
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .map(Ok)
                .collect();
            if self.fail_ipv6 && request.afisafi == AfiSafi::Ipv6Unicast as i32 {
                replies.push(Err(Status::internal("rib walk failed")));
            }
            Ok(Response::new(Box::pin(futures::stream::iter(replies))))
        }
    }

    async fn serve(mock: MockRis) -> (String, oneshot::Sender<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            Server::builder()
                .add_service(RoutingInformationServiceServer::new(mock))
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                    let _ = rx.await;
                })
                .await
                .unwrap();
        });

        (addr.to_string(), tx)
    }

    fn test_config(api: &str) -> BioRisConfig {
        BioRisConfig {
            id: "rs1".to_string(),
            name: "RS 1".to_string(),
            api: api.to_string(),
            router: "10.0.0.1".to_string(),
            vrf_id: 0,
            timeout: Duration::from_secs(5),
        }
    }

    fn mock_ribs() -> HashMap<i32, Vec<DumpRibReply>> {
        let peer_v4 = ipv4([192, 0, 2, 1]);
        let peer_v6 = ipv6("2001:db8::1");
        HashMap::from([
            (
                AfiSafi::Ipv4Unicast as i32,
                vec![
                    rib_entry(
                        ipv4([198, 51, 100, 0]),
                        24,
                        vec![static_path(), bgp_path(vec![64500, 64501], peer_v4.clone())],
                    ),
                    rib_entry(
                        ipv4([203, 0, 113, 0]),
                        24,
                        vec![bgp_path(vec![64500], peer_v4)],
                    ),
                ],
            ),
            (
                AfiSafi::Ipv6Unicast as i32,
                vec![rib_entry(
                    ipv6("2001:db8:100::"),
                    48,
                    vec![bgp_path(vec![64510], peer_v6)],
                )],
            ),
        ])
    }

    #[test]
    fn test_ip_to_string() {
        assert_eq!(ip_to_string(&ipv4([192, 0, 2, 1])), "192.0.2.1");
        assert_eq!(ip_to_string(&ipv6("2001:db8::1")), "2001:db8::1");
        assert_eq!(optional_ip_to_string(None), "");
        assert_eq!(
            prefix_to_string(&Prefix {
                address: Some(ipv4([10, 0, 0, 0])),
                length: 8,
            }),
            "10.0.0.0/8"
        );
    }

    #[test]
    fn test_neighbour_state() {
        assert_eq!(neighbour_state(bgp_neighbor::Status::Established as i32), "up");
        assert_eq!(neighbour_state(bgp_neighbor::Status::Idle as i32), "Idle");
        assert_eq!(neighbour_state(bgp_neighbor::Status::OpenSent as i32), "OpenSent");
        assert_eq!(neighbour_state(42), "42");
    }

    #[test]
    fn test_uptime() {
        let now = Utc::now();
        let since = (now.timestamp() - 3600) as u64;
        assert_eq!(uptime(since, now), Duration::from_secs(3600));
        assert_eq!(uptime(0, now), Duration::ZERO);
        // clock skew, session established in the future
        assert_eq!(uptime(now.timestamp() as u64 + 10, now), Duration::ZERO);
    }

    #[test]
    fn test_route_translation() {
        let routes = routes_from_ris_route(
            mock_ribs()[&(AfiSafi::Ipv4Unicast as i32)][0]
                .route
                .as_ref()
                .unwrap(),
        );
        assert_eq!(routes.len(), 1);
        let route = &routes[0];
        assert_eq!(route.id, "198.51.100.0/24");
        assert_eq!(route.network, "198.51.100.0/24");
        assert_eq!(route.neighbour_id.as_deref(), Some("192.0.2.1"));
        assert_eq!(route.bgp.as_path, vec![64500, 64501]);
        assert_eq!(route.bgp.next_hop, "192.0.2.1");
        assert_eq!(route.bgp.origin, "IGP");
        assert_eq!(route.bgp.local_pref, 100);
        assert_eq!(route.bgp.med, 10);
        assert_eq!(route.bgp.communities, vec![Community(65535, 666)]);
    }

    #[test]
    fn test_route_without_as_path() {
        let path = BgpPath {
            large_communities: vec![proto::bio::route::LargeCommunity {
                global_administrator: 9033,
                data_part1: 1000,
                data_part2: 1,
            }],
            ..Default::default()
        };
        let route = route_from_bgp_path("10.0.0.0/8", &path);
        assert!(route.bgp.as_path.is_empty());
        assert_eq!(route.neighbour_id, None);
        assert_eq!(route.bgp.large_communities, vec![LargeCommunity(9033, 1000, 1)]);
    }

    #[tokio::test]
    async fn test_status() {
        let source = BioRis::new(test_config("127.0.0.1:1"));
        let status = source.status().await.unwrap();
        assert_eq!(status.status.backend, "BioRIS");
        assert_eq!(status.status.version, "v0.1.0");
        assert_eq!(status.api.version, "v0.1.0");
        assert!(!status.api.result_from_cache);
        assert!(status.api.ttl > Utc::now());
        assert_eq!(source.expire_caches(), 0);
        assert_eq!(source.connection_state(), ConnectionState::Unconnected);
    }

    #[tokio::test]
    async fn test_neighbours() {
        let established_since = (Utc::now().timestamp() - 100) as u64;
        let mock = MockRis {
            neighbors: vec![
                BgpNeighbor {
                    neighbor_address: Some(ipv4([192, 0, 2, 1])),
                    peer_asn: 64500,
                    status: bgp_neighbor::Status::Established as i32,
                    established_since,
                    description: "peer one".to_string(),
                    stats: Some(BgpNeighborStats {
                        routes_received: 12,
                        routes_exported: 7,
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                BgpNeighbor {
                    neighbor_address: Some(ipv6("2001:db8::2")),
                    peer_asn: 64501,
                    status: bgp_neighbor::Status::Idle as i32,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let (addr, shutdown) = serve(mock).await;
        let source = BioRis::new(test_config(&addr));

        let response = source.neighbours().await.unwrap();
        assert_eq!(source.connection_state(), ConnectionState::Connected);
        assert_eq!(response.neighbours.len(), 2);

        let first = &response.neighbours[0];
        assert_eq!(first.id, "192.0.2.1");
        assert_eq!(first.address, "192.0.2.1");
        assert_eq!(first.asn, 64500);
        assert_eq!(first.state, "up");
        assert_eq!(first.description, "peer one");
        assert_eq!(first.routes_received, 12);
        assert_eq!(first.routes_exported, 7);
        assert_eq!(first.routes_filtered, 0);
        assert_eq!(first.routes_accepted, 0);
        assert!(first.uptime >= Duration::from_secs(100));
        assert_eq!(first.route_server_id, "rs1");

        let second = &response.neighbours[1];
        assert_eq!(second.id, "2001:db8::2");
        assert_eq!(second.state, "Idle");
        assert_eq!(second.uptime, Duration::ZERO);

        let status = source.neighbours_status().await.unwrap();
        assert_eq!(status.neighbours.len(), 2);
        assert_eq!(status.neighbours[0].state, "up");
        assert!(status.neighbours[0].since >= Duration::from_secs(100));
        assert_eq!(status.neighbours[1].id, "2001:db8::2");

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn test_routes_in_family_order() {
        let requests = Arc::new(parking_lot::Mutex::new(vec![]));
        let mock = MockRis {
            ribs: mock_ribs(),
            requests: requests.clone(),
            ..Default::default()
        };
        let (addr, shutdown) = serve(mock).await;
        let source = BioRis::new(test_config(&addr));

        let response = source.routes("192.0.2.1").await.unwrap();
        let networks: Vec<&str> = response
            .imported
            .iter()
            .map(|r| r.network.as_str())
            .collect();
        assert_eq!(
            networks,
            vec!["198.51.100.0/24", "203.0.113.0/24", "2001:db8:100::/48"]
        );
        assert!(response.filtered.is_empty());
        assert!(response.not_exported.is_empty());
        assert!(response.api.ttl <= Utc::now());

        {
            let requests = requests.lock();
            assert_eq!(requests.len(), 2);
            assert_eq!(requests[0].afisafi, AfiSafi::Ipv4Unicast as i32);
            assert_eq!(requests[1].afisafi, AfiSafi::Ipv6Unicast as i32);
            assert_eq!(requests[0].neighbor, "192.0.2.1");
            assert_eq!(requests[0].router, "10.0.0.1");
        }

        let all = source.all_routes().await.unwrap();
        assert_eq!(all.imported.len(), 3);
        assert_eq!(requests.lock()[2].neighbor, "");

        let received = source.routes_received("192.0.2.1").await.unwrap();
        assert_eq!(received.imported, response.imported);

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn test_stream_error_aborts_retrieval() {
        let mock = MockRis {
            ribs: mock_ribs(),
            fail_ipv6: true,
            ..Default::default()
        };
        let (addr, shutdown) = serve(mock).await;
        let source = BioRis::new(test_config(&addr));

        let err = source.routes("").await.unwrap_err();
        assert!(matches!(err, LgError::RemoteError { .. }));
        assert!(!err.is_unavailable());
        assert_eq!(source.connection_state(), ConnectionState::Connected);

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn test_filtered_and_not_exported_are_empty() {
        let source = BioRis::new(test_config("127.0.0.1:1"));
        for neighbour in ["192.0.2.1", ""] {
            let filtered = source.routes_filtered(neighbour).await.unwrap();
            assert!(filtered.imported.is_empty());
            assert!(filtered.filtered.is_empty());
            assert!(filtered.not_exported.is_empty());
            let not_exported = source.routes_not_exported(neighbour).await.unwrap();
            assert!(not_exported.imported.is_empty());
            assert!(not_exported.filtered.is_empty());
            assert!(not_exported.not_exported.is_empty());
        }
        assert_eq!(source.connection_state(), ConnectionState::Unconnected);
    }

    #[tokio::test]
    async fn test_unreachable_service_marks_connection_stale() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let source = BioRis::new(test_config(&addr));
        let err = source.neighbours().await.unwrap_err();
        assert!(err.is_unavailable());
        assert_eq!(source.connection_state(), ConnectionState::Stale);

        // the next call redials and fails the same way
        assert!(source.all_routes().await.is_err());
        assert_eq!(source.connection_state(), ConnectionState::Stale);
    }

    #[tokio::test]
    async fn test_invalid_api_is_connect_error() {
        let source = BioRis::new(test_config("not a valid uri"));
        let err = source.neighbours().await.unwrap_err();
        assert!(matches!(err, LgError::ConnectError { .. }));
        assert_eq!(source.connection_state(), ConnectionState::Unconnected);
    }

    #[tokio::test]
    async fn test_timeout() {
        let mock = MockRis {
            slow: true,
            ..Default::default()
        };
        let (addr, shutdown) = serve(mock).await;
        let mut config = test_config(&addr);
        config.timeout = Duration::from_millis(200);
        let source = BioRis::new(config);

        let err = source.neighbours().await.unwrap_err();
        assert!(matches!(err, LgError::Timeout { .. }));

        let _ = shutdown.send(());
    }
}
