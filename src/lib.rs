/*!
# Overview

[looking-glass-sources][crate] loads the configuration of a BGP looking glass and gives uniform
access to the route servers behind it. Each configured source talks to one route server through a
backend (birdwatcher, GoBGP or BioRIS) and answers the same set of queries through the [Source]
trait: status, neighbours, and routes by acceptance category.

# Examples

## Loading the Configuration

[Config::load] reads an INI-style configuration file. Besides the server and housekeeping
settings it derives the UI configuration (columns, community labels, rejection reasons, RPKI
classification) and the list of sources.

```no_run
use looking_glass_sources::Config;

let config = Config::load("/etc/alice-lg/alice.conf").unwrap();
for line in config.display_summary() {
    println!("{}", line);
}

let rpki = &config.ui.rpki;
println!("rpki enabled: {}, invalid: {:?}", rpki.enabled, rpki.invalid);
```

## Querying a Source

The [SourceRegistry] constructs source instances on first use and hands out the same instance on
every later request. BioRIS sources are built in; birdwatcher and GoBGP clients are plugged in
with [SourceRegistry::with_birdwatcher] and [SourceRegistry::with_gobgp].

```no_run
use looking_glass_sources::{Config, Source, SourceRegistry};

# async fn run() -> Result<(), looking_glass_sources::LgError> {
let config = Config::load("/etc/alice-lg/alice.conf")?;
let registry = SourceRegistry::new(config.sources);

let source = registry.instance("rs1-example-v4")?;
for neighbour in source.neighbours().await?.neighbours {
    println!("{} AS{} {}", neighbour.address, neighbour.asn, neighbour.state);
}

let routes = source.routes("192.0.2.1").await?;
for route in routes.imported {
    println!("{} via {}", route.network, route.bgp.next_hop);
}
# Ok(())
# }
```
*/

pub mod api;
pub mod communities;
pub mod config;
mod error;
mod ini;
mod registry;
pub mod sources;

pub use communities::{Community, CommunitySet};
pub use config::{Backend, BackendKind, Config, SourceConfig, UiConfig};
pub use error::LgError;
pub use ini::{IniFile, Section};
pub use registry::SourceRegistry;
pub use sources::bioris::{BioRis, BioRisConfig, ConnectionState};
pub use sources::Source;
