//! Lazily constructed source instances.
//!
//! The registry owns the configured sources and builds each backend on first
//! request. Construction never touches the network, so it is cheap to call
//! [SourceRegistry::instance] from request handlers.
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::config::{Backend, BackendKind, SourceConfig};
use crate::sources::bioris::BioRis;
use crate::sources::birdwatcher::BirdwatcherConfig;
use crate::sources::gobgp::GoBgpConfig;
use crate::sources::Source;
use crate::LgError;

type BirdwatcherConstructor = Box<dyn Fn(&BirdwatcherConfig) -> Arc<dyn Source> + Send + Sync>;
type GoBgpConstructor = Box<dyn Fn(&GoBgpConfig) -> Arc<dyn Source> + Send + Sync>;

pub struct SourceRegistry {
    sources: Vec<SourceConfig>,
    instances: HashMap<String, OnceCell<Arc<dyn Source>>>,
    birdwatcher: Option<BirdwatcherConstructor>,
    gobgp: Option<GoBgpConstructor>,
}

impl SourceRegistry {
    pub fn new(sources: Vec<SourceConfig>) -> Self {
        let instances = sources
            .iter()
            .map(|s| (s.id.clone(), OnceCell::new()))
            .collect();
        SourceRegistry {
            sources,
            instances,
            birdwatcher: None,
            gobgp: None,
        }
    }

    /// Register the constructor used for birdwatcher sources.
    pub fn with_birdwatcher<F>(mut self, constructor: F) -> Self
    where
        F: Fn(&BirdwatcherConfig) -> Arc<dyn Source> + Send + Sync + 'static,
    {
        self.birdwatcher = Some(Box::new(constructor));
        self
    }

    /// Register the constructor used for GoBGP sources.
    pub fn with_gobgp<F>(mut self, constructor: F) -> Self
    where
        F: Fn(&GoBgpConfig) -> Arc<dyn Source> + Send + Sync + 'static,
    {
        self.gobgp = Some(Box::new(constructor));
        self
    }

    pub fn sources(&self) -> &[SourceConfig] {
        &self.sources
    }

    pub fn source_config(&self, id: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.id == id)
    }

    /// Get the instance of a source, constructing it on first use.
    ///
    /// Concurrent first requests construct the instance once; every call
    /// returns the same `Arc`.
    pub fn instance(&self, id: &str) -> Result<Arc<dyn Source>, LgError> {
        let (config, cell) = match (self.source_config(id), self.instances.get(id)) {
            (Some(config), Some(cell)) => (config, cell),
            _ => return Err(LgError::UnknownSource(id.to_string())),
        };

        cell.get_or_try_init(|| self.construct(config)).cloned()
    }

    fn construct(&self, config: &SourceConfig) -> Result<Arc<dyn Source>, LgError> {
        debug!(
            "constructing {} source {}",
            config.backend.kind().as_str(),
            config.id
        );
        let unavailable = |kind: BackendKind| LgError::BackendUnavailable {
            source_id: config.id.clone(),
            kind: kind.as_str(),
        };

        match &config.backend {
            Backend::BioRis(bioris) => {
                let source: Arc<dyn Source> = Arc::new(BioRis::new(bioris.clone()));
                Ok(source)
            }
            Backend::Birdwatcher(birdwatcher) => self
                .birdwatcher
                .as_ref()
                .map(|constructor| constructor(birdwatcher))
                .ok_or_else(|| unavailable(BackendKind::Birdwatcher)),
            Backend::GoBgp(gobgp) => self
                .gobgp
                .as_ref()
                .map(|constructor| constructor(gobgp))
                .ok_or_else(|| unavailable(BackendKind::GoBgp)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::*;
    use crate::config::sources_from_ini;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A source that answers everything with empty results.
    struct EmptySource;

    #[async_trait]
    impl Source for EmptySource {
        async fn status(&self) -> Result<StatusResponse, LgError> {
            Ok(StatusResponse {
                api: ApiStatus::uncached("test", chrono::Utc::now()),
                status: Status {
                    server_time: chrono::Utc::now(),
                    last_reboot: None,
                    last_reconfig: None,
                    message: String::new(),
                    router_id: String::new(),
                    version: "test".to_string(),
                    backend: "empty".to_string(),
                },
            })
        }

        async fn neighbours(&self) -> Result<NeighboursResponse, LgError> {
            Ok(NeighboursResponse {
                api: ApiStatus::uncached("test", chrono::Utc::now()),
                neighbours: vec![],
            })
        }

        async fn neighbours_status(&self) -> Result<NeighboursStatusResponse, LgError> {
            Ok(NeighboursStatusResponse {
                api: ApiStatus::uncached("test", chrono::Utc::now()),
                neighbours: vec![],
            })
        }

        async fn routes(&self, _neighbour_id: &str) -> Result<RoutesResponse, LgError> {
            self.all_routes().await
        }

        async fn routes_received(&self, _neighbour_id: &str) -> Result<RoutesResponse, LgError> {
            self.all_routes().await
        }

        async fn routes_filtered(&self, _neighbour_id: &str) -> Result<RoutesResponse, LgError> {
            self.all_routes().await
        }

        async fn routes_not_exported(
            &self,
            _neighbour_id: &str,
        ) -> Result<RoutesResponse, LgError> {
            self.all_routes().await
        }

        async fn all_routes(&self) -> Result<RoutesResponse, LgError> {
            Ok(RoutesResponse::new(ApiStatus::uncached(
                "test",
                chrono::Utc::now(),
            )))
        }

        fn expire_caches(&self) -> usize {
            0
        }
    }

    const SOURCES: &str = r#"
[source:rs1]
name = bioris
[source:rs1.bioris]
api = 127.0.0.1:4321
router = 10.0.0.1

[source:rs2]
[source:rs2.birdwatcher]
api = http://rs2:29184/
type = multi_table

[source:rs3]
[source:rs3.gobgp]
host = rs3:50051
"#;

    fn registry() -> SourceRegistry {
        SourceRegistry::new(sources_from_ini(&SOURCES.parse().unwrap()).unwrap())
    }

    #[test]
    fn test_instance_is_cached() {
        let registry = registry();
        let first = registry.instance("rs1").unwrap();
        let second = registry.instance("rs1").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_unknown_source() {
        let res = registry().instance("rs9");
        assert!(matches!(res, Err(LgError::UnknownSource(id)) if id == "rs9"));
    }

    #[test]
    fn test_missing_constructor() {
        let registry = registry();
        let res = registry.instance("rs2");
        assert!(matches!(
            res,
            Err(LgError::BackendUnavailable {
                kind: "birdwatcher",
                ..
            })
        ));
        assert!(matches!(
            registry.instance("rs3"),
            Err(LgError::BackendUnavailable { kind: "gobgp", .. })
        ));
    }

    #[test]
    fn test_registered_constructors_run_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let registry = registry()
            .with_birdwatcher(move |config| {
                assert_eq!(config.id, "rs2");
                counter.fetch_add(1, Ordering::SeqCst);
                Arc::new(EmptySource)
            })
            .with_gobgp(|_| Arc::new(EmptySource));

        let first = registry.instance("rs2").unwrap();
        let second = registry.instance("rs2").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(registry.instance("rs3").is_ok());
    }

    #[test]
    fn test_concurrent_first_access() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let registry = Arc::new(registry().with_birdwatcher(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(EmptySource)
        }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.instance("rs2").unwrap())
            })
            .collect();
        let instances: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[tokio::test]
    async fn test_bioris_instance_answers_without_network() {
        let registry = registry();
        let source = registry.instance("rs1").unwrap();
        let status = source.status().await.unwrap();
        assert_eq!(status.status.backend, "BioRIS");
        assert!(source.routes_filtered("x").await.unwrap().filtered.is_empty());
        assert_eq!(source.expire_caches(), 0);
    }
}
