//! Configuration management.
//!
//! The configuration is read once at startup from an INI-style file and is
//! immutable afterwards. It holds the server settings, housekeeping settings,
//! the UI configuration and the ordered list of configured sources.
pub mod sources;
pub mod ui;

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::ini::IniFile;
use crate::LgError;

pub use sources::{source_id, sources_from_ini, Backend, BackendKind, SourceConfig};
pub use ui::{
    bgp_communities, lookup_columns, neighbours_columns, own_asn, pagination_config,
    reject_candidates, routes_columns, routes_noexports, routes_rejections, rpki_config,
    theme_config, Columns, NoexportsConfig, PaginationConfig, RejectCandidatesConfig,
    RejectionsConfig, RpkiConfig, RpkiState, ThemeConfig, UiConfig, DEFAULT_THEME_BASE_PATH,
};

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "LG_SOURCES_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "/etc/alice-lg/alice.conf";

/// Default values for server configuration
const DEFAULT_LISTEN_HTTP: &str = "127.0.0.1:7340";
const DEFAULT_NEIGHBOURS_STORE_REFRESH_INTERVAL: u64 = 5;
const DEFAULT_ROUTES_STORE_REFRESH_INTERVAL: u64 = 5;

/// Default values for housekeeping configuration
const DEFAULT_HOUSEKEEPING_INTERVAL: u64 = 5;

/// Server settings, from the `server` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the HTTP server listens on.
    /// Key: `listen_http`
    pub listen: String,

    /// Key: `enable_prefix_lookup`
    pub enable_prefix_lookup: bool,

    /// Minutes between neighbour store refreshes.
    /// Key: `neighbours_store_refresh_interval`
    pub neighbours_store_refresh_interval: u64,

    /// Minutes between routes store refreshes.
    /// Key: `routes_store_refresh_interval`
    pub routes_store_refresh_interval: u64,

    /// ASN of this route server.
    /// Key: `asn`
    pub asn: Option<u32>,

    /// Key: `enable_neighbors_status_refresh`
    pub enable_neighbors_status_refresh: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN_HTTP.to_string(),
            enable_prefix_lookup: false,
            neighbours_store_refresh_interval: DEFAULT_NEIGHBOURS_STORE_REFRESH_INTERVAL,
            routes_store_refresh_interval: DEFAULT_ROUTES_STORE_REFRESH_INTERVAL,
            asn: None,
            enable_neighbors_status_refresh: false,
        }
    }
}

impl ServerConfig {
    pub fn from_ini(ini: &IniFile) -> Self {
        let section = ini.section_or_empty("server");
        let defaults = Self::default();
        Self {
            listen: section.get_or("listen_http", defaults.listen.as_str()),
            enable_prefix_lookup: section
                .parse_or("enable_prefix_lookup", defaults.enable_prefix_lookup),
            neighbours_store_refresh_interval: section.parse_or(
                "neighbours_store_refresh_interval",
                defaults.neighbours_store_refresh_interval,
            ),
            routes_store_refresh_interval: section.parse_or(
                "routes_store_refresh_interval",
                defaults.routes_store_refresh_interval,
            ),
            asn: ui::own_asn(ini),
            enable_neighbors_status_refresh: section.parse_or(
                "enable_neighbors_status_refresh",
                defaults.enable_neighbors_status_refresh,
            ),
        }
    }
}

impl fmt::Display for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "listen_http={}, asn={}, prefix_lookup={}, neighbours_refresh={}m, routes_refresh={}m",
            self.listen,
            self.asn.map(|a| a.to_string()).unwrap_or_else(|| "unset".to_string()),
            self.enable_prefix_lookup,
            self.neighbours_store_refresh_interval,
            self.routes_store_refresh_interval
        )
    }
}

/// Housekeeping settings, from the `housekeeping` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HousekeepingConfig {
    /// Minutes between housekeeping runs.
    /// Key: `interval`
    pub interval: u64,

    /// Key: `force_release_memory`
    pub force_release_memory: bool,
}

impl Default for HousekeepingConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_HOUSEKEEPING_INTERVAL,
            force_release_memory: false,
        }
    }
}

impl HousekeepingConfig {
    pub fn from_ini(ini: &IniFile) -> Self {
        let section = ini.section_or_empty("housekeeping");
        Self {
            interval: section.parse_or("interval", DEFAULT_HOUSEKEEPING_INTERVAL),
            force_release_memory: section.parse_or("force_release_memory", false),
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Server settings
    pub server: ServerConfig,

    /// Housekeeping settings
    pub housekeeping: HousekeepingConfig,

    /// UI settings
    pub ui: UiConfig,

    /// Configured sources, in file order
    pub sources: Vec<SourceConfig>,

    /// The file the configuration was loaded from
    pub file: PathBuf,
}

impl Config {
    /// Locate and load the configuration file.
    ///
    /// See [resolve_config_file] for the fallback locations tried.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LgError> {
        let file = resolve_config_file(path.as_ref())?;
        info!("loading configuration from {}", file.display());
        let ini = IniFile::load(&file)?;
        let mut config = Self::from_ini(&ini)?;
        config.file = file;
        Ok(config)
    }

    /// Build the configuration from a parsed file.
    pub fn from_ini(ini: &IniFile) -> Result<Self, LgError> {
        let sources = sources_from_ini(ini)?;
        let ui = UiConfig::from_ini(ini)?;

        Ok(Self {
            server: ServerConfig::from_ini(ini),
            housekeeping: HousekeepingConfig::from_ini(ini),
            ui,
            sources,
            file: PathBuf::new(),
        })
    }

    /// Get a source by its id.
    pub fn source_by_id(&self, id: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.id == id)
    }

    /// Display configuration summary for logging.
    ///
    /// Returns a vector of log lines suitable for info-level logging.
    pub fn display_summary(&self) -> Vec<String> {
        let mut lines = Vec::new();

        lines.push("=== Looking Glass Sources Configuration ===".to_string());
        lines.push(format!("Config file: {}", self.file.display()));
        lines.push(format!("Server: {}", self.server));
        lines.push(format!(
            "Housekeeping: every {} minutes, force_release_memory={}",
            self.housekeeping.interval, self.housekeeping.force_release_memory
        ));

        if self.ui.rpki.enabled {
            lines.push(format!(
                "RPKI: ENABLED (invalid: {})",
                self.ui.rpki.invalid.join(":")
            ));
        } else {
            lines.push("RPKI: DISABLED".to_string());
        }
        lines.push(format!(
            "BGP communities: {} labels, {} rejection reasons, {} noexport reasons",
            self.ui.bgp_communities.len(),
            self.ui.routes_rejections.reasons.len(),
            self.ui.routes_noexports.reasons.len()
        ));

        lines.push(format!("Sources: {}", self.sources.len()));
        for source in &self.sources {
            lines.push(format!(
                "  [{}] {} ({}) backend={}",
                source.order,
                source.id,
                source.name,
                source.backend.kind().as_str()
            ));
        }

        lines.push("===========================================".to_string());

        lines
    }
}

/// Path of the configuration file, from `LG_SOURCES_CONFIG` or the default
/// location. A `.env` file in the working directory is loaded first.
pub fn config_path_from_env() -> PathBuf {
    dotenvy::dotenv().ok();
    match dotenvy::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path.trim()),
        _ => PathBuf::from(DEFAULT_CONFIG_PATH),
    }
}

/// Find the configuration file to load.
///
/// Tries, in order: `path` itself, `path` prefixed with `..`, and the previous
/// candidate with `.conf` replaced by `.local.conf`.
pub fn resolve_config_file(path: &Path) -> Result<PathBuf, LgError> {
    let mut candidate = path.to_path_buf();
    let mut tried = vec![];

    if !candidate.exists() {
        tried.push(candidate.display().to_string());
        candidate = PathBuf::from(format!("..{}", candidate.display()));
        debug!("configuration not found, trying {}", candidate.display());
    }

    if !candidate.exists() {
        tried.push(candidate.display().to_string());
        candidate = PathBuf::from(
            candidate
                .display()
                .to_string()
                .replacen(".conf", ".local.conf", 1),
        );
        debug!("configuration not found, trying {}", candidate.display());
    }

    if !candidate.exists() {
        tried.push(candidate.display().to_string());
        return Err(LgError::ConfigNotFound(tried.join(", ")));
    }

    Ok(candidate)
}
