//! Discovery of `source:<id>` sections and their backend configuration.
use std::collections::HashSet;

use tracing::{info, warn};

use crate::ini::{IniFile, Section};
use crate::sources::bioris::BioRisConfig;
use crate::sources::birdwatcher::BirdwatcherConfig;
use crate::sources::gobgp::GoBgpConfig;
use crate::LgError;

/// Section name prefixes introducing a source.
const SOURCE_PREFIXES: [&str; 2] = ["source:", "source."];

const DEFAULT_SOURCE_NAME: &str = "Unknown Source";

/// Supported backend kinds, named by the suffix of the backend section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Birdwatcher,
    GoBgp,
    BioRis,
}

impl BackendKind {
    /// Resolve the backend kind from the last segment of a section name,
    /// e.g. `source:rs1.bioris`.
    pub fn from_section_name(name: &str) -> Option<Self> {
        match name.rsplit('.').next()? {
            "birdwatcher" => Some(BackendKind::Birdwatcher),
            "gobgp" => Some(BackendKind::GoBgp),
            "bioris" => Some(BackendKind::BioRis),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Birdwatcher => "birdwatcher",
            BackendKind::GoBgp => "gobgp",
            BackendKind::BioRis => "bioris",
        }
    }
}

/// Backend of a source together with its backend specific configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Birdwatcher(BirdwatcherConfig),
    GoBgp(GoBgpConfig),
    BioRis(BioRisConfig),
}

impl Backend {
    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Birdwatcher(_) => BackendKind::Birdwatcher,
            Backend::GoBgp(_) => BackendKind::GoBgp,
            Backend::BioRis(_) => BackendKind::BioRis,
        }
    }
}

/// A configured routing data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// unique source id, taken from the section name
    pub id: String,
    /// position in the configuration file, used for stable display ordering
    pub order: usize,
    pub name: String,
    pub group: Option<String>,
    pub blackholes: Vec<String>,
    pub backend: Backend,
}

/// Extract the source id of a base source section (`source:<id>`).
///
/// Backend sections (`source:<id>.<backend>`) are not base sections.
pub fn source_id(section_name: &str) -> Option<&str> {
    let id = SOURCE_PREFIXES
        .iter()
        .find_map(|prefix| section_name.strip_prefix(prefix))?;
    (!id.is_empty() && !id.contains('.')).then_some(id)
}

/// Split a comma separated list, trimming entries and dropping empty ones.
pub(crate) fn trimmed_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Load all configured sources.
///
/// A source without backend, with more than one backend, or with an
/// unsupported backend fails the whole load. So does a source id used twice,
/// including across the `source:` and `source.` spellings.
pub fn sources_from_ini(ini: &IniFile) -> Result<Vec<SourceConfig>, LgError> {
    let mut sources = vec![];
    let mut seen_ids = HashSet::new();

    for section in ini.sections() {
        let Some(id) = source_id(section.name()) else {
            continue;
        };
        if !seen_ids.insert(id) {
            return Err(LgError::DuplicateSource(section.name().to_string()));
        }

        let backend_sections = ini.child_sections(section.name());
        let backend_section = match backend_sections.as_slice() {
            [] => return Err(LgError::NoBackend(section.name().to_string())),
            [backend_section] => *backend_section,
            _ => return Err(LgError::AmbiguousBackends(section.name().to_string())),
        };

        let name = section.get_or("name", DEFAULT_SOURCE_NAME);
        let backend = backend_from_section(id, name.as_str(), section, backend_section)?;

        sources.push(SourceConfig {
            id: id.to_string(),
            order: sources.len(),
            group: section.get("group").filter(|g| !g.is_empty()).map(|g| g.to_string()),
            blackholes: trimmed_list(section.get("blackholes").unwrap_or_default()),
            name,
            backend,
        });
    }

    info!("loaded {} sources", sources.len());
    Ok(sources)
}

fn backend_from_section(
    id: &str,
    name: &str,
    source_section: &Section,
    backend_section: &Section,
) -> Result<Backend, LgError> {
    let kind = BackendKind::from_section_name(backend_section.name())
        .ok_or_else(|| LgError::UnsupportedBackend(source_section.name().to_string()))?;

    let backend = match kind {
        BackendKind::Birdwatcher => Backend::Birdwatcher(BirdwatcherConfig::from_section(
            id,
            name,
            backend_section,
        )?),
        BackendKind::GoBgp => Backend::GoBgp(GoBgpConfig::from_section(id, name, backend_section)),
        BackendKind::BioRis => {
            let config = BioRisConfig::from_section(id, name, backend_section);
            if let Err(e) = config.verify() {
                warn!("source {} is incomplete: {}", id, e);
            }
            Backend::BioRis(config)
        }
    };
    Ok(backend)
}
