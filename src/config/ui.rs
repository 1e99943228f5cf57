//! UI and domain configuration derived from the configuration file.
//!
//! Every derivation is a pure function of the parsed [IniFile] and can be
//! called on its own. [UiConfig::from_ini] runs all of them and returns the
//! first error.
use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::Serialize;
use tracing::warn;

use crate::api::LargeCommunity;
use crate::communities::{Community, CommunitySet};
use crate::ini::{IniFile, Section};
use crate::LgError;

/// Default base path of theme files.
pub const DEFAULT_THEME_BASE_PATH: &str = "/theme";

lazy_static! {
    static ref DEFAULT_ROUTES_COLUMNS: Vec<(&'static str, &'static str)> = vec![
        ("network", "Network"),
        ("bgp.as_path", "AS Path"),
        ("gateway", "Gateway"),
        ("interface", "Interface"),
    ];
    static ref DEFAULT_NEIGHBOURS_COLUMNS: Vec<(&'static str, &'static str)> = vec![
        ("address", "Neighbour"),
        ("asn", "ASN"),
        ("state", "State"),
        ("Uptime", "Uptime"),
        ("Description", "Description"),
        ("routes_received", "Routes Recv."),
        ("routes_filtered", "Routes Filtered"),
    ];
    static ref DEFAULT_LOOKUP_COLUMNS: Vec<(&'static str, &'static str)> = vec![
        ("network", "Network"),
        ("gateway", "Gateway"),
        ("bgp.as_path", "AS Path"),
        ("neighbour.asn", "ASN"),
        ("neighbour.description", "Neighbor"),
        ("routeserver.name", "RS"),
    ];
}

/// Table columns shown in the frontend: labels plus display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Columns {
    pub labels: HashMap<String, String>,
    pub order: Vec<String>,
}

impl Columns {
    fn from_pairs<'a, I: IntoIterator<Item = (&'a str, &'a str)>>(pairs: I) -> Self {
        let mut columns = Columns::default();
        for (key, label) in pairs {
            columns.labels.insert(key.to_string(), label.to_string());
            columns.order.push(key.to_string());
        }
        columns
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RejectionsConfig {
    pub reasons: CommunitySet,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NoexportsConfig {
    pub reasons: CommunitySet,
    pub load_on_demand: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RejectCandidatesConfig {
    pub communities: CommunitySet,
}

/// RPKI validation state encoded in large communities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RpkiState {
    Valid,
    Unknown,
    NotChecked,
    Invalid,
}

/// Large communities tagging the RPKI state of a route.
///
/// Defaults follow the euro-ix large communities proposal:
/// `<asn>:1000:1` valid, `<asn>:1000:2` unknown, `<asn>:1000:3` not checked
/// and `<asn>:1000:4-*` invalid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RpkiConfig {
    pub enabled: bool,
    pub valid: Vec<String>,
    pub unknown: Vec<String>,
    pub not_checked: Vec<String>,
    /// two fixed tokens followed by a single value or a `start, end` range
    pub invalid: Vec<String>,
}

impl RpkiConfig {
    /// Classify a large community, if it is one of the RPKI communities.
    pub fn classify(&self, community: &LargeCommunity) -> Option<RpkiState> {
        let values = [community.0, community.1, community.2];
        if Community::new(&self.valid).matches(&values) {
            return Some(RpkiState::Valid);
        }
        if Community::new(&self.unknown).matches(&values) {
            return Some(RpkiState::Unknown);
        }
        if Community::new(&self.not_checked).matches(&values) {
            return Some(RpkiState::NotChecked);
        }

        match self.invalid.as_slice() {
            [asn, function, value] => Community::new(&[asn, function, value])
                .matches(&values)
                .then_some(RpkiState::Invalid),
            [asn, function, start, end] => {
                let prefix_matches = Community::new(&[asn, function]).matches(&values[..2]);
                let start = start.parse::<u32>().ok()?;
                let end = match end.as_str() {
                    "*" => u32::MAX,
                    end => end.parse::<u32>().ok()?,
                };
                (prefix_matches && (start..=end).contains(&values[2]))
                    .then_some(RpkiState::Invalid)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ThemeConfig {
    pub path: String,
    pub base_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaginationConfig {
    pub routes_filtered_page_size: usize,
    pub routes_accepted_page_size: usize,
    pub routes_not_exported_page_size: usize,
}

/// Everything the frontend needs to render routes and neighbours.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UiConfig {
    pub routes_columns: Columns,
    pub neighbours_columns: Columns,
    pub lookup_columns: Columns,

    pub routes_rejections: RejectionsConfig,
    pub routes_noexports: NoexportsConfig,
    pub routes_reject_candidates: RejectCandidatesConfig,

    pub bgp_communities: CommunitySet,
    pub rpki: RpkiConfig,

    pub theme: ThemeConfig,
    pub pagination: PaginationConfig,
}

impl UiConfig {
    /// Derive the complete UI configuration.
    pub fn from_ini(ini: &IniFile) -> Result<Self, LgError> {
        Ok(UiConfig {
            routes_columns: routes_columns(ini),
            neighbours_columns: neighbours_columns(ini),
            lookup_columns: lookup_columns(ini),
            routes_rejections: routes_rejections(ini),
            routes_noexports: routes_noexports(ini),
            routes_reject_candidates: reject_candidates(ini),
            bgp_communities: bgp_communities(ini),
            rpki: rpki_config(ini)?,
            theme: theme_config(ini),
            pagination: pagination_config(ini),
        })
    }
}

/// Configured columns replace the defaults entirely; an absent or empty
/// section falls back to the defaults.
fn columns(ini: &IniFile, section: &str, defaults: &[(&'static str, &'static str)]) -> Columns {
    let section = ini.section_or_empty(section);
    if section.is_empty() {
        return Columns::from_pairs(defaults.iter().copied());
    }
    Columns::from_pairs(section.keys().iter().map(|(k, v)| (k.as_str(), v.as_str())))
}

/// Columns of the routes table.
pub fn routes_columns(ini: &IniFile) -> Columns {
    columns(ini, "routes_columns", &DEFAULT_ROUTES_COLUMNS)
}

/// Columns of the neighbours table.
pub fn neighbours_columns(ini: &IniFile) -> Columns {
    columns(ini, "neighbours_columns", &DEFAULT_NEIGHBOURS_COLUMNS)
}

/// Columns of the prefix lookup results, where neighbour and route server
/// are nested objects.
pub fn lookup_columns(ini: &IniFile) -> Columns {
    columns(ini, "lookup_columns", &DEFAULT_LOOKUP_COLUMNS)
}

/// Well-known communities extended by the `bgp_communities` section.
pub fn bgp_communities(ini: &IniFile) -> CommunitySet {
    CommunitySet::well_known().merge_from_body(&ini.section_or_empty("bgp_communities").body())
}

pub fn routes_rejections(ini: &IniFile) -> RejectionsConfig {
    RejectionsConfig {
        reasons: CommunitySet::new()
            .merge_from_body(&ini.section_or_empty("rejection_reasons").body()),
    }
}

pub fn routes_noexports(ini: &IniFile) -> NoexportsConfig {
    let base = ini.section_or_empty("noexport");
    NoexportsConfig {
        reasons: CommunitySet::new()
            .merge_from_body(&ini.section_or_empty("noexport_reasons").body()),
        load_on_demand: base.parse_or("load_on_demand", false),
    }
}

/// Communities marking a route as a candidate for rejection, labeled
/// `reject-candidate-<n>` in list order.
pub fn reject_candidates(ini: &IniFile) -> RejectCandidatesConfig {
    let mut communities = CommunitySet::new();
    let raw = ini
        .section_or_empty("rejection_candidates")
        .get_or("communities", "");
    if !raw.trim().is_empty() {
        for (i, community) in raw.split(',').enumerate() {
            communities.set(community, format!("reject-candidate-{}", i + 1));
        }
    }
    RejectCandidatesConfig { communities }
}

/// The ASN of this route server, from `server.asn`.
pub fn own_asn(ini: &IniFile) -> Option<u32> {
    ini.section_or_empty("server")
        .get("asn")
        .and_then(|asn| asn.trim().parse::<u32>().ok())
}

/// First comma separated entry of `key`, split into at most three tokens.
fn configured_triplet(section: &Section, key: &str) -> Option<Vec<String>> {
    let value = section.get(key)?.split(',').next()?.trim();
    if value.is_empty() {
        return None;
    }
    Some(value.splitn(3, ':').map(|t| t.trim().to_string()).collect())
}

pub fn rpki_config(ini: &IniFile) -> Result<RpkiConfig, LgError> {
    let section = ini.section_or_empty("rpki");

    let own_asn = match own_asn(ini) {
        Some(asn) => asn,
        None => {
            warn!("own ASN is not configured, this might lead to unexpected behaviour with BGP large communities");
            0
        }
    }
    .to_string();
    let default = |tag: &str| vec![own_asn.clone(), "1000".to_string(), tag.to_string()];

    let invalid = match configured_triplet(section, "invalid") {
        None => vec![own_asn.clone(), "1000".to_string(), "4".to_string(), "*".to_string()],
        Some(tokens) => {
            // (RS):1000:[range]
            if tokens.len() != 3 {
                return Err(LgError::InvalidRpki(tokens));
            }
            let mut invalid = tokens[..2].to_vec();
            invalid.extend(tokens[2].split('-').map(|t| t.trim().to_string()));
            invalid
        }
    };

    Ok(RpkiConfig {
        enabled: section.parse_or("enabled", false),
        valid: configured_triplet(section, "valid").unwrap_or_else(|| default("1")),
        unknown: configured_triplet(section, "unknown").unwrap_or_else(|| default("2")),
        not_checked: configured_triplet(section, "not_checked").unwrap_or_else(|| default("3")),
        invalid,
    })
}

pub fn theme_config(ini: &IniFile) -> ThemeConfig {
    let section = ini.section_or_empty("theme");
    let base_path = match section.get_or("url_base", "") {
        base if base.is_empty() => DEFAULT_THEME_BASE_PATH.to_string(),
        base => base,
    };
    ThemeConfig {
        path: section.get_or("path", ""),
        base_path,
    }
}

pub fn pagination_config(ini: &IniFile) -> PaginationConfig {
    let section = ini.section_or_empty("pagination");
    PaginationConfig {
        routes_filtered_page_size: section.parse_or("routes_filtered_page_size", 0),
        routes_accepted_page_size: section.parse_or("routes_accepted_page_size", 0),
        routes_not_exported_page_size: section.parse_or("routes_not_exported_page_size", 0),
    }
}
