//! Configuration handling for a harvest run.
//!
//! Everything the harvester needs to know about remote hosts lives in an
//! explicit `HarvestConfig` built once at startup and passed down. The
//! `HarvestConfig::from_env` constructor starts from the built-in defaults and
//! applies `HARVEST_*` environment overrides, so the binary can be pointed at
//! mirrors or a local mock server without code changes.

use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Environment variable names. Public so tests and wrappers can refer to them.
pub const ENV_DBLP_BASE: &str = "HARVEST_DBLP_BASE";
pub const ENV_ACM_BASE: &str = "HARVEST_ACM_BASE";
pub const ENV_IEEE_BASE: &str = "HARVEST_IEEE_BASE";
pub const ENV_USENIX_BASE: &str = "HARVEST_USENIX_BASE";
pub const ENV_USER_AGENT: &str = "HARVEST_USER_AGENT";

const DEFAULT_DBLP_BASE: &str = "https://dblp.org/db/conf";
const DEFAULT_ACM_BASE: &str = "https://dl.acm.org";
const DEFAULT_IEEE_BASE: &str = "https://ieeexplore.ieee.org";
const DEFAULT_USENIX_BASE: &str = "https://www.usenix.org";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; paperharvest/0.1)";

const DEFAULT_MAX_PAGE_BYTES: u64 = 5 * 1024 * 1024; // 5MB
const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 100 * 1024 * 1024; // 100MB

/// Years scraped for the structured source when none are given.
pub const DEFAULT_USENIX_YEARS: [&str; 6] = ["20", "21", "22", "23", "24", "25"];
/// Submission terms scraped for the structured source when none are given.
pub const DEFAULT_USENIX_TERMS: [&str; 6] =
    ["summer", "spring", "fall", "winter", "cycle1", "cycle2"];

/// Base URLs of the remote hosts, without trailing slashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// dblp conference index, e.g. `https://dblp.org/db/conf`.
    pub dblp_base: String,
    /// ACM digital library host serving `/doi/pdf/<doi>`.
    pub acm_base: String,
    /// IEEE Xplore host serving `/stamp/stamp.jsp`.
    pub ieee_base: String,
    /// USENIX site serving the accepted-papers pages.
    pub usenix_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            dblp_base: DEFAULT_DBLP_BASE.to_string(),
            acm_base: DEFAULT_ACM_BASE.to_string(),
            ieee_base: DEFAULT_IEEE_BASE.to_string(),
            usenix_base: DEFAULT_USENIX_BASE.to_string(),
        }
    }
}

impl Endpoints {
    /// Point every endpoint at the same host. Used by tests against a mock server.
    pub fn all_at(base: &str) -> Self {
        let base = trim_base(base);
        Self {
            dblp_base: base.clone(),
            acm_base: base.clone(),
            ieee_base: base.clone(),
            usenix_base: base,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("dblp_base", &self.dblp_base),
            ("acm_base", &self.acm_base),
            ("ieee_base", &self.ieee_base),
            ("usenix_base", &self.usenix_base),
        ] {
            Url::parse(value).map_err(|e| ConfigError::InvalidValue {
                field,
                reason: format!("{value}: {e}"),
            })?;
        }
        Ok(())
    }
}

/// Application runtime configuration.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub endpoints: Endpoints,
    /// Politeness delay for sources that download every candidate document.
    pub document_delay: Duration,
    /// Politeness delay for the metadata-first source.
    pub metadata_delay: Duration,
    /// Documents with this many pages or fewer are skipped.
    pub min_pages: usize,
    /// Number of leading pages searched by the keyword filter.
    pub window_pages: usize,
    /// Retries per fetch for retriable failures; 0 disables retrying.
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
    /// Cap for listing and landing pages.
    pub max_page_bytes: u64,
    /// Cap for downloaded documents.
    pub max_document_bytes: u64,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            document_delay: Duration::from_secs(10),
            metadata_delay: Duration::from_millis(100),
            min_pages: 6,
            window_pages: 3,
            max_retries: 0,
            base_backoff: Duration::from_secs(2),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_page_bytes: DEFAULT_MAX_PAGE_BYTES,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }
}

impl HarvestConfig {
    /// Load from environment variables, falling back to the built-in defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(value) = env::var(ENV_DBLP_BASE) {
            config.endpoints.dblp_base = trim_base(&value);
        }
        if let Ok(value) = env::var(ENV_ACM_BASE) {
            config.endpoints.acm_base = trim_base(&value);
        }
        if let Ok(value) = env::var(ENV_IEEE_BASE) {
            config.endpoints.ieee_base = trim_base(&value);
        }
        if let Ok(value) = env::var(ENV_USENIX_BASE) {
            config.endpoints.usenix_base = trim_base(&value);
        }
        if let Ok(value) = env::var(ENV_USER_AGENT) {
            config.user_agent = value;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoints.validate()?;
        if self.window_pages == 0 {
            return Err(ConfigError::InvalidValue {
                field: "window_pages",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "user_agent",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// How a venue's listing is turned into documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFamily {
    /// dblp listing, ACM DOIs rewritten straight to the PDF endpoint.
    DoiDirect,
    /// dblp listing, IEEE DOIs resolved through the stamp landing page.
    StampIndirect,
    /// USENIX accepted-papers pages with per-paper metadata blocks.
    StructuredArticle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueSpec {
    pub id: String,
    pub display_name: String,
    pub family: SourceFamily,
}

impl VenueSpec {
    pub fn new(id: &str, display_name: &str, family: SourceFamily) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            family,
        }
    }
}

/// Read-only venue table consulted once at startup.
#[derive(Debug, Clone)]
pub struct VenueRegistry {
    venues: BTreeMap<String, VenueSpec>,
}

impl VenueRegistry {
    pub fn builtin() -> Self {
        let mut registry = Self {
            venues: BTreeMap::new(),
        };
        registry.register(VenueSpec::new("ccs", "ACM CCS", SourceFamily::DoiDirect));
        registry.register(VenueSpec::new(
            "sp",
            "IEEE S&P",
            SourceFamily::StampIndirect,
        ));
        registry.register(VenueSpec::new(
            "usenix",
            "USENIX Security",
            SourceFamily::StructuredArticle,
        ));
        registry
    }

    pub fn register(&mut self, spec: VenueSpec) {
        self.venues.insert(spec.id.clone(), spec);
    }

    pub fn lookup(&self, venue: &str) -> Result<&VenueSpec, ConfigError> {
        self.venues
            .get(&venue.trim().to_lowercase())
            .ok_or_else(|| ConfigError::UnsupportedVenue {
                venue: venue.to_string(),
                supported: self.ids().join(", "),
            })
    }

    pub fn ids(&self) -> Vec<&str> {
        self.venues.keys().map(String::as_str).collect()
    }
}

/// Scope parameters whose cross product yields the listing pages of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestScope {
    pub years: Vec<String>,
    pub terms: Vec<String>,
}

impl HarvestScope {
    /// Build the scope for a venue, filling family defaults and rejecting
    /// missing required parameters.
    pub fn for_venue(
        venue: &VenueSpec,
        years: Vec<String>,
        terms: Vec<String>,
    ) -> Result<Self, ConfigError> {
        match venue.family {
            SourceFamily::DoiDirect | SourceFamily::StampIndirect => {
                if years.is_empty() {
                    return Err(ConfigError::MissingScope("year"));
                }
                Ok(Self {
                    years,
                    terms: Vec::new(),
                })
            }
            SourceFamily::StructuredArticle => {
                let years = if years.is_empty() {
                    DEFAULT_USENIX_YEARS.iter().map(|y| y.to_string()).collect()
                } else {
                    years
                };
                let terms = if terms.is_empty() {
                    DEFAULT_USENIX_TERMS.iter().map(|t| t.to_string()).collect()
                } else {
                    terms
                };
                Ok(Self { years, terms })
            }
        }
    }
}

fn trim_base(value: &str) -> String {
    value.trim().trim_end_matches('/').to_string()
}

/// Errors that can occur while building a configuration. All of them are
/// fatal and surface before any network activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("venue '{venue}' is not supported (supported: {supported})")]
    UnsupportedVenue { venue: String, supported: String },

    #[error("missing required scope parameter: {0}")]
    MissingScope(&'static str),

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
