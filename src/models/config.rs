//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::FieldMap;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Upstream source settings
    #[serde(default)]
    pub source: SourceConfig,

    /// HTTP fetching behavior
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Listing page layout and filters
    #[serde(default)]
    pub listing: ListingConfig,

    /// Output locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Detail page label-to-field mapping
    #[serde(default)]
    pub detail: FieldMap,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.source.base_url.trim().is_empty() {
            return Err(AppError::validation("source.base_url is empty"));
        }
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetch.user_agent is empty"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::validation("fetch.timeout_secs must be > 0"));
        }
        if self.fetch.max_concurrent == 0 {
            return Err(AppError::validation("fetch.max_concurrent must be > 0"));
        }
        if self.listing.min_columns == 0 {
            return Err(AppError::validation("listing.min_columns must be > 0"));
        }
        if self.detail.fields.is_empty() {
            return Err(AppError::validation("No detail field mappings defined"));
        }
        Ok(())
    }
}

/// Upstream source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the voting database
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Path of the listing page, relative to the base URL
    #[serde(default = "defaults::listing_path")]
    pub listing_path: String,

    /// Dataset schema version written into the artifact header
    #[serde(default = "defaults::data_version")]
    pub data_version: String,

    /// Source attribution list for the artifact header
    #[serde(default = "defaults::sources")]
    pub sources: Vec<String>,
}

impl SourceConfig {
    /// Full URL of the listing page.
    pub fn listing_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.listing_path
        )
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            listing_path: defaults::listing_path(),
            data_version: defaults::data_version(),
            sources: defaults::sources(),
        }
    }
}

/// HTTP client and retry behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Retries after the first attempt for transient failures
    #[serde(default = "defaults::retries")]
    pub retries: u32,

    /// Base backoff delay between retries, multiplied by the attempt number
    #[serde(default = "defaults::backoff_ms")]
    pub backoff_ms: u64,

    /// Delay between completed requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Maximum concurrent requests
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            retries: defaults::retries(),
            backoff_ms: defaults::backoff_ms(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Listing page layout and row filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// CSS selector for listing rows
    #[serde(default = "defaults::row_selector")]
    pub row_selector: String,

    /// Minimum number of cells a usable row carries
    #[serde(default = "defaults::min_columns")]
    pub min_columns: usize,

    /// Legal form to keep (other ballot types are skipped)
    #[serde(default = "defaults::legal_form")]
    pub legal_form: String,

    /// `chrono` format of dates on the source pages
    #[serde(default = "defaults::date_format")]
    pub date_format: String,

    /// Keep only votes whose date has not passed and whose result cells
    /// are still empty
    #[serde(default = "defaults::require_upcoming")]
    pub require_upcoming: bool,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            row_selector: defaults::row_selector(),
            min_columns: defaults::min_columns(),
            legal_form: defaults::legal_form(),
            date_format: defaults::date_format(),
            require_upcoming: defaults::require_upcoming(),
        }
    }
}

/// Output locations for the published artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Output directory for artifact and manifest
    #[serde(default = "defaults::output")]
    pub output: PathBuf,

    /// Artifact file name inside the output directory
    #[serde(default = "defaults::artifact_file")]
    pub artifact_file: String,

    /// Manifest file name inside the output directory
    #[serde(default = "defaults::manifest_file")]
    pub manifest_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output: defaults::output(),
            artifact_file: defaults::artifact_file(),
            manifest_file: defaults::manifest_file(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Source defaults
    pub fn base_url() -> String {
        "https://swissvotes.ch".into()
    }
    pub fn listing_path() -> String {
        "/votes?page=0".into()
    }
    pub fn data_version() -> String {
        "1.0".into()
    }
    pub fn sources() -> Vec<String> {
        vec!["https://swissvotes.ch".into(), "https://www.admin.ch".into()]
    }

    // Fetch defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; initiatives-crawler/1.0)".into()
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn retries() -> u32 {
        2
    }
    pub fn backoff_ms() -> u64 {
        500
    }
    pub fn request_delay() -> u64 {
        100
    }
    pub fn max_concurrent() -> usize {
        4
    }

    // Listing defaults
    pub fn row_selector() -> String {
        "tr".into()
    }
    pub fn min_columns() -> usize {
        7
    }
    pub fn legal_form() -> String {
        "Volksinitiative".into()
    }
    pub fn date_format() -> String {
        "%d.%m.%Y".into()
    }
    pub fn require_upcoming() -> bool {
        true
    }

    // Path defaults
    pub fn output() -> PathBuf {
        PathBuf::from("data")
    }
    pub fn artifact_file() -> String {
        "initiatives.json".into()
    }
    pub fn manifest_file() -> String {
        "manifest.json".into()
    }
}
