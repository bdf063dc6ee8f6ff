//! Layered run configuration.
//!
//! # Sources (later wins)
//!
//! ```text
//! defaults  <  ~/.stocksync/config.yaml (or --config <path>)  <  environment
//! ```
//!
//! The result is an immutable [`SyncConfig`] handed to every component at
//! construction. Nothing reads the environment after [`SyncConfig::load`]
//! returns.
//!
//! # API pattern
//!
//! - `load(file)`: reads the process environment and the default config file
//! - `load_with(file, env)`: explicit inputs; used in tests

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::LocationId;

pub const DEFAULT_API_VERSION: &str = "2024-07";
pub const DEFAULT_TAG: &str = "Manuel";
pub const DEFAULT_LOCATION_NAME: &str = "adopt1toy";
pub const DEFAULT_FEED_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_UPDATE_DELAY: Duration = Duration::from_millis(150);
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(30 * 60);
/// Longest accepted loop interval (one year).
pub const MAX_SYNC_INTERVAL_MINUTES: u64 = 365 * 24 * 60;

/// Loop interval for `minutes`, or `None` outside `1..=MAX_SYNC_INTERVAL_MINUTES`.
pub fn sync_interval_from_minutes(minutes: u64) -> Option<Duration> {
    if !(1..=MAX_SYNC_INTERVAL_MINUTES).contains(&minutes) {
        return None;
    }
    minutes.checked_mul(60).map(Duration::from_secs)
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub shop: ShopConfig,
    pub feed: FeedConfig,
    pub catalog: CatalogConfig,
    pub location: LocationTarget,
    pub update: UpdateConfig,
    /// Append-only CSV of update attempts; disabled when `None`.
    pub run_log_path: Option<PathBuf>,
    /// Pause between passes in loop mode.
    pub sync_interval: Duration,
}

#[derive(Clone, PartialEq, Eq)]
pub struct ShopConfig {
    /// Scheme + host, no trailing slash (e.g. `https://adopt1toy.myshopify.com`).
    pub base_url: String,
    pub access_token: String,
    pub api_version: String,
}

impl ShopConfig {
    /// `https://{shop}/admin/api/{version}`
    pub fn admin_url(&self) -> String {
        format!("{}/admin/api/{}", self.base_url, self.api_version)
    }
}

impl fmt::Debug for ShopConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShopConfig")
            .field("base_url", &self.base_url)
            .field("access_token", &"<redacted>")
            .field("api_version", &self.api_version)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub url: String,
    pub timeout: Duration,
    pub delimiter: FeedDelimiter,
    pub on_failure: FeedFailurePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub tag: String,
    pub tag_match: TagMatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateConfig {
    pub policy: UpdatePolicy,
    pub connect_first: bool,
    /// Fixed pause between consecutive update calls.
    pub delay: Duration,
}

/// How the target stock location is determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationTarget {
    /// Used as-is, no lookup.
    Id(LocationId),
    /// Case-insensitive name match against the platform's location list.
    Name(String),
}

impl fmt::Display for LocationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationTarget::Id(id) => write!(f, "id {id}"),
            LocationTarget::Name(name) => write!(f, "name '{name}'"),
        }
    }
}

// ---------------------------------------------------------------------------
// Enum options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedDelimiter {
    /// Pick `;` or `,` from the header line.
    #[default]
    Auto,
    Comma,
    Semicolon,
}

/// What a feed transfer failure does to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedFailurePolicy {
    /// Abort the run.
    #[default]
    Strict,
    /// Warn and continue with an empty feed (nothing matches).
    Tolerate,
}

/// Where the tag filter is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagMatch {
    /// `tag=` query parameter; the platform does the matching.
    #[default]
    Server,
    /// Fetch everything and check the product's tag list locally.
    Client,
}

/// When a matched variant is updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdatePolicy {
    /// Only when the reported quantity differs from the feed (or is unknown).
    #[default]
    OnMismatch,
    /// On every SKU match.
    Always,
}

impl FromStr for FeedDelimiter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "comma" | "," => Ok(Self::Comma),
            "semicolon" | ";" => Ok(Self::Semicolon),
            _ => Err("expected: auto, comma, semicolon".to_string()),
        }
    }
}

impl FromStr for FeedFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "tolerate" => Ok(Self::Tolerate),
            _ => Err("expected: strict, tolerate".to_string()),
        }
    }
}

impl FromStr for TagMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server" => Ok(Self::Server),
            "client" => Ok(Self::Client),
            _ => Err("expected: server, client".to_string()),
        }
    }
}

impl FromStr for UpdatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on-mismatch" | "on_mismatch" | "mismatch" => Ok(Self::OnMismatch),
            "always" => Ok(Self::Always),
            _ => Err("expected: on-mismatch, always".to_string()),
        }
    }
}

impl fmt::Display for UpdatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdatePolicy::OnMismatch => write!(f, "on-mismatch"),
            UpdatePolicy::Always => write!(f, "always"),
        }
    }
}

// ---------------------------------------------------------------------------
// Raw (unresolved) layer
// ---------------------------------------------------------------------------

/// Every key optional; the YAML file and the environment both fill this in.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawConfig {
    pub shop: Option<String>,
    pub token: Option<String>,
    pub api_version: Option<String>,
    pub feed_url: Option<String>,
    pub feed_timeout_secs: Option<u64>,
    pub feed_delimiter: Option<String>,
    pub feed_failure: Option<String>,
    pub product_tag: Option<String>,
    pub tag_match: Option<String>,
    pub location_id: Option<u64>,
    pub location_name: Option<String>,
    pub update_policy: Option<String>,
    pub connect_before_set: Option<bool>,
    pub update_delay_ms: Option<u64>,
    pub run_log_path: Option<PathBuf>,
    pub sync_interval_minutes: Option<u64>,
}

impl RawConfig {
    /// Parse a YAML config file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay environment variables. Empty values count as unset.
    pub fn apply_env(&mut self, env: &HashMap<String, String>) -> Result<(), ConfigError> {
        let get = |key: &str| {
            env.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };

        if let Some(v) = get("SHOPIFY_SHOP") {
            self.shop = Some(v);
        }
        if let Some(v) = get("SHOPIFY_TOKEN") {
            self.token = Some(v);
        }
        if let Some(v) = get("SHOPIFY_API_VERSION") {
            self.api_version = Some(v);
        }
        if let Some(v) = get("FEED_URL").or_else(|| get("DREAMLOVE_CSV_URL")) {
            self.feed_url = Some(v);
        }
        if let Some(v) = get("FEED_TIMEOUT_SECS") {
            self.feed_timeout_secs = Some(parse_number("FEED_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = get("FEED_DELIMITER") {
            self.feed_delimiter = Some(v);
        }
        if let Some(v) = get("FEED_FAILURE") {
            self.feed_failure = Some(v);
        }
        if let Some(v) = get("PRODUCT_TAG") {
            self.product_tag = Some(v);
        }
        if let Some(v) = get("TAG_MATCH") {
            self.tag_match = Some(v);
        }
        if let Some(v) = get("STOCK_LOCATION_ID") {
            self.location_id = Some(parse_number("STOCK_LOCATION_ID", &v)?);
        }
        if let Some(v) = get("STOCK_LOCATION_NAME") {
            self.location_name = Some(v);
        }
        if let Some(v) = get("UPDATE_POLICY") {
            self.update_policy = Some(v);
        }
        if let Some(v) = get("CONNECT_BEFORE_SET") {
            self.connect_before_set = Some(parse_bool("CONNECT_BEFORE_SET", &v)?);
        }
        if let Some(v) = get("UPDATE_DELAY_MS") {
            self.update_delay_ms = Some(parse_number("UPDATE_DELAY_MS", &v)?);
        }
        if let Some(v) = get("RUN_LOG_PATH") {
            self.run_log_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get("SYNC_INTERVAL_MINUTES") {
            self.sync_interval_minutes = Some(parse_number("SYNC_INTERVAL_MINUTES", &v)?);
        }
        Ok(())
    }

    /// Fill defaults and validate. Required keys are checked before anything
    /// else so the error names the first missing one.
    pub fn resolve(self) -> Result<SyncConfig, ConfigError> {
        let shop = non_blank(self.shop).ok_or(ConfigError::Missing { key: "SHOPIFY_SHOP" })?;
        let token = non_blank(self.token).ok_or(ConfigError::Missing { key: "SHOPIFY_TOKEN" })?;
        let feed_url =
            non_blank(self.feed_url).ok_or(ConfigError::Missing { key: "DREAMLOVE_CSV_URL" })?;

        let location = match (self.location_id, non_blank(self.location_name)) {
            (Some(id), _) => LocationTarget::Id(LocationId(id)),
            (None, Some(name)) => LocationTarget::Name(name),
            (None, None) => LocationTarget::Name(DEFAULT_LOCATION_NAME.to_string()),
        };

        let sync_interval = match self.sync_interval_minutes {
            Some(minutes) => {
                sync_interval_from_minutes(minutes).ok_or_else(|| ConfigError::Invalid {
                    key: "SYNC_INTERVAL_MINUTES",
                    value: minutes.to_string(),
                    reason: format!("must be between 1 and {MAX_SYNC_INTERVAL_MINUTES}"),
                })?
            }
            None => DEFAULT_SYNC_INTERVAL,
        };

        Ok(SyncConfig {
            shop: ShopConfig {
                base_url: normalize_shop_url(&shop),
                access_token: token,
                api_version: non_blank(self.api_version)
                    .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            },
            feed: FeedConfig {
                url: feed_url,
                timeout: self
                    .feed_timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_FEED_TIMEOUT),
                delimiter: parse_option("FEED_DELIMITER", self.feed_delimiter)?,
                on_failure: parse_option("FEED_FAILURE", self.feed_failure)?,
            },
            catalog: CatalogConfig {
                tag: non_blank(self.product_tag).unwrap_or_else(|| DEFAULT_TAG.to_string()),
                tag_match: parse_option("TAG_MATCH", self.tag_match)?,
            },
            location,
            update: UpdateConfig {
                policy: parse_option("UPDATE_POLICY", self.update_policy)?,
                connect_first: self.connect_before_set.unwrap_or(true),
                delay: self
                    .update_delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or(DEFAULT_UPDATE_DELAY),
            },
            run_log_path: self.run_log_path,
            sync_interval,
        })
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// `~/.stocksync/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".stocksync").join("config.yaml"))
}

impl SyncConfig {
    /// Load from `file` (or the default config file when it exists) and the
    /// process environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let default_path = default_config_path().filter(|p| p.is_file());
        let file = file.or(default_path.as_deref());
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::load_with(file, &env)
    }

    /// Load from explicit inputs. A given `file` must exist.
    pub fn load_with(file: Option<&Path>, env: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut raw = match file {
            Some(path) => RawConfig::from_yaml_file(path)?,
            None => RawConfig::default(),
        };
        raw.apply_env(env)?;
        raw.resolve()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Accept a bare domain or a full URL; always return scheme + host without a
/// trailing slash.
fn normalize_shop_url(shop: &str) -> String {
    let shop = shop.trim().trim_end_matches('/');
    if shop.starts_with("https://") || shop.starts_with("http://") {
        shop.to_string()
    } else {
        format!("https://{shop}")
    }
}

fn parse_option<T>(key: &'static str, value: Option<String>) -> Result<T, ConfigError>
where
    T: FromStr<Err = String> + Default,
{
    match non_blank(value) {
        None => Ok(T::default()),
        Some(v) => v.parse().map_err(|reason| ConfigError::Invalid {
            key,
            value: v,
            reason,
        }),
    }
}

fn parse_number(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: "expected a non-negative integer".to_string(),
    })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
