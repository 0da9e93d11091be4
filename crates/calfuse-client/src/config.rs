//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/calfuse/config.toml` by default:
//!
//! ```toml
//! [google]
//! access_token = "env::GOOGLE_TOKEN"
//!
//! [outlook]
//! access_token = "pass::work/outlook-token"
//!
//! [[ics]]
//! name = "team"
//! url = "https://example.com/team.ics"
//!
//! [cache]
//! freshness_minutes = 30
//! ```
//!
//! Credential values (`access_token`, `username`, `password`) accept secret
//! references, see [`crate::secret`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use calfuse_engine::EngineConfig;
use serde::{Deserialize, Serialize};

#[cfg(feature = "ics")]
use calfuse_providers::ics::{IcsConfig, IcsMode};

/// Configuration for the calfuse client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Google Calendar settings.
    #[cfg(feature = "google")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google: Option<GoogleSettings>,

    /// Outlook calendar settings.
    #[cfg(feature = "outlook")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlook: Option<OutlookSettings>,

    /// ICS feeds and CalDAV collections, queried in the listed order.
    #[cfg(feature = "ics")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ics: Vec<IcsSettings>,

    /// Cache settings.
    pub cache: CacheSettings,
}

impl ClientConfig {
    /// Loads configuration from the default path, or defaults if the file
    /// does not exist.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        Self::parse(&content).map_err(|e| format!("failed to parse {}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("calfuse")
            .join("config.toml")
    }

    /// Returns the default cache directory.
    pub fn default_cache_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("calfuse")
    }

    /// Number of provider sections present.
    pub fn provider_count(&self) -> usize {
        let google = usize::from(cfg!(feature = "google") && self.google.is_some());
        let outlook = usize::from(cfg!(feature = "outlook") && self.outlook.is_some());
        let ics = if cfg!(feature = "ics") { self.ics.len() } else { 0 };
        google + outlook + ics
    }
}

fn timeout_from(secs: Option<u64>) -> Option<Duration> {
    secs.map(Duration::from_secs)
}

fn resolve_field(section: &str, field: &str, value: Option<&str>) -> Result<String, String> {
    let raw = value.ok_or_else(|| format!("`{}` is missing from [{}]", field, section))?;
    crate::secret::resolve(raw).map_err(|e| format!("failed to resolve {}.{}: {}", section, field, e))
}

// ---------------------------------------------------------------------------
// Google
// ---------------------------------------------------------------------------

/// Google Calendar settings.
#[cfg(feature = "google")]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoogleSettings {
    /// OAuth access token (supports `env::` and `pass::` prefixes).
    pub access_token: Option<String>,

    /// Calendar to read, `primary` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[cfg(feature = "google")]
impl GoogleSettings {
    /// Resolves the token and builds the adapter configuration.
    pub fn to_provider_config(&self) -> Result<calfuse_providers::google::GoogleConfig, String> {
        use calfuse_providers::google::GoogleConfig;

        let token = resolve_field("google", "access_token", self.access_token.as_deref())?;
        let mut config = GoogleConfig::new(token);
        if let Some(ref id) = self.calendar_id {
            config = config.with_calendar_id(id);
        }
        if let Some(ref base) = self.api_base {
            config = config.with_api_base(base);
        }
        if let Some(timeout) = timeout_from(self.timeout_secs) {
            config = config.with_timeout(timeout);
        }
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Outlook
// ---------------------------------------------------------------------------

/// Outlook calendar settings.
#[cfg(feature = "outlook")]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutlookSettings {
    /// OAuth access token (supports `env::` and `pass::` prefixes).
    pub access_token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[cfg(feature = "outlook")]
impl OutlookSettings {
    pub fn to_provider_config(
        &self,
    ) -> Result<calfuse_providers::outlook::OutlookConfig, String> {
        use calfuse_providers::outlook::OutlookConfig;

        let token = resolve_field("outlook", "access_token", self.access_token.as_deref())?;
        let mut config = OutlookConfig::new(token);
        if let Some(ref base) = self.api_base {
            config = config.with_api_base(base);
        }
        if let Some(timeout) = timeout_from(self.timeout_secs) {
            config = config.with_timeout(timeout);
        }
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// ICS / CalDAV
// ---------------------------------------------------------------------------

/// How an `[[ics]]` entry is read.
#[cfg(feature = "ics")]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IcsModeSetting {
    #[default]
    Feed,
    Caldav,
}

#[cfg(feature = "ics")]
impl From<IcsModeSetting> for IcsMode {
    fn from(mode: IcsModeSetting) -> Self {
        match mode {
            IcsModeSetting::Feed => IcsMode::Feed,
            IcsModeSetting::Caldav => IcsMode::CalDav,
        }
    }
}

/// One `[[ics]]` entry.
#[cfg(feature = "ics")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IcsSettings {
    /// Name used in logs and errors, `ics` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub url: String,

    #[serde(default)]
    pub mode: IcsModeSetting,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[cfg(feature = "ics")]
fn default_verify_tls() -> bool {
    true
}

#[cfg(feature = "ics")]
impl IcsSettings {
    /// Name of the provider built from this entry.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("ics")
    }

    pub fn to_provider_config(&self) -> Result<IcsConfig, String> {
        let section = format!("ics.{}", self.display_name());
        let mut config = IcsConfig::new(&self.url)
            .map_err(|e| format!("invalid url `{}` in [{}]: {}", self.url, section, e))?
            .with_name(self.display_name())
            .with_mode(self.mode.into());

        match (&self.username, &self.password) {
            (None, None) => {}
            (Some(_), Some(_)) => {
                let username = resolve_field(&section, "username", self.username.as_deref())?;
                let password = resolve_field(&section, "password", self.password.as_deref())?;
                config = config.with_credentials(username, password);
            }
            _ => {
                return Err(format!(
                    "[{}] needs both username and password, or neither",
                    section
                ));
            }
        }

        if !self.verify_tls {
            config = config.with_insecure_tls();
        }
        if let Some(timeout) = timeout_from(self.timeout_secs) {
            config = config.with_timeout(timeout);
        }
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Directory holding cache files, the user cache directory when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Key of the cache entry.
    pub key: String,

    /// Minutes a cache entry is served without refetching.
    pub freshness_minutes: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            dir: None,
            key: EngineConfig::DEFAULT_CACHE_KEY.to_string(),
            freshness_minutes: 60,
        }
    }
}

impl CacheSettings {
    pub fn cache_dir(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(ClientConfig::default_cache_dir)
    }

    pub fn engine_config(&self) -> Result<EngineConfig, String> {
        if self.key.trim().is_empty() {
            return Err("[cache] key must not be empty".to_string());
        }
        if self.freshness_minutes == 0 {
            return Err("[cache] freshness_minutes must be at least 1".to_string());
        }
        let freshness = i64::try_from(self.freshness_minutes)
            .ok()
            .and_then(chrono::Duration::try_minutes)
            .ok_or_else(|| "[cache] freshness_minutes is too large".to_string())?;
        Ok(EngineConfig::default()
            .with_cache_key(&self.key)
            .with_freshness(freshness))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = ClientConfig::parse("").unwrap();
        assert_eq!(config.provider_count(), 0);
        assert_eq!(config.cache, CacheSettings::default());

        let engine = config.cache.engine_config().unwrap();
        assert_eq!(engine, EngineConfig::default());
    }

    #[test]
    fn cache_section() {
        let config = ClientConfig::parse(
            r#"
[cache]
dir = "/var/cache/calfuse"
key = "work"
freshness_minutes = 15
"#,
        )
        .unwrap();
        assert_eq!(config.cache.cache_dir(), PathBuf::from("/var/cache/calfuse"));

        let engine = config.cache.engine_config().unwrap();
        assert_eq!(engine.cache_key, "work");
        assert_eq!(engine.freshness, chrono::Duration::minutes(15));
    }

    #[test]
    fn zero_freshness_is_rejected() {
        let settings = CacheSettings {
            freshness_minutes: 0,
            ..Default::default()
        };
        assert!(settings.engine_config().is_err());
    }

    #[test]
    fn oversized_freshness_is_rejected() {
        let config = ClientConfig::parse(&format!("[cache]\nfreshness_minutes = {}\n", i64::MAX)).unwrap();
        let err = config.cache.engine_config().unwrap_err();
        assert!(err.contains("too large"));

        let settings = CacheSettings {
            freshness_minutes: u64::MAX,
            ..Default::default()
        };
        assert!(settings.engine_config().is_err());

        let settings = CacheSettings {
            freshness_minutes: 60 * 24 * 365,
            ..Default::default()
        };
        assert_eq!(settings.engine_config().unwrap().freshness, chrono::Duration::days(365));
    }

    #[test]
    fn unknown_syntax_is_reported() {
        assert!(ClientConfig::parse("[cache\nkey = 1").is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[cache]\nkey = \"from-file\"\n").unwrap();

        let config = ClientConfig::load_from(&path).unwrap();
        assert_eq!(config.cache.key, "from-file");

        let err = ClientConfig::load_from(&dir.path().join("missing.toml")).unwrap_err();
        assert!(err.contains("failed to read"));
    }

    #[cfg(feature = "google")]
    #[test]
    fn google_section_with_env_token() {
        unsafe {
            std::env::set_var("_CALFUSE_CFG_GOOGLE_TOKEN", "ya29.token");
        }
        let config = ClientConfig::parse(
            r#"
[google]
access_token = "env::_CALFUSE_CFG_GOOGLE_TOKEN"
calendar_id = "team@example.com"
timeout_secs = 5
"#,
        )
        .unwrap();
        let google = config.google.unwrap().to_provider_config().unwrap();
        assert_eq!(google.access_token, "ya29.token");
        assert_eq!(google.calendar_id, "team@example.com");
        assert_eq!(google.timeout, Duration::from_secs(5));
        unsafe {
            std::env::remove_var("_CALFUSE_CFG_GOOGLE_TOKEN");
        }
    }

    #[cfg(feature = "google")]
    #[test]
    fn google_section_without_token_errors() {
        let config = ClientConfig::parse("[google]\n").unwrap();
        let err = config.google.unwrap().to_provider_config().unwrap_err();
        assert!(err.contains("access_token"));
    }

    #[cfg(feature = "outlook")]
    #[test]
    fn outlook_section() {
        let config = ClientConfig::parse(
            r#"
[outlook]
access_token = "plain-token"
api_base = "http://localhost:8080/api"
"#,
        )
        .unwrap();
        let outlook = config.outlook.unwrap().to_provider_config().unwrap();
        assert_eq!(outlook.access_token, "plain-token");
        assert_eq!(outlook.api_base, "http://localhost:8080/api");
    }

    #[cfg(feature = "ics")]
    #[test]
    fn ics_entries_keep_order() {
        let config = ClientConfig::parse(
            r#"
[[ics]]
name = "team"
url = "https://example.com/team.ics"

[[ics]]
name = "nextcloud"
url = "https://cloud.example.com/remote.php/dav/calendars/me/work/"
mode = "caldav"
username = "me"
password = "hunter2"
verify_tls = false
"#,
        )
        .unwrap();
        assert_eq!(config.provider_count(), 2);

        let team = config.ics[0].to_provider_config().unwrap();
        assert_eq!(team.name, "team");
        assert_eq!(team.mode, IcsMode::Feed);
        assert!(team.verify_tls);

        let cloud = config.ics[1].to_provider_config().unwrap();
        assert_eq!(cloud.mode, IcsMode::CalDav);
        assert!(cloud.has_credentials());
        assert!(!cloud.verify_tls);
    }

    #[cfg(feature = "ics")]
    #[test]
    fn ics_half_credentials_errors() {
        let config = ClientConfig::parse(
            r#"
[[ics]]
url = "https://example.com/a.ics"
username = "me"
"#,
        )
        .unwrap();
        let err = config.ics[0].to_provider_config().unwrap_err();
        assert!(err.contains("both username and password"));
    }

    #[cfg(feature = "ics")]
    #[test]
    fn ics_bad_url_errors() {
        let config = ClientConfig::parse("[[ics]]\nurl = \"not a url\"\n").unwrap();
        assert!(config.ics[0].to_provider_config().is_err());
    }

    #[test]
    fn dump_round_trips() {
        let config = ClientConfig::parse("[cache]\nfreshness_minutes = 5\n").unwrap();
        let text = toml::to_string_pretty(&config).unwrap();
        let back = ClientConfig::parse(&text).unwrap();
        assert_eq!(back.cache, config.cache);
    }
}
