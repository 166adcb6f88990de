use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Root application configuration, loaded from `~/.config/marquee/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub listing: ListingConfig,
    pub filmweb: FilmwebConfig,
    pub omdb: OmdbConfig,
    pub http: HttpConfig,
    pub cache: CacheConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Repertoire page of a single cinema.
    pub url: String,
    /// Only movies released within this many days from today are kept.
    pub window_days: u32,
    /// Titles containing any of these keywords are skipped.
    pub denylist: Vec<String>,
    /// Where to keep a copy of the last fetched listing page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_dump: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilmwebConfig {
    pub search_url: String,
    pub api_url: String,
    pub poster_base_url: String,
    pub app_id: String,
    pub secret: String,
    pub concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OmdbConfig {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable consulted when `api_key` is not set.
    pub api_key_env: String,
    pub concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub snapshot_path: String,
    pub ttl_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            url: "https://multikino.pl/repertuar/gdansk".to_string(),
            window_days: 7,
            denylist: vec![
                "National Theatre Live".to_string(),
                "LIGA MISTRZÓW".to_string(),
                "Balet Bolszoj".to_string(),
                "Met Opera".to_string(),
            ],
            html_dump: None,
        }
    }
}

impl Default for FilmwebConfig {
    fn default() -> Self {
        Self {
            search_url: "http://www.filmweb.pl/search/live".to_string(),
            api_url: "https://ssl.filmweb.pl/api".to_string(),
            poster_base_url: "http://1.fwcdn.pl/po".to_string(),
            app_id: "android".to_string(),
            secret: "qjcGhW2JnvGT9dfCt3uT_jozR3s".to_string(),
            concurrency: 5,
        }
    }
}

impl Default for OmdbConfig {
    fn default() -> Self {
        Self {
            base_url: "http://www.omdbapi.com".to_string(),
            api_key: None,
            api_key_env: "OMDB_API_KEY".to_string(),
            concurrency: 10,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "marquee/0.1".to_string(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("marquee");

        Self {
            snapshot_path: data_dir.join("movies.json").to_string_lossy().to_string(),
            ttl_hours: 24,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/marquee/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("MARQUEE_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("marquee")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to the standard path.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    /// Check everything a refresh needs. Called once at startup.
    pub fn validate(&self) -> Result<()> {
        self.omdb_api_key()?;
        if self.filmweb.concurrency == 0 || self.omdb.concurrency == 0 {
            return Err(CoreError::ValidationError(
                "source concurrency must be at least 1".to_string(),
            ));
        }
        if self.listing.url.trim().is_empty() {
            return Err(CoreError::ValidationError("listing url is empty".to_string()));
        }
        Ok(())
    }

    /// OMDb API key from the config file or from `omdb.api_key_env`.
    pub fn omdb_api_key(&self) -> Result<String> {
        if let Some(key) = self.omdb.api_key.as_deref().map(str::trim)
            && !key.is_empty()
        {
            return Ok(key.to_string());
        }

        std::env::var(&self.omdb.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                CoreError::ConfigError(format!(
                    "No OMDb API key found. Set omdb.api_key in {} or export {}.",
                    Self::config_path().display(),
                    self.omdb.api_key_env
                ))
            })
    }

    // ─── Derived values ────────────────────────────────────

    pub fn snapshot_path(&self) -> PathBuf {
        PathBuf::from(&self.cache.snapshot_path)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_hours * 3600)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }
}
