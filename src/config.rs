use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::AppError;

pub const UPSERT_CHUNK_SIZE: usize = 50;
pub const REQUEST_TIMEOUT_SECONDS: u64 = 10;
pub const MIRROR_ATTEMPT_TIMEOUT_SECONDS: u64 = 60;
pub const IMPORT_TIMEOUT_SECONDS: u64 = 300;
pub const MIRROR_COOLDOWN_SECONDS: u64 = 15 * 60;
pub const RANK_LENGTH_WARNING: usize = 64;
pub const IMPORT_PLACEHOLDER_NAME: &str = "Imported Playlist";
pub const SOUNDCLOUD_OEMBED_URL: &str = "https://soundcloud.com/oembed";

const DEFAULT_MIRRORS: &[&str] = &[
    "https://pipedapi.kavin.rocks",
    "https://pipedapi.adminforge.de",
    "https://api.piped.private.coffee",
];

pub fn get_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tunefold")
}

pub fn get_config_file_path() -> PathBuf {
    get_config_dir().join("config.json")
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub database_path: PathBuf,
    pub upsert_chunk_size: usize,
    /// Per HTTP request.
    pub provider_timeout_secs: u64,
    /// Per call against one mirror, pagination included.
    pub mirror_attempt_timeout_secs: u64,
    /// Whole fetch stage of one import, failover included.
    pub import_timeout_secs: u64,
    pub mirror_cooldown_secs: u64,
    pub youtube_mirrors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spotify: Option<SpotifyCredentials>,
    pub soundcloud_oembed_url: String,
    pub rank_length_warning: usize,
    pub import_placeholder_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_path: get_config_dir().join("library.db"),
            upsert_chunk_size: UPSERT_CHUNK_SIZE,
            provider_timeout_secs: REQUEST_TIMEOUT_SECONDS,
            mirror_attempt_timeout_secs: MIRROR_ATTEMPT_TIMEOUT_SECONDS,
            import_timeout_secs: IMPORT_TIMEOUT_SECONDS,
            mirror_cooldown_secs: MIRROR_COOLDOWN_SECONDS,
            youtube_mirrors: DEFAULT_MIRRORS.iter().map(|m| m.to_string()).collect(),
            spotify: None,
            soundcloud_oembed_url: SOUNDCLOUD_OEMBED_URL.to_string(),
            rank_length_warning: RANK_LENGTH_WARNING,
            import_placeholder_name: IMPORT_PLACEHOLDER_NAME.to_string(),
        }
    }
}

impl EngineConfig {
    /// Loads the config file at `path` (or the default location), falling back
    /// to defaults when the file does not exist, then applies env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(get_config_file_path);

        let mut config = if path.exists() {
            let content = fs::read_to_string(&path)?;
            let config: EngineConfig = serde_json::from_str(&content)?;
            log::info!("Loaded configuration from {:?}", path);
            config
        } else {
            log::info!("No configuration at {:?}, using defaults", path);
            EngineConfig::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("TUNEFOLD_DATABASE") {
            self.database_path = PathBuf::from(path);
        }
        if let (Some(client_id), Some(client_secret)) = (
            var("TUNEFOLD_SPOTIFY_CLIENT_ID"),
            var("TUNEFOLD_SPOTIFY_CLIENT_SECRET"),
        ) {
            self.spotify = Some(SpotifyCredentials {
                client_id,
                client_secret,
            });
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.upsert_chunk_size == 0 {
            return Err(AppError::Config("upsert_chunk_size must be at least 1".into()));
        }
        for (name, secs) in [
            ("provider_timeout_secs", self.provider_timeout_secs),
            ("mirror_attempt_timeout_secs", self.mirror_attempt_timeout_secs),
            ("import_timeout_secs", self.import_timeout_secs),
        ] {
            if secs == 0 {
                return Err(AppError::Config(format!("{} must be at least 1", name)));
            }
        }
        if self.import_timeout_secs < self.mirror_attempt_timeout_secs {
            return Err(AppError::Config(
                "import_timeout_secs must not be shorter than mirror_attempt_timeout_secs".into(),
            ));
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn mirror_attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.mirror_attempt_timeout_secs)
    }

    pub fn import_timeout(&self) -> Duration {
        Duration::from_secs(self.import_timeout_secs)
    }

    pub fn mirror_cooldown(&self) -> Duration {
        Duration::from_secs(self.mirror_cooldown_secs)
    }
}
