use std::path::PathBuf;

use trackval_core::chunk::DEFAULT_CHUNK_EXTENSION;
use trackval_core::encoding::DEFAULT_JPEG_QUALITY;
use trackval_core::naming::{self, DEFAULT_DATE_CUTOFF};
use trackval_session::registry::DEFAULT_WARM_CHUNK;
use trackval_session::RegistryConfig;

/// Log output format, from `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT").as_deref() {
            Ok("json") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// Everything except the videos root has a default suitable for a local
/// review session.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Root directory holding `index.txt` and the experiment trees.
    pub videos_root: PathBuf,
    /// Experiment activated at startup.
    pub default_experiment: Option<String>,
    pub date_cutoff: String,
    pub warm_chunk: Option<i64>,
    pub chunk_extension: String,
    pub jpeg_quality: u8,
    pub db_max_connections: u32,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                 |
    /// |--------------------------|-------------------------|
    /// | `HOST`                   | `0.0.0.0`               |
    /// | `PORT`                   | `5000`                  |
    /// | `CORS_ORIGINS`           | `http://localhost:5000` |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`  | `30`                    |
    /// | `FLYHOSTEL_VIDEOS`       | required                |
    /// | `DEFAULT_EXPERIMENT`     | unset                   |
    /// | `EXPERIMENT_DATE_CUTOFF` | `2023-05-23`            |
    /// | `WARM_CHUNK`             | `50` (`none` disables)  |
    /// | `CHUNK_EXTENSION`        | `mp4`                   |
    /// | `JPEG_QUALITY`           | `50`                    |
    /// | `DB_MAX_CONNECTIONS`     | `8`                     |
    ///
    /// Panics on malformed values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let videos_root: PathBuf = std::env::var("FLYHOSTEL_VIDEOS")
            .expect("FLYHOSTEL_VIDEOS must be set")
            .into();

        let default_experiment = std::env::var("DEFAULT_EXPERIMENT")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let date_cutoff =
            std::env::var("EXPERIMENT_DATE_CUTOFF").unwrap_or_else(|_| DEFAULT_DATE_CUTOFF.into());
        naming::parse_cutoff(&date_cutoff).expect("EXPERIMENT_DATE_CUTOFF must be YYYY-MM-DD");

        let warm_chunk = match std::env::var("WARM_CHUNK") {
            Ok(v) if v.eq_ignore_ascii_case("none") => None,
            Ok(v) => Some(v.parse().expect("WARM_CHUNK must be a chunk index or 'none'")),
            Err(_) => Some(DEFAULT_WARM_CHUNK),
        };

        let chunk_extension =
            std::env::var("CHUNK_EXTENSION").unwrap_or_else(|_| DEFAULT_CHUNK_EXTENSION.into());

        let jpeg_quality: u8 = std::env::var("JPEG_QUALITY")
            .map(|v| v.parse().expect("JPEG_QUALITY must be between 1 and 100"))
            .unwrap_or(DEFAULT_JPEG_QUALITY);

        let db_max_connections: u32 = std::env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "8".into())
            .parse()
            .expect("DB_MAX_CONNECTIONS must be a valid u32");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            videos_root,
            default_experiment,
            date_cutoff,
            warm_chunk,
            chunk_extension,
            jpeg_quality,
            db_max_connections,
        }
    }

    /// Registry settings derived from this configuration.
    pub fn registry_config(&self) -> RegistryConfig {
        let mut config = RegistryConfig::new(&self.videos_root);
        if let Ok(cutoff) = naming::parse_cutoff(&self.date_cutoff) {
            config.date_cutoff = cutoff;
        }
        config.warm_chunk = self.warm_chunk;
        config.chunk_extension = self.chunk_extension.clone();
        config.jpeg_quality = self.jpeg_quality;
        config.db_max_connections = self.db_max_connections;
        config
    }
}
