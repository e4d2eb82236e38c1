use serde::Deserialize;
use std::{fs, path::PathBuf};

use crate::validation::ValidationRules;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("database.db"),
            max_connections: 5,
            busy_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WerkConfig {
    /// Label returned as `werk` by the metadata endpoint.
    pub label: String,
}

impl Default for WerkConfig {
    fn default() -> Self {
        Self {
            label: "Hauptzähler".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub batch_size: usize,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: 500,
            max_retries: 3,
            retry_backoff_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub werk: WerkConfig,
    pub validation: ValidationRules,
    pub import: ImportConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    /// Load the TOML file named by `REPORTING_CONFIG` (default
    /// `reporting-config.toml`), then apply `DB_PATH` and `PORT`.
    ///
    /// A missing default file means "all defaults"; a missing file that was
    /// named explicitly is an error.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let explicit = env::var("REPORTING_CONFIG").ok();
        let path = explicit
            .clone()
            .unwrap_or_else(|| "reporting-config.toml".to_string());

        let mut cfg = match fs::read_to_string(&path) {
            Ok(contents) => Self::from_toml_str(&contents)?,
            Err(e) if explicit.is_none() && e.kind() == std::io::ErrorKind::NotFound => {
                Self::default()
            }
            Err(e) => return Err(anyhow::anyhow!("failed to read config '{path}': {e}")),
        };

        cfg.apply_env_overrides(|key| env::var(key).ok())?;
        Ok(cfg)
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("DB_PATH").filter(|p| !p.trim().is_empty()) {
            self.database.path = PathBuf::from(path);
        }

        if let Some(port) = lookup("PORT").filter(|p| !p.trim().is_empty()) {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid PORT '{port}': {e}"))?;
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
