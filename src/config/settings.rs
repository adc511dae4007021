//! Application configuration from `config.toml` and the environment.
//!
//! Every field has a default, so the service starts in demo mode with no file at
//! all. Environment variables (usually from `.env`) override the file.

use super::plans::{Plan, PlanCatalog};
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Which persistence backend to run against
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Local key/value file with per-user collections
    Demo,
    /// Relational database at `database_url`
    Remote,
}

/// Top-level configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Socket address the HTTP API listens on
    pub bind_addr: String,
    /// Explicit backend choice; inferred from `database_url` when absent
    pub mode: Option<BackendMode>,
    /// `SeaORM` connection string for remote mode
    pub database_url: Option<String>,
    /// File backing the local key/value storage (demo data and sessions)
    pub storage_path: PathBuf,
    /// Change-tracking autosave
    pub autosave: AutosaveConfig,
    /// Demo-mode behaviour
    pub demo: DemoConfig,
    /// Account seeded when no users exist
    pub admin: AdminConfig,
    /// Plan catalog override; empty means the standard plans
    pub plans: Vec<Plan>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            mode: None,
            database_url: None,
            storage_path: PathBuf::from("data/local_storage.json"),
            autosave: AutosaveConfig::default(),
            demo: DemoConfig::default(),
            admin: AdminConfig::default(),
            plans: Vec::new(),
        }
    }
}

/// Autosave timing
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
    /// Countdown length in ticks
    pub period_secs: u32,
    /// Length of one tick
    pub tick_millis: u64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            period_secs: 30,
            tick_millis: 1000,
        }
    }
}

/// Demo-mode settings
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Artificial delay added to every storage call
    pub latency_ms: u64,
    /// Seed two sample clients for users with none
    pub seed_sample_clients: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            latency_ms: 0,
            seed_sample_clients: true,
        }
    }
}

/// Default administrator credentials
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Display name
    pub name: String,
    /// Login e-mail; this account cannot be deleted or deactivated
    pub email: String,
    /// Initial password
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            name: "Administrador".to_string(),
            email: "admin@lumanet.ao".to_string(),
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

const DEFAULT_ADMIN_PASSWORD: &str = "LumaNet2024!";

impl AppConfig {
    /// Backend to use: the explicit `mode`, else remote when a database URL is set.
    #[must_use]
    pub const fn backend_mode(&self) -> BackendMode {
        match (self.mode, &self.database_url) {
            (Some(mode), _) => mode,
            (None, Some(_)) => BackendMode::Remote,
            (None, None) => BackendMode::Demo,
        }
    }

    /// The plan catalog, built from `[[plans]]` or the defaults.
    pub fn catalog(&self) -> Result<PlanCatalog> {
        if self.plans.is_empty() {
            Ok(PlanCatalog::default())
        } else {
            PlanCatalog::new(self.plans.clone())
        }
    }

    /// Applies `LUMANET_*` and `DATABASE_URL` overrides using `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LUMANET_BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Some(v) = lookup("DATABASE_URL") {
            self.database_url = Some(v);
        }
        if let Some(v) = lookup("LUMANET_MODE") {
            self.mode = Some(match v.to_ascii_lowercase().as_str() {
                "demo" => BackendMode::Demo,
                "remote" => BackendMode::Remote,
                other => {
                    return Err(Error::Config {
                        message: format!("LUMANET_MODE must be 'demo' or 'remote', got '{other}'"),
                    });
                }
            });
        }
        if let Some(v) = lookup("LUMANET_STORAGE_PATH") {
            self.storage_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("LUMANET_ADMIN_EMAIL") {
            self.admin.email = v;
        }
        if let Some(v) = lookup("LUMANET_ADMIN_PASSWORD") {
            self.admin.password = v;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.autosave.period_secs == 0 || self.autosave.tick_millis == 0 {
            return Err(Error::Config {
                message: "Autosave period and tick must be positive".to_string(),
            });
        }
        if !self.admin.email.contains('@') {
            return Err(Error::Config {
                message: format!("Admin email '{}' is not an e-mail address", self.admin.email),
            });
        }
        self.catalog()?;
        Ok(())
    }
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads the effective configuration: `LUMANET_CONFIG` (or `./config.toml`) when
/// present, then environment overrides, then validation.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("LUMANET_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let mut config = if Path::new(&path).exists() {
        debug!("Loading configuration from {path}");
        load_config(&path)?
    } else {
        info!("No configuration file at {path}, using defaults");
        AppConfig::default()
    };

    config.apply_env_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;

    if config.admin.password == DEFAULT_ADMIN_PASSWORD {
        warn!("Default administrator password in use; set LUMANET_ADMIN_PASSWORD");
    }
    info!(
        "Configuration loaded: mode={:?}, bind_addr={}",
        config.backend_mode(),
        config.bind_addr
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_run_in_demo_mode() {
        let config = AppConfig::default();
        assert_eq!(config.backend_mode(), BackendMode::Demo);
        assert_eq!(config.autosave.period_secs, 30);
        assert_eq!(config.admin.email, "admin@lumanet.ao");
        assert_eq!(config.catalog().unwrap().plans().len(), 5);
    }

    #[test]
    fn test_database_url_selects_remote_mode() {
        let config = AppConfig {
            database_url: Some("sqlite::memory:".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(config.backend_mode(), BackendMode::Remote);

        let forced_demo = AppConfig {
            mode: Some(BackendMode::Demo),
            ..config
        };
        assert_eq!(forced_demo.backend_mode(), BackendMode::Demo);
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_str = r#"
            bind_addr = "0.0.0.0:8080"
            mode = "remote"

            [autosave]
            period_secs = 10

            [admin]
            email = "root@isp.ao"
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.mode, Some(BackendMode::Remote));
        assert_eq!(config.autosave.period_secs, 10);
        assert_eq!(config.autosave.tick_millis, 1000);
        assert_eq!(config.admin.email, "root@isp.ao");
        assert_eq!(config.admin.name, "Administrador");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("DATABASE_URL", "sqlite://x.sqlite"),
            ("LUMANET_ADMIN_PASSWORD", "s3cret!"),
            ("LUMANET_BIND_ADDR", "0.0.0.0:9000"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_env_overrides(|key| env.get(key).map(ToString::to_string))
            .unwrap();
        assert_eq!(config.backend_mode(), BackendMode::Remote);
        assert_eq!(config.admin.password, "s3cret!");
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
    }

    #[test]
    fn test_invalid_mode_is_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_env_overrides(|key| {
            (key == "LUMANET_MODE").then(|| "cloud".to_string())
        });
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_validate_rejects_zero_period() {
        let mut config = AppConfig::default();
        config.autosave.period_secs = 0;
        assert!(config.validate().is_err());
    }
}
