use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "korero.toml",
    "config/korero.toml",
    "crates/config/korero.toml",
];

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_VAR: &str = "KORERO_CONFIG";

/// Connection string variable used by existing deployments. Wins over every other source.
pub const LEGACY_URI_VAR: &str = "MONGO_URI";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
}

/// Settings for the document database backing the store.
///
/// ```
/// use korero_config::DatabaseConfig;
///
/// let database = DatabaseConfig::default();
/// assert_eq!(database.name, "korero");
/// assert_eq!(database.connect_timeout_seconds, 10);
/// assert!(database.uri.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub uri: String,
    #[serde(default = "DatabaseConfig::default_name")]
    pub name: String,
    #[serde(default = "DatabaseConfig::default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    #[serde(default = "DatabaseConfig::default_max_pool_size")]
    pub max_pool_size: u32,
    #[serde(default = "DatabaseConfig::default_app_name")]
    pub app_name: Option<String>,
}

impl DatabaseConfig {
    fn default_name() -> String {
        "korero".to_string()
    }

    const fn default_connect_timeout() -> u64 {
        10
    }

    const fn default_max_pool_size() -> u32 {
        10
    }

    fn default_app_name() -> Option<String> {
        Some("korero".to_string())
    }

    /// Configuration pointing at `uri` with every other field defaulted.
    pub fn with_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Self::default()
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Reject settings that cannot produce a working connection.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.uri.trim().is_empty() {
            bail!("database uri is not configured (set {LEGACY_URI_VAR} or KORERO__DATABASE__URI)");
        }
        if self.name.trim().is_empty() {
            bail!("database name must not be empty");
        }
        if self.connect_timeout_seconds == 0 {
            bail!("database connect timeout must be at least one second");
        }
        if self.max_pool_size == 0 {
            bail!("database pool size must be at least one");
        }
        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: String::new(),
            name: Self::default_name(),
            connect_timeout_seconds: Self::default_connect_timeout(),
            max_pool_size: Self::default_max_pool_size(),
            app_name: Self::default_app_name(),
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// A `.env` file in the working directory (not its parents) is read first, so
/// its variables take part in the environment layers below.
///
/// ```
/// use korero_config::load;
///
/// std::env::remove_var("KORERO_CONFIG");
/// std::env::set_var("MONGO_URI", "mongodb://localhost:27017");
///
/// let config = load().expect("configuration should load with a uri");
/// assert_eq!(config.database.uri, "mongodb://localhost:27017");
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    if let Ok(cwd) = std::env::current_dir() {
        load_env_file(&cwd)?;
    }

    let defaults = DatabaseConfig::default();

    let mut builder = config::Config::builder()
        .set_default("database.uri", defaults.uri.clone())?
        .set_default("database.name", defaults.name.clone())?
        .set_default(
            "database.connect_timeout_seconds",
            i64::try_from(defaults.connect_timeout_seconds).unwrap_or(i64::MAX),
        )?
        .set_default("database.max_pool_size", i64::from(defaults.max_pool_size))?;

    if let Some(app_name) = defaults.app_name.clone() {
        builder = builder.set_default("database.app_name", app_name)?;
    }

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via {CONFIG_PATH_VAR}");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(config::Environment::with_prefix("KORERO").separator("__"));

    if let Some(uri) = std::env::var(LEGACY_URI_VAR).ok().filter(|uri| !uri.is_empty()) {
        builder = builder.set_override("database.uri", uri)?;
    }

    let cfg = builder.build().context("unable to build configuration")?;

    let config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    config.database.validate().context("invalid database configuration")?;

    debug!(
        database = %config.database.name,
        timeout_seconds = config.database.connect_timeout_seconds,
        "loaded backend configuration"
    );
    Ok(config)
}

/// Read `.env` from `dir` only; parent directories are not searched.
fn load_env_file(dir: &Path) -> anyhow::Result<()> {
    let path = dir.join(".env");
    match dotenvy::from_path(&path) {
        Ok(()) => debug!(path = %path.display(), "loaded environment file"),
        Err(error) if error.not_found() => debug!("no environment file found"),
        Err(error) => {
            return Err(error)
                .with_context(|| format!("unable to read environment file {}", path.display()))
        }
    }
    Ok(())
}
