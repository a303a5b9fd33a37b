use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_repository_root")]
    pub repository_root: PathBuf,
    /// Catalog database file. Defaults to `catalog.db` inside the repository root.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub api: ApiConfig,
    /// Proxy used by `open --url --tor`.
    #[serde(default = "default_tor_proxy")]
    pub tor_proxy: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_repository_root() -> PathBuf {
    PathBuf::from("./repository")
}

fn default_tor_proxy() -> String {
    "socks5h://127.0.0.1:9050".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            repository_root: default_repository_root(),
            database_path: None,
            api: ApiConfig::default(),
            tor_proxy: default_tor_proxy(),
        }
    }
}

impl AppConfig {
    pub fn catalog_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| self.repository_root.join("catalog.db"))
    }
}

/// Loads `Config.toml` (or the file named by `VAULT_CONFIG`) if present, then
/// applies `VAULT_*` environment overrides, e.g. `VAULT_API__PORT=9000`.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let name = env::var("VAULT_CONFIG").unwrap_or_else(|_| "Config".to_string());
    let builder = Config::builder()
        .add_source(ConfigFile::with_name(&name).required(false))
        .add_source(
            Environment::with_prefix("VAULT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
