use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "taskboard";

/// Origins always allowed besides the configured client port
const EXTRA_CLIENT_ORIGIN: &str = "http://localhost:3001";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Origins allowed to call the API; empty means the local client dev servers
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_server_port(),
            allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_client_port")]
    pub port: u16,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            port: default_client_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    3000
}

fn default_client_port() -> u16 {
    4200
}

/// Database configuration - re-exported from db crate
pub use db::DatabaseConfig;

impl Config {
    /// Address the API server binds to
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Origins allowed by the CORS policy
    pub fn allowed_origins(&self) -> Vec<String> {
        if !self.server.allowed_origins.is_empty() {
            return self.server.allowed_origins.clone();
        }
        vec![
            format!("http://localhost:{}", self.client.port),
            EXTRA_CLIENT_ORIGIN.to_string(),
        ]
    }

    /// Apply process environment overrides
    ///
    /// `BACKEND_PORT`, `FRONTEND_PORT` and `TASKBOARD_DATABASE_URL` win over the file.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("BACKEND_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid BACKEND_PORT: {}", port))?;
        }
        if let Some(port) = lookup("FRONTEND_PORT") {
            self.client.port = port
                .parse()
                .with_context(|| format!("Invalid FRONTEND_PORT: {}", port))?;
        }
        if let Some(url) = lookup("TASKBOARD_DATABASE_URL") {
            self.database.url = Some(url);
            self.database.path = None;
        }
        Ok(())
    }
}

pub fn get_config_dir() -> Result<PathBuf> {
    // TASKBOARD_CONFIG_PATH overrides the default config directory
    if let Ok(path) = std::env::var("TASKBOARD_CONFIG_PATH") {
        return Ok(PathBuf::from(path));
    }

    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.config_dir().to_path_buf())
        .context("Could not determine config directory")
}

pub fn get_config_file() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}

pub fn get_db_path(config: &Config) -> Result<PathBuf> {
    if let Some(path) = &config.database.path {
        return Ok(path.clone());
    }
    Ok(get_config_dir()?.join("db"))
}

/// Load the config file (defaults when absent) and apply environment overrides
pub fn load_config() -> Result<Config> {
    let mut config = load_config_from(&get_config_file()?)?;
    config.apply_env(|key| std::env::var(key).ok())?;
    Ok(config)
}

pub fn load_config_from(config_file: &Path) -> Result<Config> {
    if !config_file.exists() {
        return Ok(Config::default());
    }

    let contents = fs::read_to_string(config_file)
        .with_context(|| format!("Failed to read config file: {}", config_file.display()))?;

    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", config_file.display()))
}

pub fn save_config(config: &Config) -> Result<()> {
    save_config_to(config, &get_config_file()?)
}

pub fn save_config_to(config: &Config, config_file: &Path) -> Result<()> {
    if let Some(config_dir) = config_file.parent() {
        if !config_dir.exists() {
            fs::create_dir_all(config_dir).with_context(|| {
                format!("Failed to create config directory: {}", config_dir.display())
            })?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let perms = fs::Permissions::from_mode(0o700);
                fs::set_permissions(config_dir, perms)?;
            }
        }
    }

    let contents = toml::to_string_pretty(config)?;
    fs::write(config_file, contents)
        .with_context(|| format!("Failed to write config file: {}", config_file.display()))?;

    // May hold database credentials
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(config_file, perms)?;
    }

    Ok(())
}

pub fn get_config_value(config: &Config, key: &str) -> Option<String> {
    match key {
        "server.host" => Some(config.server.host.clone()),
        "server.port" => Some(config.server.port.to_string()),
        "server.allowed_origins" => Some(config.allowed_origins().join(",")),
        "client.port" => Some(config.client.port.to_string()),
        "database.path" => config.database.path.as_ref().map(|p| p.display().to_string()),
        "database.url" => config.database.url.clone(),
        "database.namespace" => config.database.namespace.clone(),
        "database.username" => config.database.username.clone(),
        "database.password" => Some("********".to_string()), // Don't expose password
        _ => None,
    }
}

pub fn set_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "server.host" => config.server.host = value.to_string(),
        "server.port" => {
            config.server.port = value
                .parse()
                .with_context(|| format!("Invalid port: {}", value))?
        }
        "server.allowed_origins" => {
            config.server.allowed_origins = value
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(String::from)
                .collect()
        }
        "client.port" => {
            config.client.port = value
                .parse()
                .with_context(|| format!("Invalid port: {}", value))?
        }
        // `path` and `url` are exclusive; setting one drops the other
        "database.path" => {
            config.database.path = Some(PathBuf::from(value));
            config.database.url = None;
        }
        "database.url" => {
            config.database.url = Some(value.to_string());
            config.database.path = None;
        }
        "database.namespace" => config.database.namespace = Some(value.to_string()),
        "database.username" => config.database.username = Some(value.to_string()),
        "database.password" => config.database.password = Some(value.to_string()),
        _ => anyhow::bail!("Unknown config key: {}", key),
    }
    Ok(())
}
