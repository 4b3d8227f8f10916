//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides; a `.env`
//! file is loaded by the binaries before this runs.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// SQLite database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,

    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

fn default_database_path() -> String {
    "fpl.db".to_string()
}

fn default_busy_timeout() -> u64 {
    5000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the HTML pages and assets served under /static
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// Allowed CORS origins; empty means same-origin only
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_static_dir() -> String {
    "static".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Shared admin credential for all write routes
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,

    #[serde(default = "default_admin_password")]
    pub password: String,

    /// Realm sent in the WWW-Authenticate challenge
    #[serde(default = "default_realm")]
    pub realm: String,
}

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "password";

fn default_admin_username() -> String {
    DEFAULT_ADMIN_USERNAME.to_string()
}

fn default_admin_password() -> String {
    DEFAULT_ADMIN_PASSWORD.to_string()
}

fn default_realm() -> String {
    "FPL Tracker".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            password: default_admin_password(),
            realm: default_realm(),
        }
    }
}

impl AuthConfig {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    /// True while the built-in admin/password pair is still in place
    pub fn uses_default_credentials(&self) -> bool {
        self.username == DEFAULT_ADMIN_USERNAME && self.password == DEFAULT_ADMIN_PASSWORD
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Load from `FPL_CONFIG`, then default locations, then defaults.
    ///
    /// An explicit `FPL_CONFIG` that fails to load is an error; a broken
    /// file in a default location is skipped and reported in `warnings`.
    pub fn load_default() -> Result<LoadedConfig, ConfigError> {
        let explicit = std::env::var_os("FPL_CONFIG").map(PathBuf::from);
        let candidates: Vec<PathBuf> = [
            Some(PathBuf::from("./config.toml")),
            dirs::config_dir().map(|p| p.join("fpl-tracker").join("config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self::discover(explicit, &candidates, |key| std::env::var(key).ok())
    }

    /// Resolve a config from an explicit path or the first loadable
    /// candidate, then apply overrides from `lookup`.
    ///
    /// Nothing is logged here; callers log `warnings` once tracing is up.
    pub fn discover<F>(
        explicit: Option<PathBuf>,
        candidates: &[PathBuf],
        lookup: F,
    ) -> Result<LoadedConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();

        let (mut config, source) = match explicit {
            Some(path) => (Self::load(&path)?, Some(path)),
            None => {
                let mut found = None;
                for path in candidates.iter().filter(|p| p.exists()) {
                    match Self::load(path) {
                        Ok(config) => {
                            found = Some((config, path.clone()));
                            break;
                        }
                        Err(e) => warnings.push(format!("Skipped config file: {}", e)),
                    }
                }
                match found {
                    Some((config, path)) => (config, Some(path)),
                    None => (Config::default(), None),
                }
            }
        };

        warnings.extend(config.apply_overrides(lookup));

        Ok(LoadedConfig {
            config,
            source,
            warnings,
        })
    }

    /// Apply overrides from any key lookup (the process environment in
    /// production, a map in tests). Returns a warning per ignored value.
    fn apply_overrides<F>(&mut self, lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();

        // Database overrides
        if let Some(path) = lookup("FPL_DATABASE_PATH") {
            self.database.path = path;
        }

        // Server overrides
        if let Some(host) = lookup("FPL_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("FPL_PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => warnings.push(format!("Ignoring invalid FPL_PORT value {:?}", port)),
            }
        }
        if let Some(dir) = lookup("FPL_STATIC_DIR") {
            self.server.static_dir = dir;
        }

        // Admin credentials keep their original, unprefixed names
        if let Some(username) = lookup("ADMIN_USERNAME") {
            self.auth.username = username;
        }
        if let Some(password) = lookup("ADMIN_PASSWORD") {
            self.auth.password = password;
        }

        // Logging overrides
        if let Some(level) = lookup("FPL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("FPL_LOG_FORMAT") {
            self.logging.format = format;
        }

        warnings
    }
}

/// A resolved config plus what went wrong on the way
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    /// File the config was read from, `None` for built-in defaults
    pub source: Option<PathBuf>,
    pub warnings: Vec<String>,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# FPL Tracker Configuration
#
# Environment variables override these settings:
# - FPL_DATABASE_PATH
# - FPL_HOST
# - FPL_PORT
# - FPL_STATIC_DIR
# - ADMIN_USERNAME
# - ADMIN_PASSWORD
# - FPL_LOG_LEVEL
# - FPL_LOG_FORMAT

[database]
# SQLite database file (created on first start)
path = "fpl.db"

# How long to wait on a locked database (ms)
busy_timeout_ms = 5000

[server]
# Server host
host = "0.0.0.0"

# Server port
port = 8000

# Directory with the dashboard pages and assets
static_dir = "static"

# Allowed CORS origins (empty = same-origin only)
cors_origins = []

[auth]
# Shared admin credential for adding and editing players and scores.
# Change these before exposing the dashboard.
username = "admin"
password = "password"

# Realm shown in the browser's login prompt
realm = "FPL Tracker"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
