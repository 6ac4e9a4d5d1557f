//! Server configuration
//!
//! Priority: environment variables > config file > defaults. Everything is
//! read once here and handed to the core as plain values.

use crate::error::ServerError;
use crate::middleware::ReplayRendering;
use ryw_core::{ConsistencyConfig, CookieAttributes};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "ryw.toml";

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server bind address
    pub addr: SocketAddr,
    /// Consistency protocol defaults
    pub consistency: ConsistencyConfig,
    /// How replay directives are rendered
    pub replay: ReplayRendering,
    /// Attributes for minted and deleted cookies
    pub cookie: CookieAttributes,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            consistency: ConsistencyConfig::new(default_instance_id()),
            replay: ReplayRendering::default(),
            cookie: CookieAttributes::default(),
        }
    }
}

/// Host name of this machine, or `localhost` when it cannot be determined
pub fn default_instance_id() -> String {
    sysinfo::System::host_name()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

impl Config {
    /// Load a TOML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ServerError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str::<Config>(&content).map_err(|source| {
            ServerError::ConfigFile {
                path: path.to_path_buf(),
                source,
            }
        })?;
        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load configuration from the process environment and config file
    ///
    /// An explicit `config_path` must exist; otherwise `ryw.toml` is used
    /// when present.
    pub fn from_env(config_path: Option<&Path>) -> Result<Self, ServerError> {
        Self::load(config_path, |var| std::env::var(var).ok())
    }

    /// Load configuration with a custom variable lookup
    pub fn load<F>(config_path: Option<&Path>, lookup: F) -> Result<Self, ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    tracing::debug!("Config file not found: {:?}", default_path);
                    Self::default()
                }
            }
        };
        config.apply_env(lookup)?;
        if config.consistency.current_instance.trim().is_empty() {
            config.consistency.current_instance = default_instance_id();
        }
        Ok(config)
    }

    /// Overlay environment variables on top of the current values
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("RYW_ADDR") {
            self.addr = addr
                .parse()
                .map_err(|_| ServerError::invalid_env("RYW_ADDR", addr))?;
        }

        let consistency = &mut self.consistency;
        if let Some(dir) = lookup("LITEFS_DIR") {
            consistency.marker_dir = Some(PathBuf::from(dir));
        }
        if let Some(name) = lookup("DATABASE_FILENAME") {
            consistency.database_name = Some(name);
        }
        if let Some(instance) = lookup("RYW_INSTANCE_ID") {
            consistency.current_instance = instance;
        }
        if let Some(value) = lookup("RYW_POLL_INTERVAL_MS") {
            consistency.poll.interval_ms = parse_env("RYW_POLL_INTERVAL_MS", value)?;
        }
        if let Some(value) = lookup("RYW_POLL_TIMEOUT_MS") {
            consistency.poll.timeout_ms = parse_env("RYW_POLL_TIMEOUT_MS", value)?;
        }
        if let Some(app) = lookup("FLY_APP_NAME") {
            consistency.app_name = Some(app);
        }
        if let Some(value) = lookup("PORT") {
            consistency.port = Some(parse_env("PORT", value)?);
        }

        if let Some(value) = lookup("RYW_REPLAY_RENDERING") {
            self.replay = value
                .parse()
                .map_err(|_| ServerError::invalid_env("RYW_REPLAY_RENDERING", value))?;
        }
        if let Some(value) = lookup("RYW_COOKIE_SECURE") {
            self.cookie.secure = parse_env("RYW_COOKIE_SECURE", value)?;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ServerError> {
        self.consistency.validate()?;
        Ok(())
    }

    /// Set a new bind address
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ServerError> {
    value
        .trim()
        .parse()
        .map_err(|_| ServerError::invalid_env(var, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.addr.port(), 8080);
        assert_eq!(config.replay, ReplayRendering::Conflict);
        assert!(config.cookie.secure);
        assert!(!config.consistency.current_instance.is_empty());
        assert!(config.consistency.marker_dir.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(lookup(&[
                ("RYW_ADDR", "0.0.0.0:3000"),
                ("LITEFS_DIR", "/litefs"),
                ("DATABASE_FILENAME", "sqlite.db"),
                ("RYW_INSTANCE_ID", "machine-1"),
                ("RYW_POLL_INTERVAL_MS", "15"),
                ("RYW_POLL_TIMEOUT_MS", "750"),
                ("FLY_APP_NAME", "my-app"),
                ("PORT", "3000"),
                ("RYW_REPLAY_RENDERING", "redirect"),
                ("RYW_COOKIE_SECURE", "false"),
            ]))
            .unwrap();

        assert_eq!(config.addr, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
        let c = &config.consistency;
        assert_eq!(c.marker_dir.as_deref(), Some(Path::new("/litefs")));
        assert_eq!(c.database_name.as_deref(), Some("sqlite.db"));
        assert_eq!(c.current_instance, "machine-1");
        assert_eq!(c.poll.interval_ms, 15);
        assert_eq!(c.poll.timeout_ms, 750);
        assert_eq!(c.app_name.as_deref(), Some("my-app"));
        assert_eq!(c.port, Some(3000));
        assert_eq!(config.replay, ReplayRendering::Redirect);
        assert!(!config.cookie.secure);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = Config::default();
        let err = config
            .apply_env(lookup(&[("RYW_POLL_TIMEOUT_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ServerError::InvalidEnv {
                var: "RYW_POLL_TIMEOUT_MS",
                ..
            }
        ));

        let err = config
            .apply_env(lookup(&[("RYW_REPLAY_RENDERING", "teleport")]))
            .unwrap_err();
        assert!(matches!(err, ServerError::InvalidEnv { .. }));
    }

    #[test]
    fn test_file_then_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ryw.toml");
        std::fs::write(
            &path,
            r#"
addr = "127.0.0.1:9000"
replay = "redirect"

[consistency]
marker_dir = "/from-file"
database_name = "file.db"
current_instance = "file-host"

[consistency.poll]
timeout_ms = 1000

[cookie]
path = "/app"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path), lookup(&[("LITEFS_DIR", "/from-env")])).unwrap();
        assert_eq!(config.addr.port(), 9000);
        assert_eq!(config.replay, ReplayRendering::Redirect);
        assert_eq!(
            config.consistency.marker_dir.as_deref(),
            Some(Path::new("/from-env"))
        );
        assert_eq!(config.consistency.database_name.as_deref(), Some("file.db"));
        assert_eq!(config.consistency.current_instance, "file-host");
        assert_eq!(config.consistency.poll.timeout_ms, 1000);
        assert_eq!(config.consistency.poll.interval_ms, 30);
        assert_eq!(config.cookie.path.as_deref(), Some("/app"));
        assert!(config.cookie.http_only);
    }

    #[test]
    fn test_instance_defaults_to_host_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ryw.toml");
        std::fs::write(&path, "[consistency]\nmarker_dir = \"/litefs\"\n").unwrap();

        let config = Config::load(Some(&path), lookup(&[])).unwrap();
        assert_eq!(config.consistency.current_instance, default_instance_id());
    }

    #[test]
    fn test_bad_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ryw.toml");
        std::fs::write(&path, "addr = 12").unwrap();

        let err = Config::load(Some(&path), lookup(&[])).unwrap_err();
        assert!(matches!(err, ServerError::ConfigFile { .. }));
    }

    #[test]
    fn test_missing_explicit_config_file() {
        let err = Config::load(Some(Path::new("/nonexistent/ryw.toml")), lookup(&[])).unwrap_err();
        assert!(matches!(err, ServerError::Io(_)));
    }

    #[test]
    #[serial_test::serial]
    fn test_from_process_env() {
        // SAFETY: serialized with other env-mutating tests
        unsafe {
            std::env::set_var("RYW_INSTANCE_ID", "env-host");
        }
        let config = Config::from_env(None).unwrap();
        unsafe {
            std::env::remove_var("RYW_INSTANCE_ID");
        }
        assert_eq!(config.consistency.current_instance, "env-host");
    }
}
