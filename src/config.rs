//! Host configuration.
//!
//! Loaded from an optional TOML file, then `SWITCHYARD_*` environment
//! variables (`SWITCHYARD_SERVER__PORT=9000`), over built-in defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Error;

/// Config file looked up when none is named (extension optional).
pub const DEFAULT_CONFIG_FILE: &str = "switchyard";

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub http: HttpConfig,
    pub paths: PathsConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug, Deserialize)]
pub struct HttpConfig {
    /// Largest request body accepted, in bytes.
    pub max_body_size: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PathsConfig {
    /// Static files served when no route matches.
    pub document_root: PathBuf,
    /// Files a forwarded view is rendered from.
    pub views: PathBuf,
    /// Where uploaded files are written.
    pub uploads: PathBuf,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Seconds a session may go unused before it is dropped.
    pub idle_timeout_secs: u64,
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    /// Loads `switchyard.toml` (if present), the environment and defaults.
    pub fn load() -> Result<Self, Error> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Loads the file at `config_path` (if present), the environment and
    /// defaults.
    pub fn load_from(config_path: &str) -> Result<Self, Error> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("SWITCHYARD")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("http.max_body_size", 104_857_600)? // 100MB
            .set_default("paths.document_root", "public")?
            .set_default("paths.views", "views")?
            .set_default("paths.uploads", "uploads")?
            .set_default("session.cookie_name", "SWITCHYARDSESSID")?
            .set_default("session.idle_timeout_secs", 1800)? // 30 min
            .set_default("logging.level", "info")?
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, Error> {
        Ok(format!("{}:{}", self.server.host, self.server.port).parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_a_file() {
        let config = Config::load_from("switchyard-test-no-such-file").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.http.max_body_size, 104_857_600);
        assert_eq!(config.paths.uploads, PathBuf::from("uploads"));
        assert_eq!(config.session.cookie_name, "SWITCHYARDSESSID");
        assert_eq!(config.session.idle_timeout(), Duration::from_secs(1800));
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = std::env::temp_dir().join(format!("switchyard-config-{}", uuid::Uuid::new_v4().simple()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("app.toml");
        std::fs::write(&file, "[server]\nport = 9001\n\n[paths]\nviews = \"templates\"\n").unwrap();

        let config = Config::load_from(file.to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 9001);
        assert_eq!(config.paths.views, PathBuf::from("templates"));
        assert_eq!(config.paths.document_root, PathBuf::from("public"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn environment_overrides_use_single_underscore_prefix() {
        // `logging.level` is asserted nowhere else.
        unsafe { std::env::set_var("SWITCHYARD_LOGGING__LEVEL", "debug") };
        let config = Config::load_from("switchyard-test-no-such-file");
        unsafe { std::env::remove_var("SWITCHYARD_LOGGING__LEVEL") };

        assert_eq!(config.unwrap().logging.level, "debug");
    }
}
