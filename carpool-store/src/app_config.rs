use carpool_core::PasswordCost;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    #[serde(default)]
    pub password: PasswordCost,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 { 5 }
fn default_acquire_timeout() -> u64 { 3 }
fn default_run_migrations() -> bool { true }

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// The single frontend origin allowed to call the API.
    pub allowed_origin: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Untracked local overrides
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(environment())
            .build()?;

        s.try_deserialize()
    }
}

/// `CARPOOL_<SECTION>__<KEY>`, e.g. `CARPOOL_DATABASE__URL=postgres://...`.
/// The prefix takes a single underscore; nesting takes two.
fn environment() -> config::Environment {
    config::Environment::with_prefix("CARPOOL")
        .prefix_separator("_")
        .separator("__")
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn minimal_file_fills_defaults() {
        let cfg = parse(
            r#"
            [server]
            port = 3001

            [database]
            url = "postgres://localhost/carpool"

            [cors]
            allowed_origin = "http://localhost:3000"
            "#,
        );

        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.database.backend, Backend::Postgres);
        assert_eq!(cfg.database.max_connections, 5);
        assert!(cfg.database.run_migrations);
        assert_eq!(cfg.password.iterations, PasswordCost::default().iterations);
    }

    #[test]
    fn env_overrides_use_single_underscore_after_prefix() {
        let mut vars = config::Map::new();
        vars.insert("CARPOOL_DATABASE__URL".to_string(), "postgres://from-env/carpool".to_string());
        vars.insert("CARPOOL_SERVER__PORT".to_string(), "9090".to_string());

        let cfg: Config = config::Config::builder()
            .add_source(File::from_str(
                r#"
                [server]
                port = 3001

                [database]
                url = "postgres://localhost/carpool"

                [cors]
                allowed_origin = "http://localhost:3000"
                "#,
                FileFormat::Toml,
            ))
            .add_source(environment().source(Some(vars)))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.database.url, "postgres://from-env/carpool");
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.cors.allowed_origin, "http://localhost:3000");
        assert_eq!(cfg.database.backend, Backend::Postgres);
    }

    #[test]
    fn memory_backend_needs_no_url() {
        let cfg = parse(
            r#"
            [server]
            port = 8080

            [database]
            backend = "memory"

            [cors]
            allowed_origin = "https://rides.example.edu"

            [password]
            iterations = 3
            "#,
        );

        assert_eq!(cfg.database.backend, Backend::Memory);
        assert!(cfg.database.url.is_empty());
        assert_eq!(cfg.password.iterations, 3);
        assert_eq!(cfg.password.memory_kib, PasswordCost::default().memory_kib);
    }
}
