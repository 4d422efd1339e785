use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub request_log: RequestLogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub pool_size: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Where the per-module request logs are written.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestLogSettings {
    pub base_dir: PathBuf,
    #[serde(default = "default_central_file")]
    pub central_file: String,
}

fn default_acquire_timeout() -> u64 {
    5
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_central_file() -> String {
    "sistema_completo.log".to_string()
}

impl ApplicationSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied_for_optional_keys() {
        let settings: Settings = config::Config::builder()
            .set_override("database.url", "postgres://localhost/academic_records")
            .unwrap()
            .set_override("database.pool_size", 5)
            .unwrap()
            .set_override("application.host", "127.0.0.1")
            .unwrap()
            .set_override("application.port", 5000)
            .unwrap()
            .set_override("application.log_level", "info")
            .unwrap()
            .set_override("request_log.base_dir", "logs")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.database.acquire_timeout_secs, 5);
        assert_eq!(settings.application.log_format, "pretty");
        assert_eq!(settings.application.request_timeout_secs, 30);
        assert_eq!(settings.request_log.central_file, "sistema_completo.log");
        assert_eq!(settings.application.bind_address(), "127.0.0.1:5000");
    }
}
