//! Environment-backed runtime configuration.

use std::path::PathBuf;

/// Server configuration, read once at startup. Every field has a default so
/// the binary runs without any environment set up.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub data_dir: PathBuf,
    pub public_base_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8911);
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://tender-tracker.db".to_string());
        let data_dir = std::env::var("DATA_DIR").map(PathBuf::from).unwrap_or_else(|_| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("tender-tracker")
        });
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://{host}:{port}"));

        Self {
            host,
            port,
            database_url,
            data_dir,
            public_base_url,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
