use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use thiserror::Error;

const DEFAULT_PORT: u16 = 5001;
const DB_FILE_NAME: &str = "estatisticas.db";
const AUDIT_LOG_FILE_NAME: &str = "log.csv";
const DEFAULT_SEED_PATH: &str = "data/estatisticas.csv";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub http_addr: SocketAddr,
    /// Only the temp directory is writable and every request may hit a fresh instance.
    pub serverless: bool,
    pub db_path: PathBuf,
    pub audit_log_path: PathBuf,
    pub seed_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let serverless = var("VERCEL").is_some() || var("VERCEL_ENV").is_some();

        let host = match var("MATCHSTATS_HTTP_HOST") {
            Some(host) => host.trim().parse::<IpAddr>().map_err(|_| ConfigError::Invalid {
                name: "MATCHSTATS_HTTP_HOST",
                expected: "IP address",
                value: host,
            })?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };

        let port = match var("MATCHSTATS_HTTP_PORT") {
            Some(port) => port.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "MATCHSTATS_HTTP_PORT",
                expected: "u16",
                value: port,
            })?,
            None => DEFAULT_PORT,
        };

        let (default_db_path, default_audit_log_path) = if serverless {
            let tmp = std::env::temp_dir();
            (tmp.join(DB_FILE_NAME), tmp.join(AUDIT_LOG_FILE_NAME))
        } else {
            (
                PathBuf::from(DB_FILE_NAME),
                PathBuf::from("logs").join(AUDIT_LOG_FILE_NAME),
            )
        };

        Ok(Self {
            http_addr: SocketAddr::new(host, port),
            serverless,
            db_path: var("MATCHSTATS_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(default_db_path),
            audit_log_path: var("MATCHSTATS_AUDIT_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(default_audit_log_path),
            seed_path: var("MATCHSTATS_SEED_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SEED_PATH)),
        })
    }
}
