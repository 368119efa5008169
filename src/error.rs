use matchstats_domain::ServiceError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to initialize logger: {0}")]
    Logger(String),

    #[error("failed to initialize statistics store: {0}")]
    Store(#[from] ServiceError),

    #[error("http server error: {0}")]
    Server(#[from] std::io::Error),
}
