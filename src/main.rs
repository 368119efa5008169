use std::sync::Arc;

use log::{error, info};
use matchstats_audit_csv::CsvAuditLog;
use matchstats_domain::service::{StatService, StatServiceImpl};
use matchstats_http_api::AppState;
use matchstats_persistence_sqlite::stats::SqliteStatRepository;

use crate::{config::Config, error::StartupError};

mod config;
mod error;
mod logs;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received. Preparing graceful exit...");
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();

    logs::init_logger()?;

    let config = Config::from_env()?;
    info!(
        "Using database {}, audit log {}, seed data {}{}",
        config.db_path.display(),
        config.audit_log_path.display(),
        config.seed_path.display(),
        if config.serverless {
            " (serverless mode)"
        } else {
            ""
        }
    );

    let stat_repository = SqliteStatRepository::new(&config.db_path, &config.seed_path)?;
    let audit_log = CsvAuditLog::new(&config.audit_log_path);
    let stat_service = StatServiceImpl::new(
        Arc::new(Box::new(stat_repository)),
        Arc::new(Box::new(audit_log)),
    );

    let seeded = stat_service.bootstrap().await?;
    info!("Statistics store ready ({} rows seeded)", seeded);

    let state = AppState {
        stat_service: Arc::new(Box::new(stat_service)),
    };

    info!("Starting application");
    matchstats_http_api::run(
        state,
        config.http_addr,
        config.serverless,
        shutdown_signal(),
    )
    .await?;

    Ok(())
}
