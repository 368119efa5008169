use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, Utc};

use crate::ServiceResult;

/// Event tags written to the audit log.
pub mod events {
    pub const INIT_DB: &str = "inicializa_banco";
    pub const ROUTE_ACCESS: &str = "acessa_rota";
    pub const STAT_CREATED: &str = "cria_estatistica";
    pub const STAT_UPDATED: &str = "atualiza_estatistica";
    pub const STAT_DELETED: &str = "remove_estatistica";
}

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub event: String,
    pub description: String,
    /// Seconds since the unix epoch.
    pub timestamp: i64,
}

impl AuditEntry {
    pub fn local_time(&self) -> Option<DateTime<Local>> {
        DateTime::from_timestamp(self.timestamp, 0).map(|utc| utc.with_timezone(&Local))
    }

    /// `YYYY-MM-DD HH:MM:SS` in the server's local time zone.
    pub fn formatted_timestamp(&self) -> Option<String> {
        self.local_time()
            .map(|time| time.format(TIMESTAMP_FORMAT).to_string())
    }
}

/// Append-only event log, independent of the statistics store.
pub trait AuditLog {
    /// Best effort. Implementations swallow every failure (unwritable destination, missing
    /// directory, encoding errors) so that auditing can never fail the operation being audited.
    fn record(&self, event: &str, description: &str);

    /// Every well-formed entry in append order. A log that was never written is empty.
    fn read_all(&self) -> ServiceResult<Vec<AuditEntry>>;
}

pub type ArcAuditLog = Arc<Box<dyn AuditLog + Send + Sync>>;

#[derive(Clone, Default)]
pub struct MockAuditLog {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
}

impl MockAuditLog {
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn events(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.event).collect()
    }
}

impl AuditLog for MockAuditLog {
    fn record(&self, event: &str, description: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(AuditEntry {
                event: event.to_string(),
                description: description.to_string(),
                timestamp: Utc::now().timestamp(),
            });
        }
    }

    fn read_all(&self) -> ServiceResult<Vec<AuditEntry>> {
        Ok(self.entries())
    }
}
