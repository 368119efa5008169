use axum::{Json, extract::State};
use matchstats_domain::audit::AuditEntry;

use crate::{ApiError, AppState};

#[derive(serde::Serialize, Debug, Clone)]
pub struct JsonAuditEntry {
    event: String,
    description: String,
    timestamp: String,
}

impl JsonAuditEntry {
    fn from_entry(entry: AuditEntry) -> Option<Self> {
        let timestamp = entry.formatted_timestamp()?;
        Some(Self {
            event: entry.event,
            description: entry.description,
            timestamp,
        })
    }
}

pub async fn list_logs(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<JsonAuditEntry>>, ApiError> {
    let entries = app_state.stat_service.list_logs()?;
    Ok(Json(
        entries
            .into_iter()
            .filter_map(JsonAuditEntry::from_entry)
            .collect(),
    ))
}
