use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use log::info;
use matchstats_domain::{
    ServiceError, ServiceResult,
    stats::{MatchStats, StatCount, StatId, StatRecord},
};

use crate::{ApiError, AppState, payload::StatPayload};

#[derive(serde::Serialize, Debug, Clone)]
pub struct JsonStatRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<StatId>,
    name: String,
    kills: StatCount,
    deaths: StatCount,
    assists: StatCount,
    damage: StatCount,
    earnings: StatCount,
    date: String,
    /// `null` when `deaths` is zero.
    kd_ratio: Option<f64>,
}

impl JsonStatRecord {
    pub fn from_stats(id: Option<StatId>, stats: &MatchStats) -> Self {
        Self {
            id,
            name: stats.name.to_string(),
            kills: stats.kills,
            deaths: stats.deaths,
            assists: stats.assists,
            damage: stats.damage,
            earnings: stats.earnings,
            date: stats.date.clone(),
            kd_ratio: stats.kd_ratio(),
        }
    }
}

impl From<&StatRecord> for JsonStatRecord {
    fn from(record: &StatRecord) -> Self {
        Self::from_stats(Some(record.id), &record.stats)
    }
}

#[derive(serde::Serialize)]
pub struct JsonMessage {
    message: String,
}

fn parse_stat_id(id: &str) -> ServiceResult<StatId> {
    id.trim()
        .parse()
        .map_err(|e| ServiceError::BadRequest(format!("Invalid statistic ID '{}': {}", id, e)))
}

pub async fn list(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<JsonStatRecord>>, ApiError> {
    let records = app_state.stat_service.list_stats().await?;
    Ok(Json(records.iter().map(JsonStatRecord::from).collect()))
}

pub async fn get_by_id(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
) -> Result<Json<JsonStatRecord>, ApiError> {
    let id = parse_stat_id(&id)?;
    let record = app_state.stat_service.get_stat(id).await?;
    Ok(Json(JsonStatRecord::from(&record)))
}

pub async fn create(
    State(app_state): State<AppState>,
    StatPayload(fields): StatPayload,
) -> Result<(StatusCode, Json<JsonStatRecord>), ApiError> {
    let record = app_state.stat_service.create_stat(&fields).await?;
    info!("Statistic {} created", record.id);
    Ok((StatusCode::CREATED, Json(JsonStatRecord::from(&record))))
}

pub async fn update(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    StatPayload(fields): StatPayload,
) -> Result<Json<JsonStatRecord>, ApiError> {
    let id = parse_stat_id(&id)?;
    let record = app_state.stat_service.update_stat(id, &fields).await?;
    info!("Statistic {} updated", id);
    Ok(Json(JsonStatRecord::from(&record)))
}

pub async fn delete(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
) -> Result<Json<JsonMessage>, ApiError> {
    let id = parse_stat_id(&id)?;
    app_state.stat_service.delete_stat(id).await?;
    info!("Statistic {} deleted", id);
    Ok(Json(JsonMessage {
        message: format!("Statistic {} deleted", id),
    }))
}
