pub mod dashboard;
pub mod logs;
pub mod profile;
pub mod workouts;

use crate::errors::AppError;
use crate::models::AppData;
use crate::state::AppState;
use crate::stats::parse_date;
use crate::storage::persist_data;
use crate::sync::Topic;
use axum::Json;
use chrono::NaiveDate;
use serde_json::{json, Value};
use tracing::info;

pub async fn index() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn deleted() -> Json<Value> {
    Json(json!({ "status": "deleted" }))
}

fn optional_date(value: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => Ok(Some(parse_date(value)?)),
        None => Ok(None),
    }
}

fn within(date: NaiveDate, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    from.is_none_or(|from| date >= from) && to.is_none_or(|to| date <= to)
}

async fn save(state: &AppState, data: &AppData) -> Result<(), AppError> {
    persist_data(&state.data_path, data).await
}

/// Tells subscribers a persisted change happened. Call after the write.
fn announce(state: &AppState, topic: Topic) {
    let subscribers = state.bus.publish(topic);
    info!(%topic, subscribers, "change published");
}
