use super::{announce, deleted, optional_date, save, within};
use crate::errors::AppError;
use crate::models::{BodyLog, BodyLogInput, MealLog, MealLogInput, MealQuery, RangeQuery};
use crate::state::AppState;
use crate::sync::Topic;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

pub async fn list_body_logs(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<BodyLog>>, AppError> {
    let from = optional_date(query.from.as_deref())?;
    let to = optional_date(query.to.as_deref())?;

    let data = state.data.lock().await;
    let mut logs: Vec<BodyLog> = data
        .body_logs
        .iter()
        .filter(|log| within(log.date, from, to))
        .cloned()
        .collect();
    logs.sort_by_key(|log| log.date);
    Ok(Json(logs))
}

/// Creates the day's body log, or replaces it if one exists for that date.
pub async fn upsert_body_log(
    State(state): State<AppState>,
    Json(payload): Json<BodyLogInput>,
) -> Result<Json<BodyLog>, AppError> {
    if !(payload.weight_kg.is_finite() && payload.weight_kg > 0.0) {
        return Err(AppError::bad_request("weight_kg must be a positive number"));
    }

    let mut data = state.data.lock().await;
    let saved = match data.body_logs.iter().position(|log| log.date == payload.date) {
        Some(index) => {
            let log = payload.into_log(data.body_logs[index].id);
            data.body_logs[index] = log.clone();
            log
        }
        None => {
            let log = payload.into_log(data.allocate_id());
            data.body_logs.push(log.clone());
            log
        }
    };
    save(&state, &data).await?;
    drop(data);

    announce(&state, Topic::DataUpdated);
    Ok(Json(saved))
}

pub async fn delete_body_log(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, AppError> {
    let mut data = state.data.lock().await;
    let index = data
        .body_logs
        .iter()
        .position(|log| log.id == id)
        .ok_or_else(|| AppError::not_found("not found"))?;
    data.body_logs.remove(index);
    save(&state, &data).await?;
    drop(data);

    announce(&state, Topic::DataUpdated);
    Ok(deleted())
}

/// Meals of one `date`, or within `from`..=`to` when no date is given.
pub async fn list_meal_logs(
    State(state): State<AppState>,
    Query(query): Query<MealQuery>,
) -> Result<Json<Vec<MealLog>>, AppError> {
    let (from, to) = match optional_date(query.date.as_deref())? {
        Some(day) => (Some(day), Some(day)),
        None => (
            optional_date(query.from.as_deref())?,
            optional_date(query.to.as_deref())?,
        ),
    };
    let data = state.data.lock().await;
    Ok(Json(meals_between(&data.meal_logs, from, to)))
}

pub async fn create_meal_log(
    State(state): State<AppState>,
    Json(payload): Json<MealLogInput>,
) -> Result<Json<MealLog>, AppError> {
    validate_meal(&payload)?;

    let mut data = state.data.lock().await;
    let log = payload.into_log(data.allocate_id());
    data.meal_logs.push(log.clone());
    save(&state, &data).await?;
    drop(data);

    announce(&state, Topic::DataUpdated);
    Ok(Json(log))
}

pub async fn update_meal_log(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<MealLogInput>,
) -> Result<Json<MealLog>, AppError> {
    validate_meal(&payload)?;

    let mut data = state.data.lock().await;
    let existing = data
        .meal_logs
        .iter_mut()
        .find(|log| log.id == id)
        .ok_or_else(|| AppError::not_found("not found"))?;
    *existing = payload.into_log(id);
    let updated = existing.clone();
    save(&state, &data).await?;
    drop(data);

    announce(&state, Topic::DataUpdated);
    Ok(Json(updated))
}

pub async fn delete_meal_log(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, AppError> {
    let mut data = state.data.lock().await;
    let index = data
        .meal_logs
        .iter()
        .position(|log| log.id == id)
        .ok_or_else(|| AppError::not_found("not found"))?;
    data.meal_logs.remove(index);
    save(&state, &data).await?;
    drop(data);

    announce(&state, Topic::DataUpdated);
    Ok(deleted())
}

fn validate_meal(payload: &MealLogInput) -> Result<(), AppError> {
    if payload.meal_type.trim().is_empty() {
        return Err(AppError::bad_request("meal_type is required"));
    }
    if payload.calories_kcal > MealLogInput::MAX_CALORIES_KCAL {
        return Err(AppError::bad_request(format!(
            "calories_kcal must be between 0 and {}",
            MealLogInput::MAX_CALORIES_KCAL
        )));
    }
    Ok(())
}

fn meals_between(
    meals: &[MealLog],
    from: Option<chrono::NaiveDate>,
    to: Option<chrono::NaiveDate>,
) -> Vec<MealLog> {
    let mut selected: Vec<MealLog> = meals
        .iter()
        .filter(|meal| within(meal.date, from, to))
        .cloned()
        .collect();
    selected.sort_by_key(|meal| (meal.date, meal.id));
    selected
}
