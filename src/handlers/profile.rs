use super::{announce, save};
use crate::errors::AppError;
use crate::models::{Profile, ProfileMetrics, ProfileUpdate};
use crate::nutrition::{compute_bmr, compute_tdee, recommended_intake};
use crate::state::AppState;
use crate::sync::Topic;
use axum::{extract::State, Json};
use chrono::Utc;

const FALLBACK_WEIGHT_KG: f64 = 70.0;
const GOAL_HORIZON_WEEKS: f64 = 12.0;

pub async fn get_profile(State(state): State<AppState>) -> Result<Json<Profile>, AppError> {
    let data = state.data.lock().await;
    data.profile
        .clone()
        .map(Json)
        .ok_or_else(|| AppError::not_found("profile not found"))
}

pub async fn put_profile(
    State(state): State<AppState>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Profile>, AppError> {
    if update.age == Some(0) {
        return Err(AppError::bad_request("age must be positive"));
    }

    let mut data = state.data.lock().await;
    let profile = data.profile.get_or_insert_with(Profile::default);
    update.apply_to(profile);
    profile.updated_at = Some(Utc::now());
    let saved = profile.clone();
    save(&state, &data).await?;
    drop(data);

    announce(&state, Topic::ProfileUpdated);
    Ok(Json(saved))
}

/// Energy targets from the profile alone, without any logged weight.
pub async fn compute_profile(State(state): State<AppState>) -> Result<Json<ProfileMetrics>, AppError> {
    let data = state.data.lock().await;
    let profile = data
        .profile
        .as_ref()
        .ok_or_else(|| AppError::not_found("profile not found"))?;

    let (Some(height_cm), Some(age), Some(activity)) =
        (profile.height_cm, profile.age, profile.activity_level)
    else {
        return Err(AppError::bad_request("insufficient profile data"));
    };

    let weight = profile.goal_weight_kg.unwrap_or(FALLBACK_WEIGHT_KG);
    let bmr = compute_bmr(
        weight,
        height_cm,
        age,
        profile.sex.as_deref().unwrap_or(""),
        profile.current_bodyfat_pct,
    );
    let tdee = compute_tdee(bmr, Some(activity));

    Ok(Json(ProfileMetrics {
        bmr,
        tdee,
        recommended_intake: recommended_intake(tdee, None, profile.goal_rate_kg_per_week),
        recommended_rate_kg_per_week: profile
            .goal_weight_kg
            .map(|goal| (goal - weight) / GOAL_HORIZON_WEEKS),
    }))
}
