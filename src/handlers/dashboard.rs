use crate::dashboard::build_view;
use crate::errors::AppError;
use crate::models::{DashboardSummary, DashboardView, RangeQuery};
use crate::refresh::ViewSnapshot;
use crate::state::AppState;
use crate::stats::build_summary;
use axum::{
    extract::{Query, State},
    Json,
};

pub async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<DashboardSummary>, AppError> {
    let data = state.data.lock().await;
    Ok(Json(build_summary(&data, &query, state.window_days)?))
}

pub async fn get_charts(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<DashboardView>, AppError> {
    let summary = {
        let data = state.data.lock().await;
        build_summary(&data, &query, state.window_days)?
    };
    Ok(Json(build_view(summary)))
}

/// Latest result of the background dashboard refresh.
pub async fn get_live(
    State(state): State<AppState>,
) -> Result<Json<ViewSnapshot<DashboardView>>, AppError> {
    let live = state
        .live
        .as_ref()
        .ok_or_else(|| AppError::not_found("live dashboard is not running"))?;
    let snapshot = live.borrow().clone();
    Ok(Json(snapshot))
}
