use crate::handlers::{self, dashboard, logs, profile, workouts};
use crate::state::AppState;
use axum::{
    routing::{delete, get, put},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/profile", get(profile::get_profile).put(profile::put_profile))
        .route("/api/profile/compute", get(profile::compute_profile))
        .route("/api/body-logs", get(logs::list_body_logs).post(logs::upsert_body_log))
        .route("/api/body-logs/:id", delete(logs::delete_body_log))
        .route("/api/meal-logs", get(logs::list_meal_logs).post(logs::create_meal_log))
        .route(
            "/api/meal-logs/:id",
            put(logs::update_meal_log).delete(logs::delete_meal_log),
        )
        .route("/api/dashboard/summary", get(dashboard::get_summary))
        .route("/api/dashboard/charts", get(dashboard::get_charts))
        .route("/api/dashboard/live", get(dashboard::get_live))
        .route(
            "/api/workouts/templates",
            get(workouts::list_templates).post(workouts::create_template),
        )
        .route(
            "/api/workouts/templates/:id",
            put(workouts::update_template).delete(workouts::delete_template),
        )
        .route(
            "/api/workouts/templates/:id/items",
            get(workouts::get_template_items).put(workouts::put_template_items),
        )
        .route("/api/workouts/templates/:id/draft", get(workouts::get_template_draft))
        .route(
            "/api/workouts/sessions",
            get(workouts::list_sessions).post(workouts::create_session),
        )
        .route(
            "/api/workouts/sessions/:id",
            get(workouts::get_session).delete(workouts::delete_session),
        )
        .with_state(state)
}
