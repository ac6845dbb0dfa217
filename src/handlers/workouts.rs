use super::{announce, deleted, optional_date, save, within};
use crate::errors::AppError;
use crate::models::{
    AppData, RangeQuery, TemplateInput, TemplateItem, TemplateUpdate, WorkoutSession,
    WorkoutTemplate,
};
use crate::state::AppState;
use crate::sync::Topic;
use crate::template::{expand, ordered_items, prepare_items, validate_template_name, DraftSet, SessionDraft};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;
use tracing::info;

fn find_template(data: &AppData, id: u64) -> Result<&WorkoutTemplate, AppError> {
    data.templates
        .iter()
        .find(|tpl| tpl.id == id)
        .ok_or_else(|| AppError::not_found("template not found"))
}

fn with_ordered_items(template: &WorkoutTemplate) -> WorkoutTemplate {
    WorkoutTemplate {
        items: ordered_items(&template.items).into_iter().cloned().collect(),
        ..template.clone()
    }
}

pub async fn list_templates(State(state): State<AppState>) -> Json<Vec<WorkoutTemplate>> {
    let data = state.data.lock().await;
    Json(data.templates.iter().map(with_ordered_items).collect())
}

pub async fn create_template(
    State(state): State<AppState>,
    Json(payload): Json<TemplateInput>,
) -> Result<Json<WorkoutTemplate>, AppError> {
    let name = validate_template_name(&payload.name)?;
    let items = prepare_items(payload.items.unwrap_or_default())?;

    let mut data = state.data.lock().await;
    let template = WorkoutTemplate {
        id: data.allocate_id(),
        name,
        description: payload.description.filter(|d| !d.trim().is_empty()),
        items,
    };
    data.templates.push(template.clone());
    save(&state, &data).await?;

    info!(template_id = template.id, items = template.items.len(), "template created");
    Ok(Json(with_ordered_items(&template)))
}

pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<TemplateUpdate>,
) -> Result<Json<WorkoutTemplate>, AppError> {
    let name = validate_template_name(&payload.name)?;

    let mut data = state.data.lock().await;
    let template = data
        .templates
        .iter_mut()
        .find(|tpl| tpl.id == id)
        .ok_or_else(|| AppError::not_found("template not found"))?;
    template.name = name;
    template.description = payload.description.filter(|d| !d.trim().is_empty());
    let updated = with_ordered_items(template);
    save(&state, &data).await?;
    Ok(Json(updated))
}

pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, AppError> {
    let mut data = state.data.lock().await;
    let index = data
        .templates
        .iter()
        .position(|tpl| tpl.id == id)
        .ok_or_else(|| AppError::not_found("template not found"))?;
    data.templates.remove(index);
    save(&state, &data).await?;
    Ok(deleted())
}

pub async fn get_template_items(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<TemplateItem>>, AppError> {
    let data = state.data.lock().await;
    let template = find_template(&data, id)?;
    Ok(Json(ordered_items(&template.items).into_iter().cloned().collect()))
}

pub async fn put_template_items(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(items): Json<Vec<TemplateItem>>,
) -> Result<Json<Vec<TemplateItem>>, AppError> {
    let items = prepare_items(items)?;

    let mut data = state.data.lock().await;
    let template = data
        .templates
        .iter_mut()
        .find(|tpl| tpl.id == id)
        .ok_or_else(|| AppError::not_found("template not found"))?;
    template.items = items;
    let stored: Vec<TemplateItem> = ordered_items(&template.items).into_iter().cloned().collect();
    save(&state, &data).await?;
    Ok(Json(stored))
}

/// The session sets a template expands to, ready for editing.
pub async fn get_template_draft(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<DraftSet>>, AppError> {
    let data = state.data.lock().await;
    let template = find_template(&data, id)?;
    Ok(Json(expand(template)))
}

pub async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<WorkoutSession>>, AppError> {
    let from = optional_date(query.from.as_deref())?;
    let to = optional_date(query.to.as_deref())?;

    let data = state.data.lock().await;
    let mut sessions: Vec<WorkoutSession> = data
        .sessions
        .iter()
        .filter(|session| within(session.date, from, to))
        .cloned()
        .collect();
    sessions.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
    Ok(Json(sessions))
}

/// Saves a draft. Sets without an exercise name are dropped and the rest are
/// numbered by position in the session.
pub async fn create_session(
    State(state): State<AppState>,
    Json(draft): Json<SessionDraft>,
) -> Result<Json<WorkoutSession>, AppError> {
    let session = draft.finalize()?;

    let mut data = state.data.lock().await;
    if let Some(template_id) = session.template_id {
        find_template(&data, template_id)
            .map_err(|_| AppError::bad_request(format!("unknown template {template_id}")))?;
    }
    let saved = WorkoutSession {
        id: data.allocate_id(),
        date: session.date,
        template_id: session.template_id,
        note: session.note,
        sets: session.sets,
    };
    data.sessions.push(saved.clone());
    save(&state, &data).await?;
    drop(data);

    info!(session_id = saved.id, sets = saved.sets.len(), "workout session saved");
    announce(&state, Topic::DataUpdated);
    Ok(Json(saved))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<WorkoutSession>, AppError> {
    let data = state.data.lock().await;
    data.sessions
        .iter()
        .find(|session| session.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::not_found("not found"))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, AppError> {
    let mut data = state.data.lock().await;
    let index = data
        .sessions
        .iter()
        .position(|session| session.id == id)
        .ok_or_else(|| AppError::not_found("not found"))?;
    data.sessions.remove(index);
    save(&state, &data).await?;
    drop(data);

    announce(&state, Topic::DataUpdated);
    Ok(deleted())
}
