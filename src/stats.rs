use crate::models::{AppData, DashboardSummary, MealLog, RangeQuery};
use crate::nutrition::{compute_bmr, compute_tdee, recommended_intake};
use crate::series::MetricPoint;
use chrono::{Duration, Local, NaiveDate};
use std::collections::BTreeMap;
use thiserror::Error;

pub const DEFAULT_WINDOW_DAYS: i64 = 30;
pub const MAX_WINDOW_DAYS: i64 = 3650;
const FALLBACK_WEIGHT_KG: f64 = 70.0;
const FALLBACK_HEIGHT_CM: f64 = 170.0;
const FALLBACK_AGE: u32 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SummaryError {
    #[error("profile not found")]
    ProfileMissing,
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

pub fn parse_date(value: &str) -> Result<NaiveDate, SummaryError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| SummaryError::InvalidDate(value.to_string()))
}

/// Inclusive date range; `to` defaults to today and `from` to the start of a
/// `window_days` window ending at `to`.
pub fn resolve_range(
    today: NaiveDate,
    query: &RangeQuery,
    window_days: i64,
) -> Result<(NaiveDate, NaiveDate), SummaryError> {
    let to = match query.to.as_deref().filter(|s| !s.is_empty()) {
        Some(value) => parse_date(value)?,
        None => today,
    };
    let from = match query.from.as_deref().filter(|s| !s.is_empty()) {
        Some(value) => parse_date(value)?,
        None => days_before(to, window_days.clamp(1, MAX_WINDOW_DAYS) - 1)?,
    };
    Ok((from, to))
}

/// `date` minus `days`, or `InvalidDate` when that leaves chrono's range.
fn days_before(date: NaiveDate, days: i64) -> Result<NaiveDate, SummaryError> {
    Duration::try_days(days)
        .and_then(|span| date.checked_sub_signed(span))
        .ok_or_else(|| SummaryError::InvalidDate(date_key(date)))
}

pub fn build_summary(
    data: &AppData,
    query: &RangeQuery,
    window_days: i64,
) -> Result<DashboardSummary, SummaryError> {
    let today = Local::now().date_naive();
    let (from, to) = resolve_range(today, query, window_days)?;
    build_summary_at(from, to, data)
}

pub fn build_summary_at(
    from: NaiveDate,
    to: NaiveDate,
    data: &AppData,
) -> Result<DashboardSummary, SummaryError> {
    let profile = data.profile.as_ref().ok_or(SummaryError::ProfileMissing)?;

    let mut body_logs: Vec<_> = data
        .body_logs
        .iter()
        .filter(|log| log.date >= from && log.date <= to)
        .collect();
    body_logs.sort_by_key(|log| log.date);

    let weight_series = body_logs
        .iter()
        .map(|log| MetricPoint::new(date_key(log.date), log.weight_kg))
        .collect();
    let bodyfat_series = body_logs
        .iter()
        .filter_map(|log| log.bodyfat_pct.map(|pct| MetricPoint::new(date_key(log.date), pct)))
        .collect();

    let meals_in_range = || {
        data.meal_logs
            .iter()
            .filter(|meal| meal.date >= from && meal.date <= to)
    };
    let intake_series = daily_totals(meals_in_range(), |meal| Some(f64::from(meal.calories_kcal)));
    let protein_series = daily_totals(meals_in_range(), |meal| meal.protein_g);

    let latest_body = data.body_logs.iter().max_by_key(|log| log.date);
    let current_weight = latest_body
        .map(|log| log.weight_kg)
        .or(profile.goal_weight_kg)
        .unwrap_or(FALLBACK_WEIGHT_KG);
    let current_bodyfat = match latest_body {
        Some(log) => log.bodyfat_pct,
        None => profile.current_bodyfat_pct,
    };

    let bmr = compute_bmr(
        current_weight,
        profile.height_cm.filter(|h| *h > 0.0).unwrap_or(FALLBACK_HEIGHT_CM),
        profile.age.filter(|a| *a > 0).unwrap_or(FALLBACK_AGE),
        profile.sex.as_deref().unwrap_or(""),
        current_bodyfat,
    );
    let tdee = compute_tdee(bmr, profile.activity_level);
    let recommended = recommended_intake(tdee, profile.goal_calories_kcal, profile.goal_rate_kg_per_week);

    let week_start = days_before(to, 6)?;
    let week_meals: Vec<&MealLog> = data
        .meal_logs
        .iter()
        .filter(|meal| meal.date >= week_start && meal.date <= to)
        .collect();
    let avg_intake_7d = (!week_meals.is_empty())
        .then(|| week_meals.iter().map(|meal| f64::from(meal.calories_kcal)).sum::<f64>() / 7.0);
    let week_protein: Vec<f64> = week_meals.iter().filter_map(|meal| meal.protein_g).collect();
    let avg_protein_7d = (!week_protein.is_empty()).then(|| week_protein.iter().sum::<f64>() / 7.0);

    Ok(DashboardSummary {
        weight_series,
        bodyfat_series,
        intake_series,
        protein_series,
        tdee: Some(tdee),
        recommended_intake: Some(recommended),
        avg_intake_7d,
        avg_protein_7d,
        recommendation_text: avg_intake_7d.map(|avg| recommendation_text(recommended - avg)),
    })
}

/// Per-day sums of `value`; days where no meal recorded a value are absent.
fn daily_totals<'a>(
    meals: impl Iterator<Item = &'a MealLog>,
    value: impl Fn(&MealLog) -> Option<f64>,
) -> Vec<MetricPoint> {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for meal in meals {
        if let Some(amount) = value(meal) {
            *totals.entry(meal.date).or_default() += amount;
        }
    }
    totals
        .into_iter()
        .map(|(date, total)| MetricPoint::new(date_key(date), total))
        .collect()
}

fn recommendation_text(adjust_kcal: f64) -> String {
    let sign = if adjust_kcal > 0.0 { "+" } else { "" };
    format!(
        "To reach your goal, adjust average intake by {sign}{} kcal/day.",
        adjust_kcal.trunc() as i64
    )
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
