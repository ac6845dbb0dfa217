use crate::series::{MergedPoint, MetricPoint};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Everything the tracker persists, stored as a single JSON document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppData {
    pub next_id: u64,
    pub profile: Option<Profile>,
    pub body_logs: Vec<BodyLog>,
    pub meal_logs: Vec<MealLog>,
    pub templates: Vec<WorkoutTemplate>,
    pub sessions: Vec<WorkoutSession>,
}

impl AppData {
    pub fn allocate_id(&mut self) -> u64 {
        self.next_id = self.next_id.saturating_add(1);
        self.next_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Profile {
    pub sex: Option<String>,
    pub age: Option<u32>,
    pub height_cm: Option<f64>,
    pub activity_level: Option<f64>,
    pub current_bodyfat_pct: Option<f64>,
    pub current_muscle_mass_kg: Option<f64>,
    pub goal_weight_kg: Option<f64>,
    pub goal_bodyfat_pct: Option<f64>,
    pub goal_calories_kcal: Option<u32>,
    pub goal_rate_kg_per_week: Option<f64>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Partial profile update; only the fields present in the request change.
#[derive(Debug, Deserialize, Default)]
pub struct ProfileUpdate {
    pub sex: Option<String>,
    pub age: Option<u32>,
    pub height_cm: Option<f64>,
    pub activity_level: Option<f64>,
    pub current_bodyfat_pct: Option<f64>,
    pub current_muscle_mass_kg: Option<f64>,
    pub goal_weight_kg: Option<f64>,
    pub goal_bodyfat_pct: Option<f64>,
    pub goal_calories_kcal: Option<u32>,
    pub goal_rate_kg_per_week: Option<f64>,
}

impl ProfileUpdate {
    pub fn apply_to(self, profile: &mut Profile) {
        profile.sex = self.sex.or(profile.sex.take());
        profile.age = self.age.or(profile.age);
        profile.height_cm = self.height_cm.or(profile.height_cm);
        profile.activity_level = self.activity_level.or(profile.activity_level);
        profile.current_bodyfat_pct = self.current_bodyfat_pct.or(profile.current_bodyfat_pct);
        profile.current_muscle_mass_kg =
            self.current_muscle_mass_kg.or(profile.current_muscle_mass_kg);
        profile.goal_weight_kg = self.goal_weight_kg.or(profile.goal_weight_kg);
        profile.goal_bodyfat_pct = self.goal_bodyfat_pct.or(profile.goal_bodyfat_pct);
        profile.goal_calories_kcal = self.goal_calories_kcal.or(profile.goal_calories_kcal);
        profile.goal_rate_kg_per_week =
            self.goal_rate_kg_per_week.or(profile.goal_rate_kg_per_week);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BodyLog {
    pub id: u64,
    pub date: NaiveDate,
    pub weight_kg: f64,
    pub bodyfat_pct: Option<f64>,
    pub muscle_mass_kg: Option<f64>,
    pub sleep_hours: Option<f64>,
    pub condition_note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BodyLogInput {
    pub date: NaiveDate,
    pub weight_kg: f64,
    pub bodyfat_pct: Option<f64>,
    pub muscle_mass_kg: Option<f64>,
    pub sleep_hours: Option<f64>,
    pub condition_note: Option<String>,
}

impl BodyLogInput {
    pub fn into_log(self, id: u64) -> BodyLog {
        BodyLog {
            id,
            date: self.date,
            weight_kg: self.weight_kg,
            bodyfat_pct: self.bodyfat_pct,
            muscle_mass_kg: self.muscle_mass_kg,
            sleep_hours: self.sleep_hours,
            condition_note: self.condition_note,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MealLog {
    pub id: u64,
    pub date: NaiveDate,
    pub meal_type: String,
    pub calories_kcal: u32,
    pub protein_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MealLogInput {
    pub date: NaiveDate,
    pub meal_type: String,
    pub calories_kcal: u32,
    pub protein_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub memo: Option<String>,
}

impl MealLogInput {
    pub const MAX_CALORIES_KCAL: u32 = 10_000;

    pub fn into_log(self, id: u64) -> MealLog {
        MealLog {
            id,
            date: self.date,
            meal_type: self.meal_type,
            calories_kcal: self.calories_kcal,
            protein_g: self.protein_g,
            fat_g: self.fat_g,
            carbs_g: self.carbs_g,
            memo: self.memo,
        }
    }
}

/// One exercise line of a template, with target hints for the session.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TemplateItem {
    pub exercise_name: String,
    pub target_sets: Option<i64>,
    /// Free-form, e.g. "10" or "8-12".
    pub target_reps: Option<String>,
    pub target_weight_kg: Option<f64>,
    pub order_index: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutTemplate {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub items: Vec<TemplateItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateInput {
    pub name: String,
    pub description: Option<String>,
    pub items: Option<Vec<TemplateItem>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateUpdate {
    pub name: String,
    pub description: Option<String>,
}

/// A persisted set. `set_no` is the position within the whole session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSet {
    pub exercise_name: String,
    pub set_no: u32,
    pub reps: Option<u32>,
    pub weight_kg: Option<f64>,
    pub rir: Option<u32>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSession {
    pub id: u64,
    pub date: NaiveDate,
    pub template_id: Option<u64>,
    pub note: Option<String>,
    #[serde(default)]
    pub sets: Vec<WorkoutSet>,
}

/// The aggregate the dashboard renders from.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DashboardSummary {
    pub weight_series: Vec<MetricPoint>,
    pub bodyfat_series: Vec<MetricPoint>,
    pub intake_series: Vec<MetricPoint>,
    pub protein_series: Vec<MetricPoint>,
    pub tdee: Option<f64>,
    pub recommended_intake: Option<f64>,
    pub avg_intake_7d: Option<f64>,
    pub avg_protein_7d: Option<f64>,
    pub recommendation_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DashboardCharts {
    /// Weight and body fat keyed by date.
    pub body: Vec<MergedPoint>,
    /// Calories and protein keyed by date, with a flat `tdee` line.
    pub nutrition: Vec<MergedPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardView {
    pub summary: DashboardSummary,
    pub charts: DashboardCharts,
    pub has_series_data: bool,
}

#[derive(Debug, Serialize)]
pub struct ProfileMetrics {
    pub bmr: f64,
    pub tdee: f64,
    pub recommended_intake: f64,
    pub recommended_rate_kg_per_week: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct MealQuery {
    pub date: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}
