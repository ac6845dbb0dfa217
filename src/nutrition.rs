//! Energy expenditure estimates behind the dashboard's targets.

pub const DEFAULT_ACTIVITY_LEVEL: f64 = 1.2;
pub const KCAL_PER_KG: f64 = 7700.0;

/// Mifflin-St Jeor.
pub fn mifflin_bmr(weight_kg: f64, height_cm: f64, age: u32, sex: &str) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age);
    if matches!(sex.to_ascii_lowercase().as_str(), "male" | "m") {
        base + 5.0
    } else {
        base - 161.0
    }
}

/// Katch-McArdle, from lean body mass.
pub fn katch_bmr(lean_mass_kg: f64) -> f64 {
    370.0 + 21.6 * lean_mass_kg
}

/// Prefers Katch-McArdle whenever body fat is known.
pub fn compute_bmr(weight_kg: f64, height_cm: f64, age: u32, sex: &str, bodyfat_pct: Option<f64>) -> f64 {
    match bodyfat_pct {
        Some(pct) => katch_bmr(weight_kg * (1.0 - pct / 100.0)),
        None => mifflin_bmr(weight_kg, height_cm, age, sex),
    }
}

pub fn compute_tdee(bmr: f64, activity_level: Option<f64>) -> f64 {
    let factor = activity_level
        .filter(|level| *level > 0.0)
        .unwrap_or(DEFAULT_ACTIVITY_LEVEL);
    bmr * factor
}

/// An explicit calorie goal wins, then a weekly rate, then maintenance.
/// A zero goal counts as unset.
pub fn recommended_intake(tdee: f64, goal_calories_kcal: Option<u32>, goal_rate_kg_per_week: Option<f64>) -> f64 {
    if let Some(goal) = goal_calories_kcal.filter(|kcal| *kcal > 0) {
        return f64::from(goal);
    }
    match goal_rate_kg_per_week {
        Some(rate) => tdee + rate * KCAL_PER_KG / 7.0,
        None => tdee,
    }
}
