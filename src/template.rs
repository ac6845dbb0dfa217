use crate::models::{TemplateItem, WorkoutSet, WorkoutTemplate};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An editable, not yet persisted set.
///
/// While editing, `set_no` counts within one exercise's block. It only
/// becomes a session-wide position in [`finalize_sets`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftSet {
    pub exercise_name: String,
    pub set_no: u32,
    pub reps: Option<u32>,
    pub weight_kg: Option<f64>,
    pub note: String,
}

impl Default for DraftSet {
    fn default() -> Self {
        Self {
            exercise_name: String::new(),
            set_no: 1,
            reps: None,
            weight_kg: None,
            note: String::new(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("at least one exercise is required")]
    NoExercises,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template name is required")]
    BlankName,
    #[error("at least one exercise is required")]
    NoExercises,
    #[error("target sets for '{exercise}' must be at least 1")]
    NonPositiveSets { exercise: String },
    #[error("target sets for '{exercise}' must be at most {max}", max = MAX_TARGET_SETS)]
    TooManySets { exercise: String },
}

/// Upper bound on the sets one template item may ask for.
pub const MAX_TARGET_SETS: i64 = 100;

/// Rep count suggested by a free-form target.
///
/// Every non-digit is stripped and the rest read as one number, so a range
/// like "8-12" becomes 812. Targets without digits, or whose digits overflow,
/// suggest nothing.
pub fn reps_hint(target_reps: &str) -> Option<u32> {
    let digits: String = target_reps.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Items in session order: ascending `order_index`, unindexed items last,
/// ties kept in their stored order.
pub fn ordered_items(items: &[TemplateItem]) -> Vec<&TemplateItem> {
    let mut ordered: Vec<&TemplateItem> = items.iter().collect();
    ordered.sort_by_key(|item| (item.order_index.is_none(), item.order_index));
    ordered
}

/// Expands a template into one draft set per targeted set.
pub fn expand(template: &WorkoutTemplate) -> Vec<DraftSet> {
    let mut sets = Vec::new();
    for item in ordered_items(&template.items) {
        let count = item
            .target_sets
            .filter(|sets| *sets > 0)
            .unwrap_or(1)
            .min(MAX_TARGET_SETS);
        let reps = item.target_reps.as_deref().and_then(reps_hint);
        for set_no in 1..=count {
            sets.push(DraftSet {
                exercise_name: item.exercise_name.clone(),
                set_no: u32::try_from(set_no).unwrap_or(u32::MAX),
                reps,
                weight_kg: item.target_weight_kg,
                note: String::new(),
            });
        }
    }

    if sets.is_empty() {
        sets.push(DraftSet::default());
    }
    sets
}

/// Drops unnamed sets and renumbers the rest by session position.
pub fn finalize_sets(drafts: &[DraftSet]) -> Result<Vec<WorkoutSet>, DraftError> {
    let sets: Vec<WorkoutSet> = drafts
        .iter()
        .filter(|draft| !draft.exercise_name.trim().is_empty())
        .zip(1u32..)
        .map(|(draft, set_no)| {
            let note = draft.note.trim();
            WorkoutSet {
                exercise_name: draft.exercise_name.trim().to_string(),
                set_no,
                reps: draft.reps,
                weight_kg: draft.weight_kg,
                rir: None,
                note: (!note.is_empty()).then(|| note.to_string()),
            }
        })
        .collect();

    if sets.is_empty() {
        return Err(DraftError::NoExercises);
    }
    Ok(sets)
}

/// Checks template items before they are stored.
///
/// Unnamed items are dropped, names trimmed, and missing `order_index`
/// values filled with the item's position.
pub fn prepare_items(items: Vec<TemplateItem>) -> Result<Vec<TemplateItem>, TemplateError> {
    let mut prepared = Vec::with_capacity(items.len());
    for (position, mut item) in items.into_iter().enumerate() {
        let name = item.exercise_name.trim();
        if name.is_empty() {
            continue;
        }
        item.exercise_name = name.to_string();
        if matches!(item.target_sets, Some(sets) if sets <= 0) {
            return Err(TemplateError::NonPositiveSets {
                exercise: item.exercise_name,
            });
        }
        if matches!(item.target_sets, Some(sets) if sets > MAX_TARGET_SETS) {
            return Err(TemplateError::TooManySets {
                exercise: item.exercise_name,
            });
        }
        if item.order_index.is_none() {
            item.order_index = Some(position as i64);
        }
        prepared.push(item);
    }

    if prepared.is_empty() {
        return Err(TemplateError::NoExercises);
    }
    Ok(prepared)
}

pub fn validate_template_name(name: &str) -> Result<String, TemplateError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TemplateError::BlankName);
    }
    Ok(name.to_string())
}

/// The session being logged: a date plus the sets being edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDraft {
    pub date: NaiveDate,
    #[serde(default)]
    pub template_id: Option<u64>,
    #[serde(default)]
    pub note: String,
    #[serde(default = "placeholder_sets")]
    pub sets: Vec<DraftSet>,
}

fn placeholder_sets() -> Vec<DraftSet> {
    vec![DraftSet::default()]
}

/// A finalized session ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub date: NaiveDate,
    pub template_id: Option<u64>,
    pub note: Option<String>,
    pub sets: Vec<WorkoutSet>,
}

impl SessionDraft {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            template_id: None,
            note: String::new(),
            sets: placeholder_sets(),
        }
    }

    /// Replaces the sets with the template's expansion. `None` clears the
    /// selection and leaves a single empty set.
    pub fn apply_template(&mut self, template: Option<&WorkoutTemplate>) {
        match template {
            Some(template) => {
                self.template_id = Some(template.id);
                self.sets = expand(template);
            }
            None => {
                self.template_id = None;
                self.sets = placeholder_sets();
            }
        }
    }

    pub fn add_set(&mut self) {
        let set_no = u32::try_from(self.sets.len() + 1).unwrap_or(u32::MAX);
        self.sets.push(DraftSet {
            set_no,
            ..DraftSet::default()
        });
    }

    pub fn remove_set(&mut self, index: usize) {
        if index < self.sets.len() {
            self.sets.remove(index);
        }
        if self.sets.is_empty() {
            self.sets = placeholder_sets();
            return;
        }
        for (set, set_no) in self.sets.iter_mut().zip(1u32..) {
            set.set_no = set_no;
        }
    }

    pub fn finalize(&self) -> Result<NewSession, DraftError> {
        let sets = finalize_sets(&self.sets)?;
        let note = self.note.trim();
        Ok(NewSession {
            date: self.date,
            template_id: self.template_id,
            note: (!note.is_empty()).then(|| note.to_string()),
            sets,
        })
    }
}
