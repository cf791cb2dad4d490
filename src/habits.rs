use crate::datekey::DateKey;
use crate::models::{Category, Habit, HabitPayload};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;

fn target_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+").expect("valid pattern"))
}

/// Numeric daily target: the explicit value if given, otherwise the first
/// integer found in the goal text, otherwise 1. Always at least 1.
pub fn resolve_target(explicit: Option<u32>, goal_text: Option<&str>) -> u32 {
    let parsed = explicit.or_else(|| {
        goal_text
            .and_then(|goal| target_pattern().find(goal))
            .and_then(|m| m.as_str().parse().ok())
    });
    parsed.unwrap_or(1).max(1)
}

impl Habit {
    pub fn create(owner_id: &str, payload: HabitPayload, now: DateTime<Utc>) -> Self {
        let target_value = resolve_target(payload.target_value, payload.goal.as_deref());
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            name: payload.name,
            category: Category::from(payload.category),
            goal_text: payload.goal,
            description: payload.description,
            target_value,
            created_at: now,
            completions: Default::default(),
            daily_progress: Default::default(),
        }
    }

    /// Apply an edit, keeping id, owner, creation time, and recorded history.
    pub fn apply_update(&mut self, payload: HabitPayload) {
        self.target_value = resolve_target(payload.target_value, payload.goal.as_deref());
        self.name = payload.name;
        self.category = Category::from(payload.category);
        self.goal_text = payload.goal;
        self.description = payload.description;
    }

    /// A record usable by the aggregate calculators. Malformed rows are
    /// skipped there, not fatal.
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty() && self.target_value >= 1
    }

    pub fn completed_on(&self, date: DateKey) -> bool {
        self.completions.contains(&date)
    }

    pub fn progress_on(&self, date: DateKey) -> u32 {
        self.daily_progress.get(&date).copied().unwrap_or(0)
    }

    /// Idempotent flip: marking an already-completed date unmarks it, and
    /// vice versa. Returns the new completion state for the date.
    pub fn toggle_completion(&mut self, date: DateKey) -> bool {
        if self.completions.remove(&date) {
            false
        } else {
            self.completions.insert(date);
            true
        }
    }

    /// Accumulate (or subtract) progress for a date, clamped at zero, and
    /// synchronize the completion entry against the target in the same call:
    /// reaching the target inserts it, falling below removes it.
    pub fn update_progress(&mut self, date: DateKey, value: u32, add: bool) -> u32 {
        let current = self.progress_on(date);
        let updated = if add {
            current.saturating_add(value)
        } else {
            current.saturating_sub(value)
        };
        self.daily_progress.insert(date, updated);

        if updated >= self.target_value {
            self.completions.insert(date);
        } else {
            self.completions.remove(&date);
        }
        updated
    }

    /// Mark the date done outright, jumping progress to the target.
    pub fn mark_completed(&mut self, date: DateKey) {
        self.completions.insert(date);
        self.daily_progress.insert(date, self.target_value);
    }

    /// Clear both the progress value and the completion entry for a date.
    pub fn reset_day(&mut self, date: DateKey) {
        self.daily_progress.remove(&date);
        self.completions.remove(&date);
    }
}
