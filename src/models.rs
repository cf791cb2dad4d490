use crate::datekey::DateKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Habit category. The five named variants carry default icon/color
/// mappings; anything else is kept as free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Health,
    Exercise,
    Nutrition,
    Mental,
    Productivity,
    Other(String),
}

impl Category {
    pub fn icon(&self) -> &str {
        match self {
            Self::Health => "favorite",
            Self::Exercise => "fitness_center",
            Self::Nutrition => "restaurant",
            Self::Mental => "psychology",
            Self::Productivity => "work",
            Self::Other(_) => "check_circle",
        }
    }

    pub fn color(&self) -> &str {
        match self {
            Self::Health => "red",
            Self::Exercise => "green",
            Self::Nutrition => "orange",
            Self::Mental => "purple",
            Self::Productivity => "blue",
            Self::Other(_) => "gray",
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Health => "health",
            Self::Exercise => "exercise",
            Self::Nutrition => "nutrition",
            Self::Mental => "mental",
            Self::Productivity => "productivity",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "health" => Self::Health,
            "exercise" => Self::Exercise,
            "nutrition" => Self::Nutrition,
            "mental" => Self::Mental,
            "productivity" => Self::Productivity,
            _ => Self::Other(raw),
        }
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

fn default_target() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub goal_text: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_target")]
    pub target_value: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completions: BTreeSet<DateKey>,
    #[serde(default)]
    pub daily_progress: BTreeMap<DateKey, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub habits: Vec<Habit>,
}

impl AppData {
    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users.iter().find(|user| user.email == email)
    }

    pub fn user_by_id(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    pub fn habits_for(&self, owner_id: &str) -> Vec<Habit> {
        self.habits
            .iter()
            .filter(|habit| habit.owner_id == owner_id)
            .cloned()
            .collect()
    }

    pub fn habit_mut(&mut self, owner_id: &str, habit_id: &str) -> Option<&mut Habit> {
        self.habits
            .iter_mut()
            .find(|habit| habit.owner_id == owner_id && habit.id == habit_id)
    }
}

// ---- request payloads ----

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct HabitPayload {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub target_value: Option<u32>,
}

/// Optional date; absent means "today in the reference timezone".
#[derive(Debug, Default, Deserialize)]
pub struct DayRequest {
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default = "default_progress_value")]
    pub value: u32,
    pub add: bool,
}

fn default_progress_value() -> u32 {
    1
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
}

// ---- responses ----

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub habit_id: String,
    pub date: DateKey,
    pub completed: bool,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub habit_id: String,
    pub date: DateKey,
    pub progress: u32,
    pub target_value: u32,
    pub completed: bool,
}

/// One day of a weekly or monthly aggregate series.
#[derive(Debug, Clone, Serialize)]
pub struct DayCount {
    pub date: DateKey,
    pub completions: u32,
    pub total: u32,
}

#[derive(Debug, Serialize)]
pub struct DayStats {
    pub date: DateKey,
    pub completed: u32,
    pub total: u32,
    pub rate: u8,
    pub active_categories: u32,
    pub completed_habits: Vec<CompletedHabit>,
}

#[derive(Debug, Serialize)]
pub struct CompletedHabit {
    pub id: String,
    pub name: String,
    pub category: String,
    pub icon: String,
    pub color: String,
}

#[derive(Debug, Serialize)]
pub struct WeekStats {
    pub week_start: DateKey,
    pub completed_days: u32,
    pub total_completions: u32,
    pub average_daily: u32,
    pub rate: u8,
    pub per_day: Vec<DayCount>,
}

#[derive(Debug, Serialize)]
pub struct BestDay {
    pub date: DateKey,
    pub completions: u32,
}

#[derive(Debug, Serialize)]
pub struct MonthStats {
    pub year: i32,
    pub month: u32,
    pub active_days: u32,
    pub total_completions: u32,
    pub best_day: Option<BestDay>,
    pub rate: u8,
    pub per_day: Vec<DayCount>,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub total_habits: u32,
    pub completed_today: u32,
    pub today_rate: u8,
    pub current_streak: u32,
    pub average_streak: u32,
    pub active_days_this_month: u32,
    pub perfect_days_this_month: u32,
}

#[derive(Debug, Serialize)]
pub struct HabitOverview {
    pub id: String,
    pub name: String,
    pub category: String,
    pub icon: String,
    pub color: String,
    pub streak: u32,
    pub completion_rate: u8,
    pub completed_today: bool,
    pub today_progress: u32,
    pub target_value: u32,
}
