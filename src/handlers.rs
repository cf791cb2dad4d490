use crate::calendar::{month_view, week_view, MonthView, WeekView};
use crate::datekey::DateKey;
use crate::errors::AppError;
use crate::models::{
    AppData, DayRequest, DayStats, Habit, HabitOverview, HabitPayload, LoginRequest, MonthQuery,
    MonthStats, ProgressRequest, ProgressResponse, RegisterRequest, SummaryStats, ToggleResponse,
    User, UserResponse, WeekStats,
};
use crate::state::AppState;
use crate::stats;
use crate::storage::persist_data;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

fn require_user(headers: &HeaderMap, data: &AppData) -> Result<String, AppError> {
    let user_id = headers
        .get("user-id")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("missing user-id header"))?;
    if data.user_by_id(user_id).is_none() {
        return Err(AppError::unauthorized("unknown user"));
    }
    Ok(user_id.to_string())
}

/// Strictly parse an optional date, defaulting to today in the reference
/// timezone only when the field is absent. Malformed input is a 400, never
/// silently today.
fn date_or_today(raw: Option<&str>, state: &AppState) -> Result<DateKey, AppError> {
    match raw {
        Some(value) => Ok(DateKey::parse(value)?),
        None => Ok(DateKey::today(state.timezone)),
    }
}

// ---- auth ----

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, AppError> {
    if payload.name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
    {
        return Err(AppError::bad_request("name, email and password are required"));
    }

    let mut data = state.data.lock().await;
    if data.user_by_email(&payload.email).is_some() {
        return Err(AppError::bad_request("email already registered"));
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        name: payload.name,
        email: payload.email,
        password: payload.password,
    };
    let response = UserResponse::from(&user);
    info!(user_id = %user.id, "registered user");
    data.users.push(user);
    persist_data(&state.data_path, &data).await?;

    Ok(Json(response))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let data = state.data.lock().await;
    let user = data
        .user_by_email(&payload.email)
        .filter(|user| user.password == payload.password)
        .ok_or_else(|| AppError::unauthorized("invalid credentials"))?;
    Ok(Json(UserResponse::from(user)))
}

// ---- habit CRUD ----

pub async fn list_habits(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<HabitOverview>>, AppError> {
    let data = state.data.lock().await;
    let user_id = require_user(&headers, &data)?;
    let today = DateKey::today(state.timezone);
    let now = Utc::now();

    let overviews = data
        .habits_for(&user_id)
        .iter()
        .map(|habit| stats::habit_overview(habit, today, now))
        .collect();
    Ok(Json(overviews))
}

pub async fn create_habit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<HabitPayload>,
) -> Result<Json<Habit>, AppError> {
    if payload.name.trim().is_empty() || payload.category.trim().is_empty() {
        return Err(AppError::bad_request("name and category are required"));
    }

    let mut data = state.data.lock().await;
    let user_id = require_user(&headers, &data)?;
    let habit = Habit::create(&user_id, payload, Utc::now());
    let response = habit.clone();
    info!(habit_id = %habit.id, user_id = %user_id, "created habit");
    data.habits.push(habit);
    persist_data(&state.data_path, &data).await?;

    Ok(Json(response))
}

pub async fn update_habit(
    State(state): State<AppState>,
    Path(habit_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<HabitPayload>,
) -> Result<Json<Habit>, AppError> {
    if payload.name.trim().is_empty() || payload.category.trim().is_empty() {
        return Err(AppError::bad_request("name and category are required"));
    }

    let mut data = state.data.lock().await;
    let user_id = require_user(&headers, &data)?;
    let habit = data
        .habit_mut(&user_id, &habit_id)
        .ok_or_else(|| AppError::not_found("habit not found"))?;
    habit.apply_update(payload);
    let response = habit.clone();
    persist_data(&state.data_path, &data).await?;

    Ok(Json(response))
}

pub async fn delete_habit(
    State(state): State<AppState>,
    Path(habit_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let mut data = state.data.lock().await;
    let user_id = require_user(&headers, &data)?;
    let before = data.habits.len();
    data.habits
        .retain(|habit| !(habit.owner_id == user_id && habit.id == habit_id));
    if data.habits.len() == before {
        return Err(AppError::not_found("habit not found"));
    }
    info!(habit_id = %habit_id, user_id = %user_id, "deleted habit");
    persist_data(&state.data_path, &data).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ---- completions and progress ----

pub async fn toggle_completion(
    State(state): State<AppState>,
    Path(habit_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<DayRequest>,
) -> Result<Json<ToggleResponse>, AppError> {
    let date = date_or_today(payload.date.as_deref(), &state)?;
    let mut data = state.data.lock().await;
    let user_id = require_user(&headers, &data)?;
    let habit = data
        .habit_mut(&user_id, &habit_id)
        .ok_or_else(|| AppError::not_found("habit not found"))?;
    let completed = habit.toggle_completion(date);
    persist_data(&state.data_path, &data).await?;

    Ok(Json(ToggleResponse {
        habit_id,
        date,
        completed,
    }))
}

pub async fn update_progress(
    State(state): State<AppState>,
    Path(habit_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<ProgressRequest>,
) -> Result<Json<ProgressResponse>, AppError> {
    let date = date_or_today(payload.date.as_deref(), &state)?;
    let mut data = state.data.lock().await;
    let user_id = require_user(&headers, &data)?;
    let habit = data
        .habit_mut(&user_id, &habit_id)
        .ok_or_else(|| AppError::not_found("habit not found"))?;
    let progress = habit.update_progress(date, payload.value, payload.add);
    let response = ProgressResponse {
        habit_id,
        date,
        progress,
        target_value: habit.target_value,
        completed: habit.completed_on(date),
    };
    persist_data(&state.data_path, &data).await?;

    Ok(Json(response))
}

pub async fn mark_completed(
    State(state): State<AppState>,
    Path(habit_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<DayRequest>,
) -> Result<Json<ProgressResponse>, AppError> {
    let date = date_or_today(payload.date.as_deref(), &state)?;
    let mut data = state.data.lock().await;
    let user_id = require_user(&headers, &data)?;
    let habit = data
        .habit_mut(&user_id, &habit_id)
        .ok_or_else(|| AppError::not_found("habit not found"))?;
    habit.mark_completed(date);
    let response = ProgressResponse {
        habit_id,
        date,
        progress: habit.progress_on(date),
        target_value: habit.target_value,
        completed: true,
    };
    persist_data(&state.data_path, &data).await?;

    Ok(Json(response))
}

pub async fn reset_day(
    State(state): State<AppState>,
    Path(habit_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<DayRequest>,
) -> Result<Json<ProgressResponse>, AppError> {
    let date = date_or_today(payload.date.as_deref(), &state)?;
    let mut data = state.data.lock().await;
    let user_id = require_user(&headers, &data)?;
    let habit = data
        .habit_mut(&user_id, &habit_id)
        .ok_or_else(|| AppError::not_found("habit not found"))?;
    habit.reset_day(date);
    let response = ProgressResponse {
        habit_id,
        date,
        progress: 0,
        target_value: habit.target_value,
        completed: false,
    };
    persist_data(&state.data_path, &data).await?;

    Ok(Json(response))
}

// ---- statistics ----

pub async fn get_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SummaryStats>, AppError> {
    let data = state.data.lock().await;
    let user_id = require_user(&headers, &data)?;
    let habits = data.habits_for(&user_id);
    let today = DateKey::today(state.timezone);
    Ok(Json(stats::summary(&habits, today)))
}

pub async fn get_day_stats(
    State(state): State<AppState>,
    Query(query): Query<DayRequest>,
    headers: HeaderMap,
) -> Result<Json<DayStats>, AppError> {
    let date = date_or_today(query.date.as_deref(), &state)?;
    let data = state.data.lock().await;
    let user_id = require_user(&headers, &data)?;
    let habits = data.habits_for(&user_id);
    Ok(Json(stats::day_stats(&habits, date)))
}

pub async fn get_week_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<WeekStats>, AppError> {
    let data = state.data.lock().await;
    let user_id = require_user(&headers, &data)?;
    let habits = data.habits_for(&user_id);
    let today = DateKey::today(state.timezone);
    Ok(Json(stats::week_stats(&habits, today)))
}

pub async fn get_month_stats(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
    headers: HeaderMap,
) -> Result<Json<MonthStats>, AppError> {
    let data = state.data.lock().await;
    let user_id = require_user(&headers, &data)?;
    let habits = data.habits_for(&user_id);
    let today = DateKey::today(state.timezone);
    let year = query.year.unwrap_or_else(|| today.year());
    let month = query.month.unwrap_or_else(|| today.month());
    Ok(Json(stats::month_stats(&habits, year, month)?))
}

// ---- calendars ----

pub async fn get_week_calendar(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<WeekView>, AppError> {
    let data = state.data.lock().await;
    let user_id = require_user(&headers, &data)?;
    let habits = data.habits_for(&user_id);
    let today = DateKey::today(state.timezone);
    Ok(Json(week_view(&habits, today)))
}

pub async fn get_month_calendar(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
    headers: HeaderMap,
) -> Result<Json<MonthView>, AppError> {
    let data = state.data.lock().await;
    let user_id = require_user(&headers, &data)?;
    let habits = data.habits_for(&user_id);
    let today = DateKey::today(state.timezone);
    let year = query.year.unwrap_or_else(|| today.year());
    let month = query.month.unwrap_or_else(|| today.month());
    Ok(Json(month_view(&habits, year, month, today)?))
}
