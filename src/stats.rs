use crate::datekey::{DateKey, InvalidDateKey};
use crate::models::{
    BestDay, CompletedHabit, DayCount, DayStats, Habit, HabitOverview, MonthStats, SummaryStats,
    WeekStats,
};
use crate::streak::{compute_streak, current_streak, streak_average};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::warn;

/// Round-half-up percentage in 0..=100; zero numerator or denominator is 0.
fn percent(numer: u64, denom: u64) -> u8 {
    if numer == 0 || denom == 0 {
        return 0;
    }
    let rate = (numer as f64 / denom as f64 * 100.0).round();
    rate.min(100.0) as u8
}

/// Filter out malformed records so one bad row never blanks a dashboard.
fn usable(habits: &[Habit]) -> Vec<&Habit> {
    habits
        .iter()
        .filter(|habit| {
            if habit.is_valid() {
                true
            } else {
                warn!(habit_id = %habit.id, "skipping malformed habit in aggregation");
                false
            }
        })
        .collect()
}

/// Lifetime completion rate: completions over days since creation.
pub fn completion_rate(habit: &Habit, now: DateTime<Utc>) -> u8 {
    let completed = habit.completions.len() as u64;
    if completed == 0 {
        return 0;
    }
    let seconds = (now - habit.created_at).num_seconds();
    if seconds <= 0 {
        return 0;
    }
    let days_since_creation = (seconds as u64).div_ceil(86_400);
    percent(completed, days_since_creation)
}

pub fn day_stats(habits: &[Habit], date: DateKey) -> DayStats {
    let habits = usable(habits);
    let total = habits.len() as u32;

    let mut categories = BTreeSet::new();
    let mut completed_habits = Vec::new();
    for habit in &habits {
        if habit.completed_on(date) {
            categories.insert(habit.category.as_str().to_string());
            completed_habits.push(CompletedHabit {
                id: habit.id.clone(),
                name: habit.name.clone(),
                category: habit.category.as_str().to_string(),
                icon: habit.category.icon().to_string(),
                color: habit.category.color().to_string(),
            });
        }
    }

    let completed = completed_habits.len() as u32;
    DayStats {
        date,
        completed,
        total,
        rate: percent(u64::from(completed), u64::from(total)),
        active_categories: categories.len() as u32,
        completed_habits,
    }
}

/// Aggregates for the Monday-anchored week containing `today`.
pub fn week_stats(habits: &[Habit], today: DateKey) -> WeekStats {
    let habits = usable(habits);
    let total_habits = habits.len() as u32;
    let week_start = today.week_start();

    let mut per_day = Vec::with_capacity(7);
    let mut completed_days = 0u32;
    let mut total_completions = 0u32;
    for offset in 0..7 {
        let date = week_start.offset(offset);
        let completions = habits.iter().filter(|h| h.completed_on(date)).count() as u32;
        total_completions += completions;
        if completions > 0 {
            completed_days += 1;
        }
        per_day.push(DayCount {
            date,
            completions,
            total: total_habits,
        });
    }

    WeekStats {
        week_start,
        completed_days,
        total_completions,
        average_daily: (f64::from(total_completions) / 7.0).round() as u32,
        rate: percent(u64::from(total_completions), u64::from(total_habits) * 7),
        per_day,
    }
}

/// Aggregates for a full calendar month. Fails on an impossible year/month.
pub fn month_stats(habits: &[Habit], year: i32, month: u32) -> Result<MonthStats, InvalidDateKey> {
    let habits = usable(habits);
    let total_habits = habits.len() as u32;
    let first = DateKey::from_ymd(year, month, 1)?;
    let days_in_month = DateKey::days_in_month(year, month)?;

    let mut per_day = Vec::with_capacity(days_in_month as usize);
    let mut active_days = 0u32;
    let mut total_completions = 0u32;
    let mut best_day: Option<BestDay> = None;
    for day in 0..days_in_month {
        let date = first.offset(i64::from(day));
        let completions = habits.iter().filter(|h| h.completed_on(date)).count() as u32;
        total_completions += completions;
        if completions > 0 {
            active_days += 1;
        }
        // Strict comparison keeps the earliest date on ties.
        if completions > best_day.as_ref().map_or(0, |best| best.completions) {
            best_day = Some(BestDay { date, completions });
        }
        per_day.push(DayCount {
            date,
            completions,
            total: total_habits,
        });
    }

    Ok(MonthStats {
        year,
        month,
        active_days,
        total_completions,
        best_day,
        rate: percent(
            u64::from(total_completions),
            u64::from(total_habits) * u64::from(days_in_month),
        ),
        per_day,
    })
}

/// Days in the given month on which *any* habit was completed, counted once
/// regardless of how many habits were.
pub fn active_days_in_month(habits: &[Habit], year: i32, month: u32) -> u32 {
    let mut days: BTreeSet<DateKey> = BTreeSet::new();
    for habit in usable(habits) {
        days.extend(
            habit
                .completions
                .iter()
                .filter(|date| date.year() == year && date.month() == month),
        );
    }
    days.len() as u32
}

/// Days in the given month on which *every* habit was completed. With zero
/// habits no day is perfect.
pub fn perfect_days(
    habits: &[Habit],
    year: i32,
    month: u32,
) -> Result<Vec<DateKey>, InvalidDateKey> {
    let habits = usable(habits);
    if habits.is_empty() {
        return Ok(Vec::new());
    }
    let first = DateKey::from_ymd(year, month, 1)?;
    let days_in_month = DateKey::days_in_month(year, month)?;

    let mut perfect = Vec::new();
    for day in 0..days_in_month {
        let date = first.offset(i64::from(day));
        if habits.iter().all(|habit| habit.completed_on(date)) {
            perfect.push(date);
        }
    }
    Ok(perfect)
}

/// Dashboard summary for a user's habit snapshot.
pub fn summary(habits: &[Habit], today: DateKey) -> SummaryStats {
    let today_stats = day_stats(habits, today);
    let perfect = perfect_days(habits, today.year(), today.month())
        .map(|days| days.len() as u32)
        .unwrap_or(0);

    SummaryStats {
        total_habits: today_stats.total,
        completed_today: today_stats.completed,
        today_rate: today_stats.rate,
        current_streak: current_streak(habits, today),
        average_streak: streak_average(habits, today),
        active_days_this_month: active_days_in_month(habits, today.year(), today.month()),
        perfect_days_this_month: perfect,
    }
}

/// Per-habit card for list views: streak, lifetime rate, today's state.
pub fn habit_overview(habit: &Habit, today: DateKey, now: DateTime<Utc>) -> HabitOverview {
    HabitOverview {
        id: habit.id.clone(),
        name: habit.name.clone(),
        category: habit.category.as_str().to_string(),
        icon: habit.category.icon().to_string(),
        color: habit.category.color().to_string(),
        streak: compute_streak(&habit.completions, today),
        completion_rate: completion_rate(habit, now),
        completed_today: habit.completed_on(today),
        today_progress: habit.progress_on(today),
        target_value: habit.target_value,
    }
}
