use crate::datekey::{DateKey, InvalidDateKey};
use crate::models::Habit;
use crate::stats::{month_stats, week_stats};
use serde::Serialize;

/// Three-way cell classification: no completions, some, or all habits done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CellStatus {
    Empty,
    Partial,
    Full,
}

pub fn classify(completions: u32, total: u32) -> CellStatus {
    if total == 0 || completions == 0 {
        CellStatus::Empty
    } else if completions >= total {
        CellStatus::Full
    } else {
        CellStatus::Partial
    }
}

#[derive(Debug, Serialize)]
pub struct CalendarCell {
    pub date: DateKey,
    pub day: u32,
    pub completions: u32,
    pub total: u32,
    pub status: CellStatus,
    pub is_today: bool,
}

#[derive(Debug, Serialize)]
pub struct WeekView {
    pub week_start: DateKey,
    pub cells: Vec<CalendarCell>,
}

#[derive(Debug, Serialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    /// Blank grid cells before day 1, Sunday-indexed (0 = month starts Sunday).
    pub leading_blanks: u32,
    pub cells: Vec<CalendarCell>,
}

/// Seven ordered cells, Monday first, for the week containing `today`.
pub fn week_view(habits: &[Habit], today: DateKey) -> WeekView {
    let stats = week_stats(habits, today);
    let cells = stats
        .per_day
        .iter()
        .map(|day| CalendarCell {
            date: day.date,
            day: day.date.day(),
            completions: day.completions,
            total: day.total,
            status: classify(day.completions, day.total),
            is_today: day.date == today,
        })
        .collect();
    WeekView {
        week_start: stats.week_start,
        cells,
    }
}

/// Full month grid with leading blanks for the weekday offset of day 1.
pub fn month_view(
    habits: &[Habit],
    year: i32,
    month: u32,
    today: DateKey,
) -> Result<MonthView, InvalidDateKey> {
    let stats = month_stats(habits, year, month)?;
    let leading_blanks = DateKey::from_ymd(year, month, 1)?.weekday_from_sunday();
    let cells = stats
        .per_day
        .iter()
        .map(|day| CalendarCell {
            date: day.date,
            day: day.date.day(),
            completions: day.completions,
            total: day.total,
            status: classify(day.completions, day.total),
            is_today: day.date == today,
        })
        .collect();
    Ok(MonthView {
        year,
        month,
        leading_blanks,
        cells,
    })
}
