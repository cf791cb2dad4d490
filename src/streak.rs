use crate::datekey::DateKey;
use crate::models::Habit;
use std::collections::BTreeSet;
use tracing::warn;

/// Current consecutive-day streak ending at `today`.
///
/// Walks the completion dates from most recent to oldest. The chain may
/// start at today or at yesterday (an unmarked today does not break a
/// streak the user kept through yesterday); after that every date must be
/// exactly one day before the previous one.
pub fn compute_streak(completions: &BTreeSet<DateKey>, today: DateKey) -> u32 {
    let mut streak = 0u32;
    let mut cursor = today;
    for &date in completions.iter().rev() {
        let gap = cursor.days_between(date);
        if gap == 0 || gap == 1 {
            streak += 1;
            cursor = date;
        } else {
            break;
        }
    }
    streak
}

/// Dashboard streak across a user's habits: the maximum per-habit streak.
/// One well-maintained habit is not diluted by newly created ones.
pub fn current_streak(habits: &[Habit], today: DateKey) -> u32 {
    habits
        .iter()
        .filter(|habit| check_usable(habit))
        .map(|habit| compute_streak(&habit.completions, today))
        .max()
        .unwrap_or(0)
}

/// Rounded mean of per-habit streaks; 0 with no habits.
pub fn streak_average(habits: &[Habit], today: DateKey) -> u32 {
    let streaks: Vec<u32> = habits
        .iter()
        .filter(|habit| check_usable(habit))
        .map(|habit| compute_streak(&habit.completions, today))
        .collect();
    if streaks.is_empty() {
        return 0;
    }
    let total: u64 = streaks.iter().map(|&s| u64::from(s)).sum();
    ((total as f64 / streaks.len() as f64).round()) as u32
}

fn check_usable(habit: &Habit) -> bool {
    if habit.is_valid() {
        true
    } else {
        warn!(habit_id = %habit.id, "skipping malformed habit in streak computation");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HabitPayload;
    use chrono::Utc;

    fn key(raw: &str) -> DateKey {
        DateKey::parse(raw).unwrap()
    }

    fn set(dates: &[&str]) -> BTreeSet<DateKey> {
        dates.iter().map(|raw| key(raw)).collect()
    }

    fn habit_with(dates: &[&str]) -> Habit {
        let mut habit = Habit::create(
            "user-1",
            HabitPayload {
                name: "Walk".to_string(),
                category: "exercise".to_string(),
                goal: None,
                description: None,
                target_value: None,
            },
            Utc::now(),
        );
        habit.completions = set(dates);
        habit
    }

    #[test]
    fn empty_set_has_zero_streak() {
        assert_eq!(compute_streak(&BTreeSet::new(), key("2024-01-04")), 0);
    }

    #[test]
    fn run_ending_today_counts_every_day() {
        let completions = set(&["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04"]);
        assert_eq!(compute_streak(&completions, key("2024-01-04")), 4);
    }

    #[test]
    fn unmarked_today_keeps_streak_current() {
        // Completions through yesterday; today not yet acted on.
        let completions = set(&["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert_eq!(compute_streak(&completions, key("2024-01-04")), 3);
    }

    #[test]
    fn two_idle_days_break_the_chain() {
        let completions = set(&["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert_eq!(compute_streak(&completions, key("2024-01-05")), 0);
    }

    #[test]
    fn lone_old_completion_is_zero() {
        let completions = set(&["2024-01-01"]);
        assert_eq!(compute_streak(&completions, key("2024-01-06")), 0);
    }

    #[test]
    fn earlier_contiguous_day_extends_by_one() {
        let today = key("2024-01-05");
        let shorter = set(&["2024-01-03", "2024-01-04", "2024-01-05"]);
        let longer = set(&["2024-01-02", "2024-01-03", "2024-01-04", "2024-01-05"]);
        assert_eq!(
            compute_streak(&longer, today),
            compute_streak(&shorter, today) + 1
        );
    }

    #[test]
    fn gapped_day_does_not_extend() {
        let today = key("2024-01-05");
        let base = set(&["2024-01-04", "2024-01-05"]);
        let gapped = set(&["2024-01-01", "2024-01-04", "2024-01-05"]);
        assert_eq!(compute_streak(&gapped, today), compute_streak(&base, today));
    }

    #[test]
    fn user_streak_is_maximum_across_habits() {
        let today = key("2024-01-04");
        let strong = habit_with(&["2024-01-02", "2024-01-03", "2024-01-04"]);
        let fresh = habit_with(&[]);
        let habits = vec![strong, fresh];

        assert_eq!(current_streak(&habits, today), 3);
        // Mean of 3 and 0, rounded half-up.
        assert_eq!(streak_average(&habits, today), 2);
    }

    #[test]
    fn no_habits_means_zero_everywhere() {
        let today = key("2024-01-04");
        assert_eq!(current_streak(&[], today), 0);
        assert_eq!(streak_average(&[], today), 0);
    }
}
