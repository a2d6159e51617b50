use std::collections::BTreeMap;

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::clock::day_of;
use crate::dashboard::{by_due_day, completion_rate};
use crate::models::{Category, Priority, Task};

/// Longest trend window served; larger requests are clamped to it.
pub const MAX_TREND_WINDOW_DAYS: u32 = 366;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryStat {
    pub total: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub day: NaiveDate,
    pub completion_rate: u8,
}

/// Task and completion counts per category. Categories without tasks are absent.
pub fn category_stats(tasks: &[Task]) -> BTreeMap<Category, CategoryStat> {
    let mut stats: BTreeMap<Category, CategoryStat> = BTreeMap::new();
    for task in tasks {
        let entry = stats.entry(task.category).or_default();
        entry.total += 1;
        if task.completed {
            entry.completed += 1;
        }
    }
    stats
}

pub fn priority_distribution(tasks: &[Task]) -> BTreeMap<Priority, usize> {
    let mut counts = BTreeMap::new();
    for task in tasks {
        *counts.entry(task.priority).or_insert(0) += 1;
    }
    counts
}

/// Completion rate for each of the `window_days` days ending on the day of `now`,
/// oldest first. Days without tasks report `0`. The window is clamped to
/// [`MAX_TREND_WINDOW_DAYS`] and never reaches before the earliest `NaiveDate`.
pub fn completion_trend(tasks: &[Task], now: NaiveDateTime, window_days: u32) -> Vec<TrendPoint> {
    let today = day_of(now);
    (0..window_days.min(MAX_TREND_WINDOW_DAYS))
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(u64::from(offset))))
        .map(|day| TrendPoint {
            day,
            completion_rate: completion_rate(by_due_day(tasks, day)),
        })
        .collect()
}
