use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clock::day_of;
use crate::dashboard::percent;
use crate::models::Task;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => !task.completed,
            StatusFilter::Completed => task.completed,
        }
    }
}

/// Tasks whose due date falls on `day`, time of day ignored.
pub fn by_due_day<'a, I>(tasks: I, day: NaiveDate) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    tasks
        .into_iter()
        .filter(|task| day_of(task.due_date) == day)
        .collect()
}

pub fn by_status<'a, I>(tasks: I, status: StatusFilter) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    tasks
        .into_iter()
        .filter(|task| status.matches(task))
        .collect()
}

/// Percentage of completed tasks, `0` for an empty input.
pub fn completion_rate<'a, I>(tasks: I) -> u8
where
    I: IntoIterator<Item = &'a Task>,
{
    let (total, completed) = tasks
        .into_iter()
        .fold((0usize, 0usize), |(total, completed), task| {
            (total + 1, completed + usize::from(task.completed))
        });
    percent(completed, total)
}
