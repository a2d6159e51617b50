//! Decides when a recurring definition produces a task, and what that task is.
//!
//! A definition fires at most once per calendar day: the only state consulted is
//! the day of `last_generated`, so how often evaluation runs does not change the
//! generated set.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

use crate::clock::{day_of, start_of_day};
use crate::models::{Pattern, RecurringTaskDefinition, Task};

pub fn is_due(definition: &RecurringTaskDefinition, now: NaiveDateTime) -> bool {
    let today = day_of(now);

    if let Some(end) = definition.end_date {
        if day_of(end) < today {
            return false;
        }
    }

    if day_of(definition.last_generated) == today {
        return false;
    }

    match definition.pattern {
        Pattern::Daily => true,
        Pattern::Weekly => today.weekday() == definition.start_due_date.weekday(),
        // Anchors past the end of a short month never match, so the month is skipped.
        Pattern::Monthly => today.day() == definition.start_due_date.day(),
    }
}

/// Definitions that must materialize a task at `now`, in their stored order.
pub fn due_definitions(
    definitions: &[RecurringTaskDefinition],
    now: NaiveDateTime,
) -> Vec<&RecurringTaskDefinition> {
    definitions
        .iter()
        .filter(|definition| is_due(definition, now))
        .collect()
}

/// Concrete task for `now`'s day built from the definition's template.
pub fn materialize(definition: &RecurringTaskDefinition, now: NaiveDateTime) -> Task {
    let day = start_of_day(now);
    Task {
        id: Uuid::new_v4(),
        text: definition.text.clone(),
        category: definition.category,
        priority: definition.priority,
        created_date: day,
        due_date: day,
        completed: false,
        recurring_source_id: Some(definition.id),
    }
}

/// Moves `last_generated` forward to the latest day a stored task was generated
/// for that definition. Returns how many definitions changed.
pub fn reconcile_last_generated(
    definitions: &mut [RecurringTaskDefinition],
    tasks: &[Task],
) -> usize {
    let mut latest: HashMap<Uuid, NaiveDate> = HashMap::new();
    for task in tasks {
        if let Some(source) = task.recurring_source_id {
            let due = day_of(task.due_date);
            latest
                .entry(source)
                .and_modify(|day| *day = (*day).max(due))
                .or_insert(due);
        }
    }

    let mut moved = 0;
    for definition in definitions.iter_mut() {
        let Some(&generated) = latest.get(&definition.id) else {
            continue;
        };
        if generated > day_of(definition.last_generated) {
            definition.last_generated = generated.and_time(NaiveTime::MIN);
            moved += 1;
        }
    }
    moved
}
