use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Category, Priority};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    Daily,
    Weekly,
    Monthly,
}

impl Pattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pattern::Daily => "daily",
            Pattern::Weekly => "weekly",
            Pattern::Monthly => "monthly",
        }
    }
}

impl FromStr for Pattern {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Pattern::Daily),
            "weekly" => Ok(Pattern::Weekly),
            "monthly" => Ok(Pattern::Monthly),
            _ => Err(AppError::Validation(format!(
                "unknown recurrence pattern '{}', expected daily, weekly or monthly",
                s
            ))),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Template plus pattern that drives automatic task generation.
///
/// `pattern` and `start_due_date` are fixed once the definition exists; changing
/// the schedule means deleting it and creating a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringTaskDefinition {
    pub id: Uuid,
    pub text: String,
    pub category: Category,
    pub priority: Priority,
    pub start_due_date: NaiveDateTime,
    pub pattern: Pattern,
    #[serde(default)]
    pub end_date: Option<NaiveDateTime>,
    pub last_generated: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewDefinitionRequest {
    pub text: String,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub start_due_date: Option<NaiveDateTime>,
    pub pattern: Option<String>,
    pub end_date: Option<NaiveDateTime>,
}

impl NewDefinitionRequest {
    /// Validates the request into a definition created at `now`.
    pub fn into_definition(self, now: NaiveDateTime) -> Result<RecurringTaskDefinition, AppError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(AppError::Validation(
                "recurring task text must not be empty".to_string(),
            ));
        }
        let start_due_date = self.start_due_date.ok_or_else(|| {
            AppError::Validation("recurring task requires a start due date".to_string())
        })?;
        let pattern = self
            .pattern
            .as_deref()
            .ok_or_else(|| {
                AppError::Validation("recurring task requires a pattern".to_string())
            })?
            .parse::<Pattern>()?;

        Ok(RecurringTaskDefinition {
            id: Uuid::new_v4(),
            text: text.to_string(),
            category: self.category.unwrap_or_default(),
            priority: self.priority.unwrap_or_default(),
            start_due_date,
            pattern,
            end_date: self.end_date,
            last_generated: now,
        })
    }
}
