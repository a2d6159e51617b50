use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Work,
    Personal,
    Meeting,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Work => "work",
            Category::Personal => "personal",
            Category::Meeting => "meeting",
            Category::Other => "other",
        }
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "work" => Ok(Category::Work),
            "personal" => Ok(Category::Personal),
            "meeting" => Ok(Category::Meeting),
            "other" => Ok(Category::Other),
            _ => Err(AppError::Validation(format!("unknown category '{}'", s))),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(AppError::Validation(format!("unknown priority '{}'", s))),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub text: String,
    pub category: Category,
    pub priority: Priority,
    pub created_date: NaiveDateTime,
    pub due_date: NaiveDateTime,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub recurring_source_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTaskRequest {
    pub text: String,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDateTime>,
}

impl NewTaskRequest {
    /// Builds a task created at `now`. The due date defaults to `now`.
    pub fn into_task(self, now: NaiveDateTime) -> Result<Task, AppError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("task text must not be empty".to_string()));
        }

        Ok(Task {
            id: Uuid::new_v4(),
            text: text.to_string(),
            category: self.category.unwrap_or_default(),
            priority: self.priority.unwrap_or_default(),
            created_date: now,
            due_date: self.due_date.unwrap_or(now),
            completed: false,
            recurring_source_id: None,
        })
    }
}
