use std::sync::Arc;

use crate::services::{RecurrenceScheduler, TaskService};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TaskService>,
    pub scheduler: Arc<RecurrenceScheduler>,
    pub trend_window_days: u32,
}
