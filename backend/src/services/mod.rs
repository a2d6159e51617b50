pub mod recurrence;
pub mod scheduler;
pub mod task_service;

pub use scheduler::{RecurrenceScheduler, SchedulerState};
pub use task_service::{GenerationFailure, TaskService, TickReport};
