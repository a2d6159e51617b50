use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::clock::{Clock, day_of};
use crate::dashboard::{self, CategoryStat, StatusFilter, TrendPoint};
use crate::error::AppError;
use crate::models::{
    Category, NewDefinitionRequest, NewTaskRequest, Priority, RecurringTaskDefinition, Task,
};
use crate::services::recurrence;
use crate::store::{DefinitionStore, PairedStore, TaskStore};

struct Collections {
    tasks: Vec<Task>,
    definitions: Vec<RecurringTaskDefinition>,
}

/// Owns the in-memory task and definition collections.
///
/// Every mutation runs under one lock: the next collection is built, persisted,
/// and only swapped into memory once the store accepted it. A failed save leaves
/// memory at the last state that was saved.
pub struct TaskService {
    state: Mutex<Collections>,
    task_store: Arc<dyn TaskStore>,
    definition_store: Arc<dyn DefinitionStore>,
    paired_store: Option<Arc<dyn PairedStore>>,
    clock: Arc<dyn Clock>,
}

#[derive(Debug, Default, Serialize)]
pub struct TickReport {
    pub evaluated: usize,
    pub generated: Vec<Uuid>,
    pub failed: Vec<GenerationFailure>,
}

#[derive(Debug, Serialize)]
pub struct GenerationFailure {
    pub definition_id: Uuid,
    pub message: String,
}

impl TaskService {
    /// Loads both collections from their stores.
    ///
    /// A definition whose generated task was saved without its `last_generated`
    /// stamp is moved forward to that task's day, so the day is not generated
    /// twice.
    pub async fn load(
        task_store: Arc<dyn TaskStore>,
        definition_store: Arc<dyn DefinitionStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        let tasks = task_store.load_all().await?;
        let mut definitions = definition_store.load_all().await?;
        info!(
            "Loaded {} tasks and {} recurring definitions",
            tasks.len(),
            definitions.len()
        );

        let reconciled = recurrence::reconcile_last_generated(&mut definitions, &tasks);
        if reconciled > 0 {
            warn!(
                "Moved last_generated forward on {} recurring definitions to match stored tasks",
                reconciled
            );
            if let Err(e) = definition_store.save_all(&definitions).await {
                warn!("Could not save reconciled recurring definitions: {}", e);
            }
        }

        Ok(Self {
            state: Mutex::new(Collections { tasks, definitions }),
            task_store,
            definition_store,
            paired_store: None,
            clock,
        })
    }

    /// Persists generated tasks and their definition stamp through `store` in
    /// one write. Use when a single backend holds both collections.
    pub fn with_paired_store(mut self, store: Arc<dyn PairedStore>) -> Self {
        self.paired_store = Some(store);
        self
    }

    pub fn today(&self) -> NaiveDate {
        day_of(self.clock.now())
    }

    pub async fn list_tasks(&self) -> Vec<Task> {
        self.state.lock().await.tasks.clone()
    }

    pub async fn add_task(&self, req: NewTaskRequest) -> Result<Task, AppError> {
        let task = req.into_task(self.clock.now())?;

        let mut state = self.state.lock().await;
        let mut next = state.tasks.clone();
        next.push(task.clone());
        self.task_store.save_all(&next).await?;
        state.tasks = next;

        info!("Added task {} ({})", task.id, task.text);
        Ok(task)
    }

    pub async fn delete_task(&self, id: Uuid) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        if !state.tasks.iter().any(|t| t.id == id) {
            return Err(AppError::NotFound);
        }
        let next: Vec<Task> = state.tasks.iter().filter(|t| t.id != id).cloned().collect();
        self.task_store.save_all(&next).await?;
        state.tasks = next;

        info!("Deleted task {}", id);
        Ok(())
    }

    /// Flips the completion flag and returns the updated task.
    pub async fn toggle_task(&self, id: Uuid) -> Result<Task, AppError> {
        let mut state = self.state.lock().await;
        let index = state
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(AppError::NotFound)?;

        let mut next = state.tasks.clone();
        next[index].completed = !next[index].completed;
        let updated = next[index].clone();
        self.task_store.save_all(&next).await?;
        state.tasks = next;

        debug!("Task {} completed={}", id, updated.completed);
        Ok(updated)
    }

    pub async fn list_definitions(&self) -> Vec<RecurringTaskDefinition> {
        self.state.lock().await.definitions.clone()
    }

    pub async fn create_definition(
        &self,
        req: NewDefinitionRequest,
    ) -> Result<RecurringTaskDefinition, AppError> {
        let definition = req.into_definition(self.clock.now())?;

        let mut state = self.state.lock().await;
        let mut next = state.definitions.clone();
        next.push(definition.clone());
        self.definition_store.save_all(&next).await?;
        state.definitions = next;

        info!(
            "Created {} recurring task {} ({})",
            definition.pattern, definition.id, definition.text
        );
        Ok(definition)
    }

    /// Stops future generation. Tasks already materialized from it are kept.
    pub async fn delete_definition(&self, id: Uuid) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        if !state.definitions.iter().any(|d| d.id == id) {
            return Err(AppError::NotFound);
        }
        let next: Vec<RecurringTaskDefinition> = state
            .definitions
            .iter()
            .filter(|d| d.id != id)
            .cloned()
            .collect();
        self.definition_store.save_all(&next).await?;
        state.definitions = next;

        info!("Deleted recurring task {}", id);
        Ok(())
    }

    /// Evaluates every definition against the clock and materializes the due ones.
    ///
    /// Each due definition is handled on its own: a failure is recorded in the
    /// report and the remaining definitions are still processed.
    pub async fn generate_due(&self) -> TickReport {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        let due: Vec<Uuid> = recurrence::due_definitions(&state.definitions, now)
            .into_iter()
            .map(|d| d.id)
            .collect();

        let mut report = TickReport {
            evaluated: state.definitions.len(),
            ..TickReport::default()
        };

        for definition_id in due {
            match self.generate(&mut state, definition_id, now).await {
                Ok(task) => {
                    info!("Generated task {} from recurring task {}", task.id, definition_id);
                    report.generated.push(task.id);
                }
                Err(e) => {
                    warn!("Failed to generate task from recurring task {}: {}", definition_id, e);
                    report.failed.push(GenerationFailure {
                        definition_id,
                        message: e.to_string(),
                    });
                }
            }
        }

        report
    }

    /// Appends the materialized task and stamps `last_generated` as one unit.
    ///
    /// With a paired store both collections go out in one write. Otherwise tasks
    /// are persisted first; if the definition save then fails, the task store is
    /// put back to its previous contents and the definition stays due. Should
    /// that restore fail too, `load` repairs the stamp from the saved task.
    async fn generate(
        &self,
        state: &mut Collections,
        definition_id: Uuid,
        now: NaiveDateTime,
    ) -> Result<Task, AppError> {
        let index = state
            .definitions
            .iter()
            .position(|d| d.id == definition_id)
            .ok_or(AppError::NotFound)?;

        let task = recurrence::materialize(&state.definitions[index], now);

        let mut next_tasks = state.tasks.clone();
        next_tasks.push(task.clone());
        let mut next_definitions = state.definitions.clone();
        next_definitions[index].last_generated = now;

        if let Some(paired) = &self.paired_store {
            paired.save_both(&next_tasks, &next_definitions).await?;
        } else {
            self.task_store.save_all(&next_tasks).await?;

            if let Err(e) = self.definition_store.save_all(&next_definitions).await {
                if let Err(rollback) = self.task_store.save_all(&state.tasks).await {
                    error!(
                        "Could not roll back task {} after recurring task {} failed to save: {}",
                        task.id, definition_id, rollback
                    );
                }
                return Err(e);
            }
        }

        state.tasks = next_tasks;
        state.definitions = next_definitions;
        Ok(task)
    }

    /// Tasks due on `day`, narrowed by completion status.
    pub async fn filtered_tasks(&self, day: NaiveDate, status: StatusFilter) -> Vec<Task> {
        let state = self.state.lock().await;
        dashboard::by_status(dashboard::by_due_day(&state.tasks, day), status)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn completion_rate(&self, day: NaiveDate) -> u8 {
        let state = self.state.lock().await;
        dashboard::completion_rate(dashboard::by_due_day(&state.tasks, day))
    }

    pub async fn category_stats(&self) -> BTreeMap<Category, CategoryStat> {
        dashboard::category_stats(&self.state.lock().await.tasks)
    }

    pub async fn priority_distribution(&self) -> BTreeMap<Priority, usize> {
        dashboard::priority_distribution(&self.state.lock().await.tasks)
    }

    pub async fn completion_trend(&self, window_days: u32) -> Vec<TrendPoint> {
        let now = self.clock.now();
        dashboard::completion_trend(&self.state.lock().await.tasks, now, window_days)
    }
}
