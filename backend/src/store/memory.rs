use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{RecurringTaskDefinition, Task};
use crate::store::{DefinitionStore, TaskStore};

/// Non-durable store; contents live as long as the process.
pub struct MemoryStore<T> {
    items: Mutex<Vec<T>>,
}

impl<T: Clone> MemoryStore<T> {
    pub fn new() -> Self {
        Self::with_items(Vec::new())
    }

    pub fn with_items(items: Vec<T>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.items.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn replace(&self, items: &[T]) {
        *self.items.lock().unwrap_or_else(|e| e.into_inner()) = items.to_vec();
    }
}

impl<T: Clone> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for MemoryStore<Task> {
    async fn load_all(&self) -> Result<Vec<Task>, AppError> {
        Ok(self.snapshot())
    }

    async fn save_all(&self, tasks: &[Task]) -> Result<(), AppError> {
        self.replace(tasks);
        Ok(())
    }
}

#[async_trait]
impl DefinitionStore for MemoryStore<RecurringTaskDefinition> {
    async fn load_all(&self) -> Result<Vec<RecurringTaskDefinition>, AppError> {
        Ok(self.snapshot())
    }

    async fn save_all(&self, definitions: &[RecurringTaskDefinition]) -> Result<(), AppError> {
        self.replace(definitions);
        Ok(())
    }
}
