//! Durable whole-collection persistence for tasks and recurring definitions.
//!
//! Both stores load and save the full ordered collection; there are no partial
//! updates. A failed `save_all` must leave the previously saved collection
//! readable.

pub mod json;
pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::StoreBackend;
use crate::error::AppError;
use crate::models::{RecurringTaskDefinition, Task};

pub use json::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn load_all(&self) -> Result<Vec<Task>, AppError>;
    async fn save_all(&self, tasks: &[Task]) -> Result<(), AppError>;
}

#[async_trait]
pub trait DefinitionStore: Send + Sync {
    async fn load_all(&self) -> Result<Vec<RecurringTaskDefinition>, AppError>;
    async fn save_all(&self, definitions: &[RecurringTaskDefinition]) -> Result<(), AppError>;
}

/// A backend holding both collections that can replace them in one atomic write.
#[async_trait]
pub trait PairedStore: Send + Sync {
    async fn save_both(
        &self,
        tasks: &[Task],
        definitions: &[RecurringTaskDefinition],
    ) -> Result<(), AppError>;
}

pub struct Stores {
    pub tasks: Arc<dyn TaskStore>,
    pub definitions: Arc<dyn DefinitionStore>,
    /// Set when one backend holds both collections.
    pub paired: Option<Arc<dyn PairedStore>>,
}

impl Stores {
    pub fn separate(tasks: Arc<dyn TaskStore>, definitions: Arc<dyn DefinitionStore>) -> Self {
        Self {
            tasks,
            definitions,
            paired: None,
        }
    }
}

/// Opens the task and definition stores for the configured backend.
pub async fn open(backend: &StoreBackend) -> Result<Stores, AppError> {
    match backend {
        StoreBackend::Json { data_dir } => {
            info!("Using JSON stores in {}", data_dir.display());
            let tasks: Arc<dyn TaskStore> =
                Arc::new(JsonFileStore::<Task>::new(data_dir.join("tasks.json")));
            let definitions: Arc<dyn DefinitionStore> = Arc::new(
                JsonFileStore::<RecurringTaskDefinition>::new(data_dir.join("recurring.json")),
            );
            Ok(Stores::separate(tasks, definitions))
        }
        StoreBackend::Sqlite { database_url } => {
            let store = Arc::new(SqliteStore::connect(database_url).await?);
            let tasks: Arc<dyn TaskStore> = store.clone();
            let definitions: Arc<dyn DefinitionStore> = store.clone();
            let paired: Arc<dyn PairedStore> = store;
            Ok(Stores {
                tasks,
                definitions,
                paired: Some(paired),
            })
        }
        StoreBackend::Memory => {
            warn!("Using in-memory stores, nothing will survive a restart");
            let tasks: Arc<dyn TaskStore> = Arc::new(MemoryStore::<Task>::new());
            let definitions: Arc<dyn DefinitionStore> =
                Arc::new(MemoryStore::<RecurringTaskDefinition>::new());
            Ok(Stores::separate(tasks, definitions))
        }
    }
}
