use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::AppError;
use crate::models::{RecurringTaskDefinition, Task};
use crate::store::{DefinitionStore, TaskStore};

/// Stores a collection as a pretty-printed JSON array in a single file.
pub struct JsonFileStore<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file means an empty collection; unreadable or malformed files are errors.
    async fn read(&self) -> Result<Vec<T>, AppError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} does not exist yet, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    /// Writes to a sibling temp file and renames it over the target.
    async fn write(&self, items: &[T]) -> Result<(), AppError> {
        let body = serde_json::to_string_pretty(items)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, body.as_bytes()).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("wrote {} records to {}", items.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl TaskStore for JsonFileStore<Task> {
    async fn load_all(&self) -> Result<Vec<Task>, AppError> {
        self.read().await
    }

    async fn save_all(&self, tasks: &[Task]) -> Result<(), AppError> {
        self.write(tasks).await
    }
}

#[async_trait]
impl DefinitionStore for JsonFileStore<RecurringTaskDefinition> {
    async fn load_all(&self) -> Result<Vec<RecurringTaskDefinition>, AppError> {
        self.read().await
    }

    async fn save_all(&self, definitions: &[RecurringTaskDefinition]) -> Result<(), AppError> {
        self.write(definitions).await
    }
}
