use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{RecurringTaskDefinition, Task};
use crate::store::{DefinitionStore, PairedStore, TaskStore};

/// SQLite-backed store for both collections.
///
/// `save_all` replaces a table's rows inside one transaction, so a failure
/// rolls back to the previous contents. Row order is kept in `position`.
/// `save_both` replaces both tables in a single transaction.
#[derive(Clone)]
pub struct SqliteStore {
    db: SqlitePool,
}

impl SqliteStore {
    /// Opens a pool for `database_url`.
    ///
    /// Every connection to an in-memory URL gets its own empty database, so
    /// those pools hold exactly one connection that is never recycled.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let options = if is_in_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = options.connect(database_url).await?;
        info!("connected to {}", database_url);
        Self::with_pool(pool).await
    }

    /// Wraps an existing pool and brings its schema up to date.
    pub async fn with_pool(db: SqlitePool) -> Result<Self, AppError> {
        sqlx::migrate!("./migrations").run(&db).await?;
        Ok(Self { db })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }
}

#[derive(Debug, FromRow)]
struct TaskRow {
    id: String,
    text: String,
    category: String,
    priority: String,
    created_date: NaiveDateTime,
    due_date: NaiveDateTime,
    completed: bool,
    recurring_source_id: Option<String>,
}

impl TryFrom<TaskRow> for Task {
    type Error = AppError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let recurring_source_id = row
            .recurring_source_id
            .as_deref()
            .map(parse_uuid)
            .transpose()?;

        Ok(Task {
            id: parse_uuid(&row.id)?,
            text: row.text,
            category: row.category.parse()?,
            priority: row.priority.parse()?,
            created_date: row.created_date,
            due_date: row.due_date,
            completed: row.completed,
            recurring_source_id,
        })
    }
}

#[derive(Debug, FromRow)]
struct DefinitionRow {
    id: String,
    text: String,
    category: String,
    priority: String,
    start_due_date: NaiveDateTime,
    pattern: String,
    end_date: Option<NaiveDateTime>,
    last_generated: NaiveDateTime,
}

impl TryFrom<DefinitionRow> for RecurringTaskDefinition {
    type Error = AppError;

    fn try_from(row: DefinitionRow) -> Result<Self, Self::Error> {
        Ok(RecurringTaskDefinition {
            id: parse_uuid(&row.id)?,
            text: row.text,
            category: row.category.parse()?,
            priority: row.priority.parse()?,
            start_due_date: row.start_due_date,
            pattern: row.pattern.parse()?,
            end_date: row.end_date,
            last_generated: row.last_generated,
        })
    }
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

fn parse_uuid(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|e| AppError::Database(sqlx::Error::Decode(Box::new(e))))
}

#[async_trait]
impl TaskStore for SqliteStore {
    async fn load_all(&self) -> Result<Vec<Task>, AppError> {
        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, text, category, priority, created_date, due_date,
                   completed, recurring_source_id
            FROM tasks
            ORDER BY position ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Task::try_from).collect()
    }

    async fn save_all(&self, tasks: &[Task]) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;
        replace_tasks(&mut *tx, tasks).await?;
        tx.commit().await?;
        debug!("saved {} tasks", tasks.len());
        Ok(())
    }
}

#[async_trait]
impl DefinitionStore for SqliteStore {
    async fn load_all(&self) -> Result<Vec<RecurringTaskDefinition>, AppError> {
        let rows = sqlx::query_as::<_, DefinitionRow>(
            r#"
            SELECT id, text, category, priority, start_due_date, pattern,
                   end_date, last_generated
            FROM recurring_definitions
            ORDER BY position ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(RecurringTaskDefinition::try_from).collect()
    }

    async fn save_all(&self, definitions: &[RecurringTaskDefinition]) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;
        replace_definitions(&mut *tx, definitions).await?;
        tx.commit().await?;
        debug!("saved {} recurring definitions", definitions.len());
        Ok(())
    }
}

#[async_trait]
impl PairedStore for SqliteStore {
    async fn save_both(
        &self,
        tasks: &[Task],
        definitions: &[RecurringTaskDefinition],
    ) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;
        replace_tasks(&mut *tx, tasks).await?;
        replace_definitions(&mut *tx, definitions).await?;
        tx.commit().await?;
        debug!(
            "saved {} tasks and {} recurring definitions together",
            tasks.len(),
            definitions.len()
        );
        Ok(())
    }
}

async fn replace_tasks(conn: &mut SqliteConnection, tasks: &[Task]) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM tasks").execute(&mut *conn).await?;

    for (position, task) in tasks.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO tasks
                (id, position, text, category, priority, created_date, due_date,
                completed, recurring_source_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(task.id.to_string())
        .bind(position as i64)
        .bind(&task.text)
        .bind(task.category.as_str())
        .bind(task.priority.as_str())
        .bind(task.created_date)
        .bind(task.due_date)
        .bind(task.completed)
        .bind(task.recurring_source_id.map(|id| id.to_string()))
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn replace_definitions(
    conn: &mut SqliteConnection,
    definitions: &[RecurringTaskDefinition],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM recurring_definitions")
        .execute(&mut *conn)
        .await?;

    for (position, definition) in definitions.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO recurring_definitions
                (id, position, text, category, priority, start_due_date, pattern,
                end_date, last_generated)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(definition.id.to_string())
        .bind(position as i64)
        .bind(&definition.text)
        .bind(definition.category.as_str())
        .bind(definition.priority.as_str())
        .bind(definition.start_due_date)
        .bind(definition.pattern.as_str())
        .bind(definition.end_date)
        .bind(definition.last_generated)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
