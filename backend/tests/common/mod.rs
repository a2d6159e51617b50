#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::Notify;
use uuid::Uuid;

use worklog::clock::{Clock, ManualClock};
use worklog::error::AppError;
use worklog::models::{Category, Pattern, Priority, RecurringTaskDefinition, Task};
use worklog::services::TaskService;
use worklog::store::{DefinitionStore, MemoryStore, TaskStore};

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, min, 0))
        .expect("valid test timestamp")
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

pub fn task(text: &str, category: Category, priority: Priority, due: NaiveDateTime, completed: bool) -> Task {
    Task {
        id: Uuid::new_v4(),
        text: text.to_string(),
        category,
        priority,
        created_date: due,
        due_date: due,
        completed,
        recurring_source_id: None,
    }
}

pub fn definition(
    text: &str,
    pattern: Pattern,
    start_due_date: NaiveDateTime,
    last_generated: NaiveDateTime,
) -> RecurringTaskDefinition {
    RecurringTaskDefinition {
        id: Uuid::new_v4(),
        text: text.to_string(),
        category: Category::Work,
        priority: Priority::High,
        start_due_date,
        pattern,
        end_date: None,
        last_generated,
    }
}

/// Memory store whose next `n` saves fail, or one chosen save by number.
pub struct FlakyStore<T> {
    inner: MemoryStore<T>,
    failures_left: AtomicUsize,
    fail_on_call: AtomicUsize,
    save_calls: AtomicUsize,
}

impl<T: Clone> FlakyStore<T> {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            failures_left: AtomicUsize::new(0),
            fail_on_call: AtomicUsize::new(0),
            save_calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_next_saves(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    /// Fails only the `call`th save counted from the store's creation (1-based).
    pub fn fail_save_number(&self, call: usize) {
        self.fail_on_call.store(call, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.inner.snapshot()
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    fn should_fail(&self) -> bool {
        let call = self.save_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on_call.load(Ordering::SeqCst) {
            return true;
        }
        self.failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

fn injected() -> AppError {
    AppError::Io(std::io::Error::other("injected save failure"))
}

#[async_trait]
impl TaskStore for FlakyStore<Task> {
    async fn load_all(&self) -> Result<Vec<Task>, AppError> {
        TaskStore::load_all(&self.inner).await
    }

    async fn save_all(&self, tasks: &[Task]) -> Result<(), AppError> {
        if self.should_fail() {
            return Err(injected());
        }
        TaskStore::save_all(&self.inner, tasks).await
    }
}

#[async_trait]
impl DefinitionStore for FlakyStore<RecurringTaskDefinition> {
    async fn load_all(&self) -> Result<Vec<RecurringTaskDefinition>, AppError> {
        DefinitionStore::load_all(&self.inner).await
    }

    async fn save_all(&self, definitions: &[RecurringTaskDefinition]) -> Result<(), AppError> {
        if self.should_fail() {
            return Err(injected());
        }
        DefinitionStore::save_all(&self.inner, definitions).await
    }
}

/// Memory store whose every save blocks until the test calls `release`.
pub struct GatedStore<T> {
    inner: MemoryStore<T>,
    entered: Notify,
    gate: Notify,
    save_calls: AtomicUsize,
}

impl<T: Clone> GatedStore<T> {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            entered: Notify::new(),
            gate: Notify::new(),
            save_calls: AtomicUsize::new(0),
        }
    }

    /// Resolves once a save is waiting at the gate.
    pub async fn wait_for_save(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.inner.snapshot()
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskStore for GatedStore<Task> {
    async fn load_all(&self) -> Result<Vec<Task>, AppError> {
        TaskStore::load_all(&self.inner).await
    }

    async fn save_all(&self, tasks: &[Task]) -> Result<(), AppError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.gate.notified().await;
        TaskStore::save_all(&self.inner, tasks).await
    }
}

pub struct GatedHarness {
    pub service: Arc<TaskService>,
    pub clock: Arc<ManualClock>,
    pub tasks: Arc<GatedStore<Task>>,
}

/// Service over a gated task store and the given definitions.
pub async fn gated_harness(now: NaiveDateTime, definitions: Vec<RecurringTaskDefinition>) -> GatedHarness {
    let clock = Arc::new(ManualClock::new(now));
    let tasks = Arc::new(GatedStore::<Task>::new());

    let task_store: Arc<dyn TaskStore> = tasks.clone();
    let definition_store: Arc<dyn DefinitionStore> = Arc::new(MemoryStore::with_items(definitions));
    let service_clock: Arc<dyn Clock> = clock.clone();

    let service = TaskService::load(task_store, definition_store, service_clock)
        .await
        .expect("memory stores load");

    GatedHarness {
        service: Arc::new(service),
        clock,
        tasks,
    }
}

pub struct Harness {
    pub service: Arc<TaskService>,
    pub clock: Arc<ManualClock>,
    pub tasks: Arc<FlakyStore<Task>>,
    pub definitions: Arc<FlakyStore<RecurringTaskDefinition>>,
}

pub async fn harness(start: NaiveDateTime) -> Harness {
    let clock = Arc::new(ManualClock::new(start));
    let tasks = Arc::new(FlakyStore::<Task>::new());
    let definitions = Arc::new(FlakyStore::<RecurringTaskDefinition>::new());

    let task_store: Arc<dyn TaskStore> = tasks.clone();
    let definition_store: Arc<dyn DefinitionStore> = definitions.clone();
    let service_clock: Arc<dyn Clock> = clock.clone();

    let service = TaskService::load(task_store, definition_store, service_clock)
        .await
        .expect("empty stores load");

    Harness {
        service: Arc::new(service),
        clock,
        tasks,
        definitions,
    }
}
