use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::error::AppError;
use crate::services::task_service::{TaskService, TickReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Stopped,
    Running,
}

struct Worker {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Periodically materializes due recurring tasks.
///
/// Ticks run one after another on a single task, so they never overlap. The
/// first tick fires as soon as the scheduler starts.
pub struct RecurrenceScheduler {
    service: Arc<TaskService>,
    interval: Duration,
    worker: Mutex<Option<Worker>>,
}

impl RecurrenceScheduler {
    pub fn new(service: Arc<TaskService>, interval: Duration) -> Self {
        Self {
            service,
            interval,
            worker: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> SchedulerState {
        let worker = self.worker.lock().unwrap_or_else(|e| e.into_inner());
        match worker.as_ref() {
            Some(w) if !w.handle.is_finished() => SchedulerState::Running,
            _ => SchedulerState::Stopped,
        }
    }

    /// Spawns the tick loop on the current tokio runtime.
    pub fn start(&self) -> Result<(), AppError> {
        if self.interval.is_zero() {
            return Err(AppError::Config(
                "scheduler interval must be greater than zero".to_string(),
            ));
        }

        let mut worker = self.worker.lock().unwrap_or_else(|e| e.into_inner());
        if worker.as_ref().is_some_and(|w| !w.handle.is_finished()) {
            return Err(AppError::Conflict("scheduler is already running".to_string()));
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(run(self.service.clone(), self.interval, stop_rx));
        *worker = Some(Worker { stop_tx, handle });

        info!("Starting recurrence scheduler (interval: {:?})", self.interval);
        Ok(())
    }

    /// Prevents further ticks and waits for an in-flight tick to finish.
    pub async fn stop(&self) {
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        let Some(worker) = worker else {
            return;
        };

        let _ = worker.stop_tx.send(true);
        if let Err(e) = worker.handle.await {
            warn!("Recurrence scheduler ended abnormally: {}", e);
        }
        info!("Recurrence scheduler stopped");
    }

    /// Runs a single evaluation outside the periodic loop.
    pub async fn tick(&self) -> TickReport {
        self.service.generate_due().await
    }
}

impl Drop for RecurrenceScheduler {
    fn drop(&mut self) {
        let worker = self.worker.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(worker) = worker.take() {
            let _ = worker.stop_tx.send(true);
        }
    }
}

async fn run(service: Arc<TaskService>, period: Duration, mut stop_rx: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = stop_rx.changed() => break,
            _ = ticker.tick() => {}
        }
        if *stop_rx.borrow() {
            break;
        }

        let report = service.generate_due().await;
        if report.failed.is_empty() {
            if !report.generated.is_empty() {
                info!(
                    "Recurrence tick generated {} tasks from {} definitions",
                    report.generated.len(),
                    report.evaluated
                );
            }
        } else {
            // Failed definitions keep their last_generated and are retried next tick.
            warn!(
                "Recurrence tick generated {} tasks, {} failed",
                report.generated.len(),
                report.failed.len()
            );
        }
    }
}
