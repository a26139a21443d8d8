use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

type RefreshFn = Arc<dyn Fn() + Send + Sync>;

/// Periodically re-runs registered refresh thunks so time-bounded cached
/// reads stay warm instead of paying the reload on a foreground lookup.
///
/// Same cancellation discipline as the train scheduler: a stop flag polled
/// every tick, and `stop()` that joins the task before returning.
pub struct CacheRefresher {
    tasks: Vec<RefreshFn>,
    interval: Duration,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CacheRefresher {
    pub fn new(interval: Duration) -> Self {
        Self {
            tasks: Vec::new(),
            interval,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Registers a thunk to run every tick. Must be called before `start`;
    /// registrations after that are ignored by the running task.
    pub fn register<F>(&mut self, refresh: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.tasks.push(Arc::new(refresh));
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn start(&mut self) {
        if self.handle.is_some() {
            return;
        }
        self.running.store(true, Ordering::SeqCst);

        let tasks = self.tasks.clone();
        let interval = self.interval;
        let running = self.running.clone();
        self.handle = Some(tokio::spawn(async move {
            info!(
                event_name = "cache.refresher.started",
                task_count = tasks.len(),
                "cache refresher started"
            );
            while running.load(Ordering::SeqCst) {
                for task in &tasks {
                    task();
                }
                tokio::time::sleep(interval).await;
            }
            info!(event_name = "cache.refresher.stopped", "cache refresher stopped");
        }));
    }

    pub async fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if let Err(error) = handle.await {
                warn!(
                    event_name = "cache.refresher.join_failed",
                    error = %error,
                    "cache refresher task did not shut down cleanly"
                );
            }
        }
    }
}
