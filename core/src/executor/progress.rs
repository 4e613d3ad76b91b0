use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use super::board::TaskBoard;
use super::traits::{OutputRenderer, RenderEvent};
use super::types::{TaskPatch, TaskUpdate};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Coalescing bridge between workers and the observer.
///
/// Workers `enqueue` partial updates. Queued updates reach the board and the
/// renderers either on an explicit `flush` or after the queue has been quiet
/// for the debounce window. The two triggers are independent.
pub struct ProgressSink {
    inner: Arc<SinkInner>,
    debouncer: Mutex<Option<JoinHandle<()>>>,
}

struct SinkInner {
    run_id: String,
    board: Arc<TaskBoard>,
    renderers: Vec<Arc<dyn OutputRenderer>>,
    queue: Mutex<Vec<TaskUpdate>>,
    /// Serializes deliveries so batches never interleave.
    deliver: Mutex<()>,
    kick: Notify,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl SinkInner {
    fn flush(&self) -> usize {
        let _delivery = lock(&self.deliver);
        let drained = std::mem::take(&mut *lock(&self.queue));
        if drained.is_empty() {
            return 0;
        }

        let updates = coalesce(drained);
        self.board.apply(&updates);

        let count = updates.len();
        let event = RenderEvent::TaskUpdates {
            run_id: self.run_id.clone(),
            updates,
        };
        for renderer in &self.renderers {
            renderer.render(&event);
        }
        count
    }
}

impl ProgressSink {
    /// Create the sink and start its debounce timer. Must be called inside a
    /// tokio runtime.
    pub fn start(
        run_id: impl Into<String>,
        board: Arc<TaskBoard>,
        renderers: Vec<Arc<dyn OutputRenderer>>,
        debounce: Duration,
    ) -> Self {
        let inner = Arc::new(SinkInner {
            run_id: run_id.into(),
            board,
            renderers,
            queue: Mutex::new(Vec::new()),
            deliver: Mutex::new(()),
            kick: Notify::new(),
        });

        let timer = inner.clone();
        let handle = tokio::spawn(async move {
            loop {
                timer.kick.notified().await;
                // Restart the window on every new enqueue.
                loop {
                    tokio::select! {
                        _ = tokio::time::sleep(debounce) => {
                            timer.flush();
                            break;
                        }
                        _ = timer.kick.notified() => continue,
                    }
                }
            }
        });

        Self {
            inner,
            debouncer: Mutex::new(Some(handle)),
        }
    }

    pub fn enqueue(&self, task_id: &str, patch: TaskPatch) {
        lock(&self.inner.queue).push(TaskUpdate {
            task_id: task_id.to_string(),
            patch,
        });
        self.inner.kick.notify_one();
    }

    /// Deliver everything queued so far as one batch. Returns the number of
    /// coalesced updates delivered.
    pub fn flush(&self) -> usize {
        self.inner.flush()
    }

    pub fn queued(&self) -> usize {
        lock(&self.inner.queue).len()
    }

    /// Stop the debounce timer and deliver whatever is left.
    pub fn close(&self) -> usize {
        if let Some(handle) = lock(&self.debouncer).take() {
            handle.abort();
        }
        self.flush()
    }
}

impl Drop for ProgressSink {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.debouncer).take() {
            handle.abort();
        }
    }
}

/// Merge updates per task, keeping the order in which tasks first appear.
fn coalesce(updates: Vec<TaskUpdate>) -> Vec<TaskUpdate> {
    let mut order: Vec<TaskUpdate> = Vec::with_capacity(updates.len());
    let mut seen: HashMap<String, usize> = HashMap::new();
    for update in updates {
        match seen.get(&update.task_id) {
            Some(&i) => order[i].patch.merge(update.patch),
            None => {
                seen.insert(update.task_id.clone(), order.len());
                order.push(update);
            }
        }
    }
    order
}
