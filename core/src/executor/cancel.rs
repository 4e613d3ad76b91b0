use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;

/// Per-task cancellation handles for one run.
///
/// Every handle is a child of a run-wide root token, so `cancel_all` also
/// reaches handles registered after it was called. A handle exists for a task
/// id only while that task has a request in flight.
pub struct CancellationRegistry {
    state: Mutex<RegistryState>,
}

struct RegistryState {
    root: CancellationToken,
    handles: HashMap<String, CancellationToken>,
    /// Ids stopped individually before a worker got to them.
    stopped: HashSet<String>,
}

impl RegistryState {
    fn fresh() -> Self {
        Self {
            root: CancellationToken::new(),
            handles: HashMap::new(),
            stopped: HashSet::new(),
        }
    }
}

impl Default for CancellationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState::fresh()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Start a new run: fresh root token, no handles, no pending stops.
    pub fn reset(&self) {
        *self.lock() = RegistryState::fresh();
    }

    /// Create the handle for a task about to go in flight. A stop recorded
    /// for this id since it was queued is consumed here and yields a handle
    /// that is already triggered.
    pub fn register(&self, task_id: &str) -> CancellationToken {
        let mut state = self.lock();
        let token = state.root.child_token();
        if state.stopped.remove(task_id) {
            token.cancel();
            return token;
        }
        state.handles.insert(task_id.to_string(), token.clone());
        token
    }

    pub fn unregister(&self, task_id: &str) {
        self.lock().handles.remove(task_id);
    }

    /// Stop one task. In flight: abort its request. Queued: skip it when a
    /// worker claims it. Repeated calls have no further effect.
    pub fn cancel(&self, task_id: &str) {
        let mut state = self.lock();
        match state.handles.remove(task_id) {
            Some(token) => {
                tracing::debug!(task_id, "cancelling in-flight task");
                token.cancel();
            }
            None => {
                state.stopped.insert(task_id.to_string());
            }
        }
    }

    /// Stop the whole run: triggers every handle, present and future, and
    /// clears the map.
    pub fn cancel_all(&self) {
        let mut state = self.lock();
        state.root.cancel();
        for (_, token) in state.handles.drain() {
            token.cancel();
        }
    }

    pub fn is_cancelled_all(&self) -> bool {
        self.lock().root.is_cancelled()
    }

    /// Consume an individual stop for a queued task.
    pub fn take_stopped(&self, task_id: &str) -> bool {
        self.lock().stopped.remove(task_id)
    }

    pub fn is_registered(&self, task_id: &str) -> bool {
        self.lock().handles.contains_key(task_id)
    }

    pub fn in_flight(&self) -> usize {
        self.lock().handles.len()
    }
}
