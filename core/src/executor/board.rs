use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::types::{BoardStats, Task, TaskPatch, TaskStatus, TaskUpdate, WorkItem};

/// Observer-side task list.
///
/// The engine never writes tasks directly; it routes every transition through
/// the progress sink, which applies each coalesced batch here in one step.
/// Manual edits (`reset`, `set_tags`, `remove`) are the caller's business and
/// should not be issued for tasks that are currently processing.
#[derive(Debug, Default)]
pub struct TaskBoard {
    state: RwLock<BoardState>,
}

#[derive(Debug, Default)]
struct BoardState {
    tasks: Vec<Task>,
    index: HashMap<String, usize>,
}

impl BoardState {
    fn reindex(&mut self) {
        self.index = self
            .tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();
    }

    fn get_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        let idx = *self.index.get(task_id)?;
        self.tasks.get_mut(idx)
    }
}

impl TaskBoard {
    pub fn new(tasks: Vec<Task>) -> Self {
        let board = Self::default();
        board.extend(tasks);
        board
    }

    fn read(&self) -> RwLockReadGuard<'_, BoardState> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, BoardState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Append tasks; an id already on the board is replaced in place.
    pub fn extend(&self, tasks: Vec<Task>) {
        let mut state = self.write();
        for task in tasks {
            match state.index.get(&task.id).copied() {
                Some(idx) => state.tasks[idx] = task,
                None => {
                    let idx = state.tasks.len();
                    state.index.insert(task.id.clone(), idx);
                    state.tasks.push(task);
                }
            }
        }
    }

    /// Apply a batch of updates atomically. Unknown ids are ignored.
    pub fn apply(&self, updates: &[TaskUpdate]) {
        let mut state = self.write();
        for update in updates {
            if let Some(task) = state.get_mut(&update.task_id) {
                task.apply(&update.patch);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.read().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, task_id: &str) -> Option<Task> {
        let state = self.read();
        state.index.get(task_id).map(|&i| state.tasks[i].clone())
    }

    pub fn snapshot(&self) -> Vec<Task> {
        self.read().tasks.clone()
    }

    /// Everything a new run would pick up, in board order.
    pub fn pending_work(&self) -> Vec<WorkItem> {
        self.read()
            .tasks
            .iter()
            .filter(|t| t.status != TaskStatus::Completed)
            .map(Task::to_work_item)
            .collect()
    }

    pub fn stats(&self) -> BoardStats {
        let state = self.read();
        let mut stats = BoardStats {
            total: state.tasks.len(),
            ..Default::default()
        };
        for t in &state.tasks {
            match t.status {
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::Processing => stats.processing += 1,
                TaskStatus::Error => stats.error += 1,
                TaskStatus::Pending => stats.pending += 1,
                TaskStatus::Skipped => {}
            }
        }
        stats
    }

    /// Put one task back to `pending` so the next run relabels it.
    pub fn reset(&self, task_id: &str) -> bool {
        let mut state = self.write();
        match state.get_mut(task_id) {
            Some(task) => {
                task.apply(&TaskPatch::pending());
                true
            }
            None => false,
        }
    }

    /// Reset every task; existing tags are kept for reference.
    pub fn reset_all(&self) {
        let patch = TaskPatch::pending();
        for task in self.write().tasks.iter_mut() {
            task.apply(&patch);
        }
    }

    /// Manual label edit.
    pub fn set_tags(&self, task_id: &str, tags: impl Into<String>) -> bool {
        let mut state = self.write();
        match state.get_mut(task_id) {
            Some(task) => {
                task.tags = Some(tags.into());
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, task_id: &str) -> Option<Task> {
        let mut state = self.write();
        let idx = state.index.get(task_id).copied()?;
        let task = state.tasks.remove(idx);
        state.reindex();
        Some(task)
    }
}
