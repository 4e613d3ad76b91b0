use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a single asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Error,
    /// Never set by the engine. Reserved for callers that exclude a task by
    /// hand; the board counts it in `total` only.
    Skipped,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Skipped => "skipped",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::Skipped)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of work: a binary asset awaiting a text label.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub content: Bytes,
    pub status: TaskStatus,
    pub tags: Option<String>,
    pub error: Option<String>,
    pub attempts: u32,
}

impl Task {
    pub fn new(id: impl Into<String>, name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            content: content.into(),
            status: TaskStatus::Pending,
            tags: None,
            error: None,
            attempts: 0,
        }
    }

    /// A task that arrives already labeled (e.g. a sidecar caption was found).
    pub fn labeled(
        id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<Bytes>,
        tags: impl Into<String>,
    ) -> Self {
        let mut task = Self::new(id, name, content);
        task.status = TaskStatus::Completed;
        task.tags = Some(tags.into());
        task
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags.clone();
        }
        if let Some(error) = &patch.error {
            self.error = error.clone();
        }
        if let Some(attempts) = patch.attempts {
            self.attempts = attempts;
        }
    }

    /// Work item handed to a worker; the content is reference counted so the
    /// claim is cheap regardless of asset size.
    pub fn to_work_item(&self) -> WorkItem {
        WorkItem {
            id: self.id.clone(),
            name: self.name.clone(),
            content: self.content.clone(),
        }
    }
}

/// Immutable view of a queued task as seen by the worker pool.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub id: String,
    pub name: String,
    pub content: Bytes,
}

/// Partial task update. `None` leaves a field untouched; `Some(None)` clears
/// an optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
}

impl TaskPatch {
    pub fn processing() -> Self {
        Self {
            status: Some(TaskStatus::Processing),
            error: Some(None),
            attempts: Some(0),
            ..Default::default()
        }
    }

    pub fn attempts(attempts: u32) -> Self {
        Self {
            attempts: Some(attempts),
            ..Default::default()
        }
    }

    pub fn completed(tags: String) -> Self {
        Self {
            status: Some(TaskStatus::Completed),
            tags: Some(Some(tags)),
            error: Some(None),
            ..Default::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Some(TaskStatus::Error),
            tags: Some(None),
            error: Some(Some(message.into())),
            ..Default::default()
        }
    }

    /// Back to the queue; existing tags are kept.
    pub fn pending() -> Self {
        Self {
            status: Some(TaskStatus::Pending),
            error: Some(None),
            attempts: Some(0),
            ..Default::default()
        }
    }

    /// Fold a later patch into this one; fields set in `later` win.
    pub fn merge(&mut self, later: TaskPatch) {
        if later.status.is_some() {
            self.status = later.status;
        }
        if later.tags.is_some() {
            self.tags = later.tags;
        }
        if later.error.is_some() {
            self.error = later.error;
        }
        if later.attempts.is_some() {
            self.attempts = later.attempts;
        }
    }
}

/// A patch addressed to one task id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskUpdate {
    pub task_id: String,
    pub patch: TaskPatch,
}
