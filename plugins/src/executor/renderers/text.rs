use std::sync::Arc;

use tagflow_core::api::{OutputRenderer, RenderEvent, TaskBoard, TaskStatus, TaskUpdate};

pub struct TextRendererPlugin {
    ascii_only: bool,
    board: Option<Arc<TaskBoard>>,
}

impl TextRendererPlugin {
    pub fn new(ascii_only: bool) -> Self {
        Self {
            ascii_only,
            board: None,
        }
    }

    /// Resolve task names through `board` instead of printing raw ids.
    pub fn with_board(mut self, board: Arc<TaskBoard>) -> Self {
        self.board = Some(board);
        self
    }

    fn task_label(&self, task_id: &str) -> String {
        self.board
            .as_ref()
            .and_then(|b| b.get(task_id))
            .map(|t| t.name)
            .unwrap_or_else(|| task_id.to_string())
    }

    fn format_update(&self, run_id: &str, update: &TaskUpdate) -> Option<String> {
        let patch = &update.patch;
        let task = self.task_label(&update.task_id);
        let line = match patch.status? {
            TaskStatus::Processing => format!("TASK START {} (task {})", run_id, task),
            TaskStatus::Completed => {
                let status = if self.ascii_only { "OK" } else { "SUCCESS" };
                let tags = patch.tags.clone().flatten().unwrap_or_default();
                format!("TASK END {} (task {}, status {}): {}", run_id, task, status, tags)
            }
            TaskStatus::Error => {
                let status = if self.ascii_only { "FAIL" } else { "FAILED" };
                let error = patch.error.clone().flatten().unwrap_or_default();
                format!("TASK END {} (task {}, status {}): {}", run_id, task, status, error)
            }
            TaskStatus::Pending => format!("TASK STOPPED {} (task {})", run_id, task),
            TaskStatus::Skipped => format!("TASK SKIPPED {} (task {})", run_id, task),
        };
        Some(line)
    }

    fn format_event(&self, event: &RenderEvent) -> Vec<String> {
        match event {
            RenderEvent::RunStart {
                run_id,
                total_tasks,
                concurrency,
            } => vec![format!(
                "RUN START {} (tasks: {}, concurrency: {})",
                run_id, total_tasks, concurrency
            )],
            RenderEvent::TaskUpdates { run_id, updates } => updates
                .iter()
                .filter_map(|u| self.format_update(run_id, u))
                .collect(),
            RenderEvent::RunEnd { run_id, summary } => {
                let mut line = format!(
                    "RUN END {} (completed {}, failed {}, pending {}, duration {}ms)",
                    run_id, summary.completed, summary.failed, summary.pending, summary.duration_ms
                );
                if summary.cancelled {
                    line.push_str(" [stopped]");
                }
                vec![line]
            }
        }
    }
}

impl OutputRenderer for TextRendererPlugin {
    fn name(&self) -> &str {
        "text-renderer"
    }

    fn render(&self, event: &RenderEvent) {
        for line in self.format_event(event) {
            println!("{}", line);
        }
    }
}
