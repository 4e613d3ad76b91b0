use crate::executor::types::{RunSummary, TaskUpdate};

/// 输出渲染器插件（观察者）
pub trait OutputRenderer: Send + Sync {
    fn name(&self) -> &str;
    fn render(&self, event: &RenderEvent);
}

/// 渲染事件（统一事件类型）
#[derive(Debug, Clone)]
pub enum RenderEvent {
    RunStart {
        run_id: String,
        total_tasks: usize,
        concurrency: usize,
    },
    /// One coalesced batch of task transitions.
    TaskUpdates {
        run_id: String,
        updates: Vec<TaskUpdate>,
    },
    RunEnd {
        run_id: String,
        summary: RunSummary,
    },
}
