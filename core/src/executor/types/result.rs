use serde::Serialize;

/// Outcome of one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub run_id: String,

    /// Tasks queued for this run (non-completed at start).
    pub total: usize,

    /// Tasks that reached `completed` during this run.
    pub completed: usize,

    /// Tasks that ended in `error`.
    pub failed: usize,

    /// Tasks left (or put back) in `pending`: stopped or never claimed.
    pub pending: usize,

    /// Total execution duration in milliseconds
    pub duration_ms: u64,

    /// Whether a global stop was requested while running.
    pub cancelled: bool,
}

/// Counts across a task board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BoardStats {
    pub total: usize,
    pub completed: usize,
    pub processing: usize,
    pub error: usize,
    pub pending: usize,
}

impl BoardStats {
    /// Completed fraction in `0.0..=1.0`.
    pub fn progress(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f32 / self.total as f32
        }
    }

    /// Work that a new run would pick up.
    pub fn remaining(&self) -> usize {
        self.pending + self.error
    }
}
