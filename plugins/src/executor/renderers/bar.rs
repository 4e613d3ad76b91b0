use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tagflow_core::api::{OutputRenderer, RenderEvent, TaskStatus};

/// Visual progress for a batch run.
///
/// One bar over the queued tasks; the message shows in-flight, failed and
/// stopped counts.
pub struct ProgressBarRendererPlugin {
    bar: ProgressBar,
    state: Mutex<BarState>,
}

#[derive(Default)]
struct BarState {
    in_flight: HashSet<String>,
    failed: u64,
    stopped: u64,
}

impl BarState {
    fn message(&self) -> String {
        format!(
            "running {} | failed {} | stopped {}",
            self.in_flight.len(),
            self.failed,
            self.stopped
        )
    }
}

impl ProgressBarRendererPlugin {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), target);
        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} images ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░  ");
        bar.set_style(style);
        Self {
            bar,
            state: Mutex::new(BarState::default()),
        }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BarState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for ProgressBarRendererPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputRenderer for ProgressBarRendererPlugin {
    fn name(&self) -> &str {
        "progress-bar"
    }

    fn render(&self, event: &RenderEvent) {
        match event {
            RenderEvent::RunStart { total_tasks, .. } => {
                *self.lock() = BarState::default();
                self.bar.reset();
                self.bar.set_length(*total_tasks as u64);
                self.bar.set_message("starting...");
                self.bar.enable_steady_tick(Duration::from_millis(200));
            }
            RenderEvent::TaskUpdates { updates, .. } => {
                let mut state = self.lock();
                for u in updates {
                    let Some(status) = u.patch.status else {
                        continue;
                    };
                    match status {
                        TaskStatus::Processing => {
                            state.in_flight.insert(u.task_id.clone());
                        }
                        TaskStatus::Completed => {
                            state.in_flight.remove(&u.task_id);
                            self.bar.inc(1);
                        }
                        TaskStatus::Error => {
                            state.in_flight.remove(&u.task_id);
                            state.failed += 1;
                            self.bar.inc(1);
                        }
                        TaskStatus::Pending | TaskStatus::Skipped => {
                            state.in_flight.remove(&u.task_id);
                            state.stopped += 1;
                        }
                    }
                }
                self.bar.set_message(state.message());
            }
            RenderEvent::RunEnd { summary, .. } => {
                let msg = if summary.cancelled {
                    format!("stopped ({} left pending)", summary.pending)
                } else if summary.failed == 0 {
                    "all images labeled".to_string()
                } else {
                    format!("{} failed", summary.failed)
                };
                self.bar.finish_with_message(msg);
            }
        }
    }
}
