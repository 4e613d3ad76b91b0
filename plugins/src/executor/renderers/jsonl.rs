use chrono::Local;
use serde_json::{json, Value};
use tagflow_core::api::{OutputRenderer, RenderEvent};

pub struct JsonlRendererPlugin {
    pretty_print: bool,
}

impl JsonlRendererPlugin {
    pub fn new(pretty_print: bool) -> Self {
        Self { pretty_print }
    }

    fn event_to_json(&self, event: &RenderEvent) -> Vec<Value> {
        let ts = Local::now().to_rfc3339();
        match event {
            RenderEvent::RunStart {
                run_id,
                total_tasks,
                concurrency,
            } => vec![json!({
                "v": 1,
                "event_type": "run.start",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "total_tasks": total_tasks,
                    "concurrency": concurrency,
                }
            })],
            RenderEvent::TaskUpdates { run_id, updates } => updates
                .iter()
                .map(|u| {
                    json!({
                        "v": 1,
                        "event_type": "task.update",
                        "ts": ts,
                        "run_id": run_id,
                        "task_id": u.task_id,
                        "patch": u.patch,
                    })
                })
                .collect(),
            RenderEvent::RunEnd { run_id, summary } => vec![json!({
                "v": 1,
                "event_type": "run.end",
                "ts": ts,
                "run_id": run_id,
                "metadata": summary,
            })],
        }
    }
}

impl OutputRenderer for JsonlRendererPlugin {
    fn name(&self) -> &str {
        "jsonl-renderer"
    }

    fn render(&self, event: &RenderEvent) {
        for value in self.event_to_json(event) {
            if self.pretty_print {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".into())
                );
            } else {
                println!(
                    "{}",
                    serde_json::to_string(&value).unwrap_or_else(|_| "{}".into())
                );
            }
        }
    }
}
