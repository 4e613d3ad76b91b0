use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use uuid::Uuid;

use crate::config::LiveConfig;
use crate::error::{ExecutorError, TaskFailure};

use super::board::TaskBoard;
use super::cancel::CancellationRegistry;
use super::progress::{ProgressSink, DEFAULT_DEBOUNCE};
use super::retry::RetryController;
use super::rotator::EndpointRotator;
use super::scheduler::{run_workers, WorkCursor};
use super::traits::{OutputRenderer, Preprocessor, RemoteClient, RenderEvent};
use super::types::{EndpointKind, RunSummary, TaskPatch, WorkItem};

/// Bounded-concurrency batch runner.
///
/// One engine serves one run at a time. `cancel` and `cancel_all` may be
/// called from any task while `run` is in progress.
pub struct BatchEngine {
    config: LiveConfig,
    clients: HashMap<EndpointKind, Arc<dyn RemoteClient>>,
    preprocessor: Option<Arc<dyn Preprocessor>>,
    renderers: Vec<Arc<dyn OutputRenderer>>,
    registry: CancellationRegistry,
    rotator: EndpointRotator,
    running: AtomicBool,
    debounce: Duration,
}

pub struct BatchEngineBuilder {
    config: LiveConfig,
    clients: HashMap<EndpointKind, Arc<dyn RemoteClient>>,
    preprocessor: Option<Arc<dyn Preprocessor>>,
    renderers: Vec<Arc<dyn OutputRenderer>>,
    debounce: Duration,
}

impl BatchEngineBuilder {
    pub fn new(config: LiveConfig) -> Self {
        Self {
            config,
            clients: HashMap::new(),
            preprocessor: None,
            renderers: Vec::new(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    /// Register the client for its endpoint kind, replacing any previous one.
    pub fn client(mut self, client: Arc<dyn RemoteClient>) -> Self {
        self.clients.insert(client.kind(), client);
        self
    }

    pub fn clients(mut self, clients: impl IntoIterator<Item = Arc<dyn RemoteClient>>) -> Self {
        for client in clients {
            self = self.client(client);
        }
        self
    }

    pub fn preprocessor(mut self, preprocessor: Arc<dyn Preprocessor>) -> Self {
        self.preprocessor = Some(preprocessor);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn OutputRenderer>) -> Self {
        self.renderers.push(renderer);
        self
    }

    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn build(self) -> BatchEngine {
        BatchEngine {
            config: self.config,
            clients: self.clients,
            preprocessor: self.preprocessor,
            renderers: self.renderers,
            registry: CancellationRegistry::new(),
            rotator: EndpointRotator::new(),
            running: AtomicBool::new(false),
            debounce: self.debounce,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Completed,
    Failed,
    Stopped,
}

#[derive(Debug, Default)]
struct WorkerTally {
    completed: usize,
    failed: usize,
    stopped: usize,
    skipped: usize,
}

impl WorkerTally {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Completed => self.completed += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::Stopped => self.stopped += 1,
        }
    }
}

/// Clears the running flag however `run` exits.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl BatchEngine {
    pub fn builder(config: LiveConfig) -> BatchEngineBuilder {
        BatchEngineBuilder::new(config)
    }

    pub fn live_config(&self) -> &LiveConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Fails when endpoint ids collide or no endpoint is currently eligible.
    /// `run` does not call this; front ends use it to refuse a run up front.
    pub fn preflight(&self) -> Result<usize, ExecutorError> {
        let endpoints = self.config.endpoints();
        let mut seen = HashSet::new();
        if let Some(dup) = endpoints.iter().find(|e| !seen.insert(e.id.as_str())) {
            return Err(ExecutorError::Config(format!("duplicate endpoint id: {}", dup.id)));
        }
        match endpoints.iter().filter(|e| e.is_eligible()).count() {
            0 => Err(ExecutorError::NoEligibleEndpoint),
            n => Ok(n),
        }
    }

    /// Stop one task: abort its request if in flight, otherwise skip it when
    /// a worker reaches it. Idempotent.
    pub fn cancel(&self, task_id: &str) {
        self.registry.cancel(task_id);
    }

    /// Stop the whole run. Workers stop claiming, in-flight requests abort
    /// and their tasks go back to `pending`.
    pub fn cancel_all(&self) {
        tracing::info!("stop requested for all tasks");
        self.registry.cancel_all();
    }

    /// Process every non-completed task on `board`.
    pub async fn run(&self, board: Arc<TaskBoard>) -> Result<RunSummary, ExecutorError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ExecutorError::AlreadyRunning);
        }
        let _guard = RunGuard(&self.running);

        let items = board.pending_work();
        if items.is_empty() {
            return Err(ExecutorError::NothingToDo);
        }

        self.registry.reset();
        self.rotator.reset();

        let run_id = Uuid::new_v4().to_string();
        let concurrency = self.config.with(|c| c.concurrency).min(items.len()).max(1);
        let start = Instant::now();

        tracing::info!(run_id = %run_id, tasks = items.len(), concurrency, "run started");
        self.emit(&RenderEvent::RunStart {
            run_id: run_id.clone(),
            total_tasks: items.len(),
            concurrency,
        });

        let sink = ProgressSink::start(
            run_id.clone(),
            board.clone(),
            self.renderers.clone(),
            self.debounce,
        );
        let cursor = WorkCursor::new(&items);

        let tallies = run_workers(concurrency, |worker_id| self.worker(worker_id, &cursor, &sink)).await;
        sink.close();

        let completed = tallies.iter().map(|t| t.completed).sum::<usize>();
        let failed = tallies.iter().map(|t| t.failed).sum::<usize>();
        let stopped = tallies.iter().map(|t| t.stopped + t.skipped).sum::<usize>();
        let cancelled = self.registry.is_cancelled_all();

        let summary = RunSummary {
            run_id: run_id.clone(),
            total: items.len(),
            completed,
            failed,
            pending: items.len().saturating_sub(completed + failed),
            duration_ms: start.elapsed().as_millis() as u64,
            cancelled,
        };

        tracing::info!(
            run_id = %run_id,
            completed,
            failed,
            stopped,
            cancelled,
            duration_ms = summary.duration_ms,
            "run finished"
        );
        self.emit(&RenderEvent::RunEnd {
            run_id,
            summary: summary.clone(),
        });

        Ok(summary)
    }

    async fn worker(
        &self,
        worker_id: usize,
        cursor: &WorkCursor<'_, WorkItem>,
        sink: &ProgressSink,
    ) -> WorkerTally {
        let mut tally = WorkerTally::default();

        loop {
            if self.registry.is_cancelled_all() {
                break;
            }
            let Some((_, item)) = cursor.claim() else {
                break;
            };
            if self.registry.take_stopped(&item.id) {
                tracing::debug!(worker_id, task = %item.name, "skipping stopped task");
                tally.skipped += 1;
                continue;
            }

            match AssertUnwindSafe(self.process(item, sink)).catch_unwind().await {
                Ok(outcome) => tally.record(outcome),
                Err(panic) => {
                    let msg = panic_message(panic.as_ref());
                    tracing::error!(worker_id, task = %item.name, panic = %msg, "task panicked");
                    self.registry.unregister(&item.id);
                    sink.enqueue(&item.id, TaskPatch::failed(TaskFailure::Internal(msg).to_string()));
                    sink.flush();
                    tally.failed += 1;
                }
            }
        }

        tracing::debug!(worker_id, ?tally, "worker done");
        tally
    }

    async fn process(&self, item: &WorkItem, sink: &ProgressSink) -> Outcome {
        let Some(endpoint) = self.rotator.next(&self.config.endpoints()) else {
            tracing::warn!(task = %item.name, "no eligible endpoint");
            sink.enqueue(&item.id, TaskPatch::failed(TaskFailure::NoEndpoint.to_string()));
            sink.flush();
            return Outcome::Failed;
        };
        let Some(client) = self.clients.get(&endpoint.kind).cloned() else {
            let failure = TaskFailure::Internal(format!("no client for {} endpoints", endpoint.kind));
            tracing::error!(task = %item.name, endpoint = %endpoint.label(), "{failure}");
            sink.enqueue(&item.id, TaskPatch::failed(failure.to_string()));
            sink.flush();
            return Outcome::Failed;
        };

        let cancel = self.registry.register(&item.id);
        sink.enqueue(&item.id, TaskPatch::processing());
        sink.flush();

        tracing::debug!(task = %item.name, endpoint = %endpoint.label(), "dispatching");
        let config = self.config.snapshot();
        let controller = RetryController::new(client, self.preprocessor.clone());
        let result = controller
            .run(
                item,
                &endpoint,
                &config,
                |attempt| sink.enqueue(&item.id, TaskPatch::attempts(attempt)),
                &cancel,
            )
            .await;
        self.registry.unregister(&item.id);

        let outcome = match result {
            Ok(tags) => {
                tracing::info!(task = %item.name, "labeled");
                sink.enqueue(&item.id, TaskPatch::completed(tags));
                Outcome::Completed
            }
            Err(failure) if failure.is_stopped() => {
                tracing::info!(task = %item.name, "stopped");
                sink.enqueue(&item.id, TaskPatch::pending());
                Outcome::Stopped
            }
            Err(failure) => {
                tracing::warn!(task = %item.name, error = %failure, "task failed");
                sink.enqueue(&item.id, TaskPatch::failed(failure.to_string()));
                Outcome::Failed
            }
        };
        sink.flush();
        outcome
    }

    fn emit(&self, event: &RenderEvent) {
        for renderer in &self.renderers {
            renderer.render(event);
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
