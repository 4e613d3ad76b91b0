#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};

use async_trait::async_trait;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use tagflow_core::api::{
    AnnotationRequest, BatchEngine, Endpoint, EndpointKind, OutputRenderer, Payload, RemoteClient,
    RemoteError, RenderEvent, RetryConfig, RunConfig, Task, TaskStatus, FALLBACK_MIME_TYPE,
};

pub const LABEL: &str = "a tabby cat curled up on a grey sofa, soft window light";

/// How the fake answers a given task.
#[derive(Debug, Clone)]
pub enum Script {
    Reply(String),
    /// Fail with a 500 `failures` times, then reply.
    FailThen { failures: u32, reply: String },
    Fail(RemoteError),
    /// Block until cancelled.
    Hang,
    /// Reply once at least `count` requests (this one included) are in flight.
    AfterInFlight { count: usize, reply: String },
    Panic,
}

/// Scripted remote client. Tasks are told apart by their encoded payload.
pub struct FakeClient {
    kind: EndpointKind,
    default: Script,
    scripts: HashMap<String, Script>,
    calls: Mutex<HashMap<String, u32>>,
    endpoints_seen: Mutex<Vec<String>>,
    payloads: Mutex<Vec<Payload>>,
    total: AtomicUsize,
    in_flight: watch::Sender<usize>,
}

struct InFlight<'a>(&'a watch::Sender<usize>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|n| *n -= 1);
    }
}

impl FakeClient {
    pub fn new(default: Script) -> Self {
        Self {
            kind: EndpointKind::Openai,
            default,
            scripts: HashMap::new(),
            calls: Mutex::new(HashMap::new()),
            endpoints_seen: Mutex::new(Vec::new()),
            payloads: Mutex::new(Vec::new()),
            total: AtomicUsize::new(0),
            in_flight: watch::channel(0).0,
        }
    }

    pub fn with_kind(mut self, kind: EndpointKind) -> Self {
        self.kind = kind;
        self
    }

    /// Script the answer for the task whose content is `content`.
    pub fn script(mut self, content: &[u8], script: Script) -> Self {
        self.scripts.insert(key(content), script);
        self
    }

    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, content: &[u8]) -> u32 {
        self.calls
            .lock()
            .unwrap()
            .get(&key(content))
            .copied()
            .unwrap_or(0)
    }

    pub fn endpoints_seen(&self) -> Vec<String> {
        self.endpoints_seen.lock().unwrap().clone()
    }

    pub fn payloads(&self) -> Vec<Payload> {
        self.payloads.lock().unwrap().clone()
    }

    pub async fn wait_in_flight(&self, count: usize) {
        let mut rx = self.in_flight.subscribe();
        let _ = rx.wait_for(|n| *n >= count).await;
    }
}

fn key(content: &[u8]) -> String {
    Payload::encode(content, FALLBACK_MIME_TYPE).base64
}

#[async_trait]
impl RemoteClient for FakeClient {
    fn kind(&self) -> EndpointKind {
        self.kind
    }

    async fn send(
        &self,
        request: AnnotationRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<String, RemoteError> {
        let id = request.payload.base64.clone();
        let call_no = {
            let mut calls = self.calls.lock().unwrap();
            let n = calls.entry(id.clone()).or_insert(0);
            *n += 1;
            *n
        };
        self.total.fetch_add(1, Ordering::SeqCst);
        self.endpoints_seen
            .lock()
            .unwrap()
            .push(request.endpoint.id.clone());
        self.payloads.lock().unwrap().push(request.payload.clone());

        self.in_flight.send_modify(|n| *n += 1);
        let _guard = InFlight(&self.in_flight);

        let script = self.scripts.get(&id).unwrap_or(&self.default).clone();
        match script {
            Script::Reply(text) => Ok(text),
            Script::FailThen { failures, reply } => {
                if call_no <= failures {
                    Err(RemoteError::from_status(500, "upstream hiccup"))
                } else {
                    Ok(reply)
                }
            }
            Script::Fail(err) => Err(err),
            Script::Hang => {
                cancel.cancelled().await;
                Err(RemoteError::Cancelled)
            }
            Script::AfterInFlight { count, reply } => {
                let mut rx = self.in_flight.subscribe();
                tokio::select! {
                    _ = cancel.cancelled() => Err(RemoteError::Cancelled),
                    _ = rx.wait_for(|n| *n >= count) => Ok(reply),
                }
            }
            Script::Panic => panic!("client exploded"),
        }
    }
}

/// Records every task transition in delivery order.
#[derive(Default)]
pub struct Recorder {
    pub transitions: Mutex<Vec<(String, TaskStatus)>>,
    pub run_ends: Mutex<usize>,
}

impl Recorder {
    pub fn statuses_for(&self, task_id: &str) -> Vec<TaskStatus> {
        self.transitions
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == task_id)
            .map(|(_, s)| *s)
            .collect()
    }
}

impl OutputRenderer for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn render(&self, event: &RenderEvent) {
        match event {
            RenderEvent::TaskUpdates { updates, .. } => {
                let mut t = self.transitions.lock().unwrap();
                for u in updates {
                    if let Some(status) = u.patch.status {
                        t.push((u.task_id.clone(), status));
                    }
                }
            }
            RenderEvent::RunEnd { .. } => *self.run_ends.lock().unwrap() += 1,
            RenderEvent::RunStart { .. } => {}
        }
    }
}

/// Calls `cancel_all` on the engine the moment `task_id` is delivered as
/// completed.
pub struct StopAfterCompleted {
    task_id: String,
    engine: OnceLock<Weak<BatchEngine>>,
}

impl StopAfterCompleted {
    pub fn new(task_id: &str) -> Arc<Self> {
        Arc::new(Self {
            task_id: task_id.to_string(),
            engine: OnceLock::new(),
        })
    }

    pub fn attach(&self, engine: &Arc<BatchEngine>) {
        let _ = self.engine.set(Arc::downgrade(engine));
    }
}

impl OutputRenderer for StopAfterCompleted {
    fn name(&self) -> &str {
        "stop-after-completed"
    }

    fn render(&self, event: &RenderEvent) {
        let RenderEvent::TaskUpdates { updates, .. } = event else {
            return;
        };
        let hit = updates
            .iter()
            .any(|u| u.task_id == self.task_id && u.patch.status == Some(TaskStatus::Completed));
        if hit {
            if let Some(engine) = self.engine.get().and_then(Weak::upgrade) {
                engine.cancel_all();
            }
        }
    }
}

pub fn endpoint(id: &str) -> Endpoint {
    Endpoint::new(id, EndpointKind::Openai, "test-key", "test-model")
}

pub fn run_config(concurrency: usize, max_attempts: u32, endpoints: Vec<Endpoint>) -> RunConfig {
    let mut cfg = RunConfig {
        concurrency,
        retry: RetryConfig {
            max_attempts,
            interval_ms: 0,
            ..Default::default()
        },
        endpoints,
        ..Default::default()
    };
    cfg.compression.enabled = false;
    cfg
}

/// `count` pending tasks with ids `t1..` and content `task-1..`.
pub fn tasks(count: usize) -> Vec<Task> {
    (1..=count)
        .map(|i| Task::new(format!("t{i}"), format!("img{i}.png"), content(i)))
        .collect()
}

pub fn content(i: usize) -> Vec<u8> {
    format!("task-{i}").into_bytes()
}
