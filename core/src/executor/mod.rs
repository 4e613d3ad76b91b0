//! Batch execution engine for remote image annotation.
//!
//! A fixed pool of workers shares one claim cursor over the queued tasks.
//! Each claimed task is dispatched to the next eligible endpoint and driven
//! through the retry controller; every state transition goes through the
//! progress sink, which coalesces them for the observer.
//!
//! # Architecture
//!
//! ```text
//! TaskBoard::pending_work() → Vec<WorkItem>
//!   ↓
//! WorkCursor (fetch_add claim) ← N workers (run_workers)
//!   ↓
//! EndpointRotator::next() → Endpoint
//!   ↓
//! CancellationRegistry::register() → CancellationToken
//!   ↓
//! RetryController::run() → Preprocessor → RemoteClient::send() × attempts
//!   ↓
//! ProgressSink::enqueue()/flush() → TaskBoard::apply() + OutputRenderer
//! ```

mod backoff;
mod board;
mod cancel;
mod engine;
mod progress;
pub mod race;
mod retry;
mod rotator;
mod scheduler;
pub mod traits;
pub mod types;

pub use backoff::{strategy_for, ExponentialBackoff, FixedIntervalRetry, LinearRetry};
pub use board::TaskBoard;
pub use cancel::CancellationRegistry;
pub use engine::{BatchEngine, BatchEngineBuilder};
pub use progress::{ProgressSink, DEFAULT_DEBOUNCE};
pub use race::first_of;
pub use retry::RetryController;
pub use rotator::EndpointRotator;
pub use scheduler::{run_workers, WorkCursor};
pub use types::{RunConfig, RunSummary, Task, TaskPatch, TaskStatus, TaskUpdate};
