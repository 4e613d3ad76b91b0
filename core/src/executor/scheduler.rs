use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::stream::FuturesUnordered;
use futures::StreamExt;

/// Shared claim cursor over a fixed work list.
///
/// `claim` advances the cursor and reads the slot it moved past in a single
/// atomic step, so no index is handed to two workers and none is skipped.
pub struct WorkCursor<'a, T> {
    items: &'a [T],
    next: AtomicUsize,
}

impl<'a, T> WorkCursor<'a, T> {
    pub fn new(items: &'a [T]) -> Self {
        Self {
            items,
            next: AtomicUsize::new(0),
        }
    }

    pub fn claim(&self) -> Option<(usize, &'a T)> {
        let idx = self.next.fetch_add(1, Ordering::SeqCst);
        self.items.get(idx).map(|item| (idx, item))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Run `workers` copies of `worker_fn` concurrently and collect what each
/// returns once it runs out of work.
///
/// # Arguments
///
/// * `workers` - Number of concurrent workers (at least one is started)
/// * `worker_fn` - Worker body, given its 0-based worker id
pub async fn run_workers<F, Fut, R>(workers: usize, worker_fn: F) -> Vec<R>
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = R>,
{
    let mut futs: FuturesUnordered<_> = (0..workers.max(1)).map(&worker_fn).collect();

    let mut results = Vec::with_capacity(workers);
    while let Some(res) = futs.next().await {
        results.push(res);
    }
    results
}
