use std::sync::atomic::{AtomicUsize, Ordering};

use super::types::Endpoint;

/// Round-robin endpoint selection over the live endpoint list.
///
/// The list is re-filtered on every call, so toggling eligibility mid-run is
/// picked up by the next dispatch.
#[derive(Debug, Default)]
pub struct EndpointRotator {
    counter: AtomicUsize,
}

impl EndpointRotator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next eligible endpoint, or `None` when nothing is eligible. The
    /// dispatch counter only advances when an endpoint is handed out.
    pub fn next(&self, endpoints: &[Endpoint]) -> Option<Endpoint> {
        let eligible: Vec<&Endpoint> = endpoints.iter().filter(|e| e.is_eligible()).collect();
        if eligible.is_empty() {
            return None;
        }
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        Some(eligible[n % eligible.len()].clone())
    }

    pub fn dispatched(&self) -> usize {
        self.counter.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.counter.store(0, Ordering::Relaxed);
    }
}
