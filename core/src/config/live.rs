use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::executor::types::{Endpoint, RunConfig};

/// Shared, live-readable run configuration.
///
/// Workers re-read endpoints before every dispatch and the remaining policy
/// once per task, so edits made here while a run is active are observed on a
/// best-effort, next-dispatch basis.
#[derive(Debug, Clone, Default)]
pub struct LiveConfig {
    inner: Arc<RwLock<RunConfig>>,
}

impl LiveConfig {
    pub fn new(mut cfg: RunConfig) -> Self {
        cfg.normalize();
        Self {
            inner: Arc::new(RwLock::new(cfg)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, RunConfig> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, RunConfig> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn snapshot(&self) -> RunConfig {
        self.read().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&RunConfig) -> R) -> R {
        f(&self.read())
    }

    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut RunConfig),
    {
        let mut cfg = self.write();
        f(&mut cfg);
        cfg.normalize();
    }

    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.read().endpoints.clone()
    }

    pub fn eligible_endpoints(&self) -> Vec<Endpoint> {
        self.read().eligible_endpoints()
    }

    /// Returns false when no endpoint has this id.
    pub fn set_endpoint_disabled(&self, endpoint_id: &str, disabled: bool) -> bool {
        let mut cfg = self.write();
        match cfg.endpoints.iter_mut().find(|e| e.id == endpoint_id) {
            Some(ep) => {
                ep.disabled = disabled;
                true
            }
            None => false,
        }
    }
}
