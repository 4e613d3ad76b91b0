use std::time::Duration;

use crate::error::AttemptError;

/// 重试策略
pub trait RetryStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Delay to wait after failed attempt number `attempt` (1-based).
    fn next_delay(&self, attempt: u32) -> Duration;

    fn max_attempts(&self) -> u32;

    fn should_retry(&self, attempt: u32, error: &AttemptError) -> bool {
        attempt < self.max_attempts() && !self.is_fatal_error(error)
    }

    /// Failures that end the loop regardless of remaining budget.
    fn is_fatal_error(&self, error: &AttemptError) -> bool {
        error.is_fatal() || error.is_cancelled()
    }
}
