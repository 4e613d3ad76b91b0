use std::time::Duration;

use super::traits::RetryStrategy;
use super::types::{RetryConfig, RetryStrategyKind};

pub struct FixedIntervalRetry {
    config: RetryConfig,
}

pub struct LinearRetry {
    config: RetryConfig,
}

pub struct ExponentialBackoff {
    config: RetryConfig,
}

impl FixedIntervalRetry {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }
}

impl LinearRetry {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }
}

impl ExponentialBackoff {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }
}

/// Build the strategy selected by `config.strategy`.
pub fn strategy_for(config: &RetryConfig) -> Box<dyn RetryStrategy> {
    match config.strategy {
        RetryStrategyKind::Fixed => Box::new(FixedIntervalRetry::new(config.clone())),
        RetryStrategyKind::Linear => Box::new(LinearRetry::new(config.clone())),
        RetryStrategyKind::ExponentialBackoff => Box::new(ExponentialBackoff::new(config.clone())),
    }
}

impl RetryStrategy for FixedIntervalRetry {
    fn name(&self) -> &str {
        "fixed"
    }

    fn next_delay(&self, _attempt: u32) -> Duration {
        Duration::from_millis(self.config.interval_ms)
    }

    fn max_attempts(&self) -> u32 {
        self.config.effective_max_attempts()
    }
}

impl RetryStrategy for LinearRetry {
    fn name(&self) -> &str {
        "linear"
    }

    fn next_delay(&self, attempt: u32) -> Duration {
        let delay = self
            .config
            .interval_ms
            .saturating_mul(attempt.max(1) as u64)
            .min(self.config.max_delay_ms);
        Duration::from_millis(delay)
    }

    fn max_attempts(&self) -> u32 {
        self.config.effective_max_attempts()
    }
}

impl RetryStrategy for ExponentialBackoff {
    fn name(&self) -> &str {
        "exponential-backoff"
    }

    fn next_delay(&self, attempt: u32) -> Duration {
        let exp = 1u64 << attempt.saturating_sub(1).min(30);
        let delay = self
            .config
            .interval_ms
            .saturating_mul(exp)
            .min(self.config.max_delay_ms);
        Duration::from_millis(delay)
    }

    fn max_attempts(&self) -> u32 {
        self.config.effective_max_attempts()
    }
}
