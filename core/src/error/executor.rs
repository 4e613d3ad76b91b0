use thiserror::Error;

/// Reasons a batch run is refused before any worker starts.
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("a run is already in progress")]
    AlreadyRunning,

    #[error("no eligible endpoint configured")]
    NoEligibleEndpoint,

    #[error("all tasks are already completed")]
    NothingToDo,

    #[error("config error: {0}")]
    Config(String),
}
