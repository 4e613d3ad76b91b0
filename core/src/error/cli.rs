use thiserror::Error;

use super::executor::ExecutorError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("endpoint not found: {0}")]
    UnknownEndpoint(String),
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("run refused: {0}")]
    Executor(#[from] ExecutorError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl CliError {
    /// Process exit code.
    ///
    /// 0 success, 11 config, 20 run/io, 50 anything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 11,
            CliError::Executor(e) => match e {
                ExecutorError::Config(_) | ExecutorError::NoEligibleEndpoint => 11,
                ExecutorError::AlreadyRunning | ExecutorError::NothingToDo => 20,
            },
            CliError::Io(_) => 20,
            CliError::Command(_) => 20,
            CliError::Anyhow(_) => 50,
        }
    }
}
