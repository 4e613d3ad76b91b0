pub mod cli;
pub mod executor;
pub mod remote;

pub use cli::{CliError, ConfigError};
pub use executor::ExecutorError;
pub use remote::{truncate_body, AttemptError, RemoteError, TaskFailure, ERROR_BODY_LIMIT};
