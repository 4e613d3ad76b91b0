//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `tagflow_core::api` instead of reaching into internal modules.

pub use crate::config::{
    get_tagflow_data_dir, load, load_from_path, save_to_path, AppConfig,
    LiveConfig, LoggingConfig, CONFIG_FILE_NAME,
};
pub use crate::error::{
    truncate_body, AttemptError, CliError, ConfigError, ExecutorError, RemoteError, TaskFailure,
};
pub use crate::executor::race::first_of;
pub use crate::executor::traits::{
    AnnotationRequest, OutputRenderer, Payload, PreparedAsset, Preprocessor, RemoteClient,
    RenderEvent, RetryStrategy, FALLBACK_MIME_TYPE,
};
pub use crate::executor::types::{
    BoardStats, CompressionConfig, Endpoint, EndpointKind, PreprocessError, PromptConfig,
    RetryConfig, RetryStrategyKind, RunConfig, RunSummary, Task, TaskPatch, TaskStatus,
    TaskUpdate, ValidationConfig, WorkItem, DEFAULT_OPENAI_BASE_URL,
};
pub use crate::executor::{BatchEngine, BatchEngineBuilder, CancellationRegistry, TaskBoard};
