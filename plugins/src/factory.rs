use std::sync::Arc;

use anyhow::Result;

use tagflow_core::api::{
    BatchEngine, LiveConfig, OutputRenderer, Preprocessor, RemoteClient, TaskBoard,
};

use crate::executor::{
    default_clients, ImagePreprocessorPlugin, JsonlRendererPlugin, ProgressBarRendererPlugin,
    TextRendererPlugin,
};

pub fn build_clients() -> Result<Vec<Arc<dyn RemoteClient>>> {
    default_clients()
}

pub fn build_preprocessor() -> Arc<dyn Preprocessor> {
    Arc::new(ImagePreprocessorPlugin::new())
}

pub fn build_renderer(format: &str, board: Arc<TaskBoard>) -> Arc<dyn OutputRenderer> {
    match format {
        "jsonl" => Arc::new(JsonlRendererPlugin::new(false)),
        "bar" => Arc::new(ProgressBarRendererPlugin::new()),
        // Anything else renders as text.
        _ => Arc::new(TextRendererPlugin::new(false).with_board(board)),
    }
}

/// Engine wired with every client kind, image preprocessing and one renderer.
pub fn build_engine(config: LiveConfig, format: &str, board: Arc<TaskBoard>) -> Result<BatchEngine> {
    Ok(BatchEngine::builder(config)
        .clients(build_clients()?)
        .preprocessor(build_preprocessor())
        .renderer(build_renderer(format, board))
        .build())
}
