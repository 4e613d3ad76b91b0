pub mod clients;
pub mod processors;
pub mod renderers;

pub use clients::{default_clients, http_client, GeminiClient, OpenAiClient};
pub use processors::ImagePreprocessorPlugin;
pub use renderers::{JsonlRendererPlugin, ProgressBarRendererPlugin, TextRendererPlugin};
