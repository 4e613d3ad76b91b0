pub mod bar;
pub mod jsonl;
pub mod text;

pub use bar::ProgressBarRendererPlugin;
pub use jsonl::JsonlRendererPlugin;
pub use text::TextRendererPlugin;
