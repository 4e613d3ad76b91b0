pub mod image;

pub use image::ImagePreprocessorPlugin;
