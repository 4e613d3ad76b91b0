pub mod client;
pub mod processor;
pub mod renderer;
pub mod strategy;

pub use client::*;
pub use processor::*;
pub use renderer::*;
pub use strategy::*;
