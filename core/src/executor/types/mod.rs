pub mod config;
pub mod endpoint;
pub mod error;
pub mod result;
pub mod task;

pub use config::*;
pub use endpoint::*;
pub use error::*;
pub use result::*;
pub use task::*;
