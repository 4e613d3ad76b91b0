mod live;
mod load;
mod types;

pub use live::LiveConfig;
pub use load::*;
pub use types::*;
