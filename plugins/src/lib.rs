pub mod dataset;
pub mod executor;
pub mod factory;
pub mod probe;
