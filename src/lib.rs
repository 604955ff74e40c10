pub mod classifier;
pub mod fetch;
pub mod model;
pub mod output;
