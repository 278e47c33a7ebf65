pub mod confirmation;
pub mod processing;
pub mod reward;
pub mod store;
