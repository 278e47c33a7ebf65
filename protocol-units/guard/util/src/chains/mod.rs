pub mod adapter;
pub mod registry;
