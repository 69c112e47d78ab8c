pub mod cache;
pub mod node;
pub mod store;
