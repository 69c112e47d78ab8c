pub mod api;
pub mod cell;
pub mod errors;
