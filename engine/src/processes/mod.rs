pub mod advance;
pub mod direct;
pub mod universe;
