//! Hashlife simulation engine.
//!
//! Boards are represented as canonicalized quadtrees: structurally equal
//! sub-patterns share one in-memory node, which makes node identity a valid
//! equality and cache key. The advance algorithm memoizes "this node, N
//! generations later" per canonical node, letting repeated sub-patterns skip
//! large spans of simulation. Small, sparse or otherwise pathological inputs
//! are routed to a direct neighbor-counting fallback which is also the
//! recovery path for any internal engine fault.

pub mod constants;
pub mod engine;
pub mod errors;
pub mod model;
pub mod processes;
