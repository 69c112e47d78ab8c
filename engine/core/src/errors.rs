use thiserror::Error;

/// Boundary-level rejections. Anything else that goes wrong inside the engine
/// is recovered internally and never surfaces to callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    #[error("generations must be non-negative (got {0})")]
    NegativeGenerations(i64),
}

pub type SimulationResult<T> = std::result::Result<T, SimulationError>;
