use crate::model::node::NodeId;
use thiserror::Error;

/// Internal computation faults. These never surface to callers: the engine
/// catches them at a single decision point and reruns the request through the
/// direct simulator, which has no quadtree structure to fault on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("quadrant levels mismatch: nw={0}, ne={1}, sw={2}, se={3}")]
    QuadrantLevelMismatch(u8, u8, u8, u8),

    #[error("node {0} is a leaf where an inner node was expected")]
    UnexpectedLeaf(NodeId),

    #[error("node {id} at level {level} cannot advance {generations} generations (safe horizon {horizon})")]
    HorizonExceeded { id: NodeId, level: u8, generations: u64, horizon: u64 },

    #[error("level {0} is below the minimum advanceable level")]
    InsufficientLevel(u8),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
