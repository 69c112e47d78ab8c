use crate::errors::{EngineError, EngineResult};
use std::{fmt::Display, sync::Arc};

/// Stable handle of a canonical node, assigned monotonically by the store on
/// registration. Identity equality implies structural equality for as long as
/// the canonical entry lives; after an eviction, an equal structure rebuilt
/// later may receive a fresh id. That relaxation bounds memory and is
/// deliberate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four same-level children of an inner node. Children are canonical and
/// shared by every parent composing them.
#[derive(Clone, Debug)]
pub struct Quadrants {
    pub nw: Arc<QuadNode>,
    pub ne: Arc<QuadNode>,
    pub sw: Arc<QuadNode>,
    pub se: Arc<QuadNode>,
}

#[derive(Clone, Debug)]
enum NodeKind {
    Leaf { alive: bool },
    Inner(Quadrants),
}

/// A node of the shared quadtree. Level 0 is a single cell; a level-`k` node
/// covers a `2^k` by `2^k` region. Nodes are immutable once created and only
/// the store constructs them.
#[derive(Clone, Debug)]
pub struct QuadNode {
    node_id: NodeId,
    level: u8,
    population: u64,
    kind: NodeKind,
}

impl QuadNode {
    pub(crate) fn new_leaf(node_id: NodeId, alive: bool) -> Self {
        Self { node_id, level: 0, population: alive as u64, kind: NodeKind::Leaf { alive } }
    }

    pub(crate) fn new_inner(node_id: NodeId, level: u8, quadrants: Quadrants) -> Self {
        let population = quadrants.nw.population + quadrants.ne.population + quadrants.sw.population + quadrants.se.population;
        Self { node_id, level, population, kind: NodeKind::Inner(quadrants) }
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Number of live cells in the region this node covers.
    pub fn population(&self) -> u64 {
        self.population
    }

    pub fn is_empty(&self) -> bool {
        self.population == 0
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    pub fn alive(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { alive: true })
    }

    /// Children of an inner node, or `None` for a leaf.
    pub fn parts(&self) -> Option<&Quadrants> {
        match &self.kind {
            NodeKind::Leaf { .. } => None,
            NodeKind::Inner(quadrants) => Some(quadrants),
        }
    }

    /// Children of an inner node, as an error for leaves.
    pub fn inner(&self) -> EngineResult<&Quadrants> {
        self.parts().ok_or(EngineError::UnexpectedLeaf(self.node_id))
    }

    /// Side length `2^level` of the region this node covers.
    pub fn size(&self) -> u64 {
        1u64 << self.level
    }

    /// Maximum generations this node can be advanced without its center being
    /// affected by content outside the node. Zero below level 2.
    pub fn safe_horizon(&self) -> u64 {
        if self.level >= 2 { 1u64 << (self.level - 2) } else { 0 }
    }

    pub(crate) fn structural_key(&self) -> NodeKey {
        match &self.kind {
            NodeKind::Leaf { alive } => NodeKey::Leaf(*alive),
            NodeKind::Inner(q) => NodeKey::Inner {
                level: self.level,
                nw: q.nw.node_id,
                ne: q.ne.node_id,
                sw: q.sw.node_id,
                se: q.se.node_id,
            },
        }
    }
}

/// Structural lookup key of a node. For inner nodes children are compared by
/// identity, which is valid only because children are themselves already
/// canonical; this keeps equality and hashing O(1) instead of recursive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Leaf(bool),
    Inner { level: u8, nw: NodeId, ne: NodeId, sw: NodeId, se: NodeId },
}
